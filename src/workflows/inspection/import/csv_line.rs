const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Splits a single CSV line into raw fields.
///
/// Quoted fields may contain delimiters, and `""` inside quotes yields a literal quote.
/// Malformed quoting never fails: an unterminated quote absorbs the rest of the line
/// into the final field.
pub(crate) fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            QUOTE if in_quotes && chars.peek() == Some(&QUOTE) => {
                current.push(QUOTE);
                chars.next();
            }
            QUOTE => in_quotes = !in_quotes,
            DELIMITER if !in_quotes => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }

    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::split_line;

    #[test]
    fn splits_plain_fields() {
        assert_eq!(split_line("201,Smith,2024-01-15"), vec!["201", "Smith", "2024-01-15"]);
    }

    #[test]
    fn quoted_fields_keep_delimiters() {
        assert_eq!(split_line(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
    }

    #[test]
    fn doubled_quotes_collapse_inside_quoted_fields() {
        assert_eq!(split_line(r#"a,"b""c",d"#), vec!["a", "b\"c", "d"]);
    }

    #[test]
    fn empty_line_yields_single_empty_field() {
        assert_eq!(split_line(""), vec![""]);
    }

    #[test]
    fn trailing_delimiter_yields_trailing_empty_field() {
        assert_eq!(split_line("a,b,"), vec!["a", "b", ""]);
        assert_eq!(split_line(",,"), vec!["", "", ""]);
    }

    #[test]
    fn unterminated_quote_absorbs_remainder() {
        assert_eq!(split_line(r#"a,"b,c,d"#), vec!["a", "b,c,d"]);
        assert_eq!(split_line(r#"a,""#), vec!["a", ""]);
    }

    #[test]
    fn json_arrays_survive_when_quoted() {
        let fields = split_line(r#"201,"[""Mirror"",""Trash""]""#);
        assert_eq!(fields, vec!["201", r#"["Mirror","Trash"]"#]);
    }
}
