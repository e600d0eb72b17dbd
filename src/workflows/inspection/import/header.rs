use std::collections::HashMap;

/// Logical columns understood by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImportField {
    RoomNumber,
    InspectorName,
    InspectionDate,
    Score,
    Status,
    Demerits,
    AutoFailureDemerits,
    Notes,
}

impl ImportField {
    /// Accepted header names, most specific first.
    pub(crate) const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::RoomNumber => &["roomnumber", "room"],
            Self::InspectorName => &["inspectorname", "inspector"],
            Self::InspectionDate => &["inspectiondate", "date"],
            Self::Score => &["score"],
            Self::Status => &["status"],
            Self::Demerits => &["demerits"],
            Self::AutoFailureDemerits => &["autofailuredemerits", "autofailure"],
            Self::Notes => &["notes"],
        }
    }
}

pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.trim().to_lowercase()
}

/// Case-insensitive mapping from header name to column position.
#[derive(Debug, Clone, Default)]
pub(crate) struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub(crate) fn from_fields(fields: &[String]) -> Self {
        let mut columns = HashMap::new();
        for (idx, name) in fields.iter().enumerate() {
            // A repeated header name points at its last occurrence.
            columns.insert(normalize_header(name), idx);
        }
        Self { columns }
    }

    pub(crate) fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(&normalize_header(name)).copied()
    }

    /// Trimmed value of the first alias with a non-empty cell, or `""`.
    pub(crate) fn value<'a>(&self, row: &'a [String], field: ImportField) -> &'a str {
        field
            .aliases()
            .iter()
            .filter_map(|alias| self.column(alias))
            .filter_map(|idx| row.get(idx))
            .map(|cell| cell.trim())
            .find(|cell| !cell.is_empty())
            .unwrap_or("")
    }
}
