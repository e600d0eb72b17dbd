use std::io::Write;

use super::domain::{InspectionRecord, ViolationSet};

pub const EXPORT_HEADER: [&str; 8] = [
    "roomNumber",
    "inspectorName",
    "inspectionDate",
    "score",
    "status",
    "demerits",
    "autoFailureDemerits",
    "notes",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write inspection CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode violation list: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to flush inspection CSV: {0}")]
    Io(#[from] std::io::Error),
    #[error("inspection CSV is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Writes records in the column layout the importer reads back.
pub fn write_csv<'a, W, I>(writer: W, records: I) -> Result<(), ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a InspectionRecord>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_HEADER)?;

    for record in records {
        let score = record.score().to_string();
        let demerits = encode_violations(&record.regular_violations)?;
        let auto_failure = encode_violations(&record.auto_failure_violations)?;
        // The importer reads one record per line.
        let notes = record
            .notes
            .as_deref()
            .unwrap_or_default()
            .replace(['\r', '\n'], " ");

        csv_writer.write_record([
            record.room_number.as_str(),
            record.inspector_name.as_str(),
            record.inspection_date.as_str(),
            score.as_str(),
            record.status().label(),
            demerits.as_str(),
            auto_failure.as_str(),
            notes.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string<'a, I>(records: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a InspectionRecord>,
{
    let mut buffer = Vec::new();
    write_csv(&mut buffer, records)?;
    Ok(String::from_utf8(buffer)?)
}

fn encode_violations(violations: &ViolationSet) -> Result<String, serde_json::Error> {
    if violations.is_empty() {
        return Ok(String::new());
    }
    serde_json::to_string(violations)
}
