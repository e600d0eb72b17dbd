use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::header::{HeaderIndex, ImportField};
use crate::workflows::inspection::domain::{
    InspectionDraft, InspectionRecord, InspectionStatus, ViolationSet,
};
use crate::workflows::inspection::scoring::{Evaluation, ScoringEngine};

/// How to treat a row whose declared score disagrees with its violation lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredScorePolicy {
    /// Keep the row and replace the declared values with the derived ones.
    #[default]
    Recompute,
    /// Reject the row.
    Reject,
}

/// Reason a data row could not be turned into an inspection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowRejection {
    #[error("Missing required fields (roomNumber, inspectorName, inspectionDate, score, status)")]
    MissingRequiredFields,
    #[error("Invalid status \"{raw}\". Must be one of: {}", InspectionStatus::valid_labels())]
    InvalidStatus { raw: String },
    #[error(
        "Declared score {declared_score} ({declared_status}) does not match violations (computed {computed_score}, {computed_status})"
    )]
    ScoreMismatch {
        declared_score: i64,
        declared_status: InspectionStatus,
        computed_score: u32,
        computed_status: InspectionStatus,
    },
}

/// Row whose declared score or status was replaced by the derived evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreAdjustment {
    pub row_number: usize,
    pub declared_score: i64,
    pub declared_status: InspectionStatus,
    pub computed: Evaluation,
}

#[derive(Debug)]
pub(crate) struct MappedRow {
    pub(crate) record: InspectionRecord,
    pub(crate) adjustment: Option<ScoreAdjustment>,
}

pub(crate) fn map_row(
    row: &[String],
    header: &HeaderIndex,
    row_number: usize,
    engine: &ScoringEngine,
    policy: DeclaredScorePolicy,
    imported_at: DateTime<Utc>,
) -> Result<MappedRow, RowRejection> {
    let room_number = header.value(row, ImportField::RoomNumber);
    let inspector_name = header.value(row, ImportField::InspectorName);
    let inspection_date = header.value(row, ImportField::InspectionDate);
    let score = header.value(row, ImportField::Score);
    let status = header.value(row, ImportField::Status);

    if [room_number, inspector_name, inspection_date, score, status]
        .iter()
        .any(|value| value.is_empty())
    {
        return Err(RowRejection::MissingRequiredFields);
    }

    let declared_status: InspectionStatus = status
        .parse()
        .map_err(|_| RowRejection::InvalidStatus {
            raw: status.to_string(),
        })?;
    let declared_score = parse_declared_score(score);

    let notes = header.value(row, ImportField::Notes);
    let draft = InspectionDraft {
        room_number: room_number.to_string(),
        inspector_name: inspector_name.to_string(),
        inspection_date: inspection_date.to_string(),
        regular_violations: parse_violation_list(header.value(row, ImportField::Demerits)),
        auto_failure_violations: parse_violation_list(
            header.value(row, ImportField::AutoFailureDemerits),
        ),
        notes: (!notes.is_empty()).then(|| notes.to_string()),
    };

    let record = InspectionRecord::from_draft(draft, engine, imported_at);
    let computed = record.evaluation();
    let matches_declaration =
        declared_score == i64::from(computed.score) && declared_status == computed.status;

    if matches_declaration {
        return Ok(MappedRow {
            record,
            adjustment: None,
        });
    }

    match policy {
        DeclaredScorePolicy::Reject => Err(RowRejection::ScoreMismatch {
            declared_score,
            declared_status,
            computed_score: computed.score,
            computed_status: computed.status,
        }),
        DeclaredScorePolicy::Recompute => Ok(MappedRow {
            record,
            adjustment: Some(ScoreAdjustment {
                row_number,
                declared_score,
                declared_status,
                computed,
            }),
        }),
    }
}

/// Reads the leading integer of a declared score; anything unparseable counts as zero.
pub(crate) fn parse_declared_score(raw: &str) -> i64 {
    let trimmed = raw.trim();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits_end = trimmed[sign_len..]
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(idx, _)| sign_len + idx)
        .unwrap_or(trimmed.len());
    trimmed[..digits_end].parse().unwrap_or(0)
}

/// Decodes a JSON array of labels, falling back to comma-separated text.
pub(crate) fn parse_violation_list(raw: &str) -> ViolationSet {
    if raw.is_empty() {
        return ViolationSet::default();
    }

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(labels) => ViolationSet::from_labels(labels),
        Err(_) => ViolationSet::from_labels(raw.split(',')),
    }
}
