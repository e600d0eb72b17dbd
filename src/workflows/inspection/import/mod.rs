//! CSV import of inspection records.
//!
//! A payload is tokenized line by line, each data row is mapped into a scored
//! [`InspectionRecord`], and batch policy (duplicate suppression, strict validation) is
//! applied to the surviving candidates. Malformed rows never abort the batch; only a
//! payload without any data rows is a hard failure.

pub(crate) mod csv_line;
pub(crate) mod header;
pub(crate) mod mapper;

pub use mapper::{DeclaredScorePolicy, RowRejection, ScoreAdjustment};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use super::domain::{DuplicateKey, InspectionRecord};
use super::scoring::ScoringEngine;
use super::validation::RecordValidator;
use header::HeaderIndex;

#[derive(Debug, thiserror::Error)]
pub enum InspectionImportError {
    #[error("CSV file is empty or has no data rows")]
    NoDataRows,
    #[error("failed to read inspection export: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-run batch policy chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub skip_duplicates: bool,
    pub strict_validation: bool,
    pub declared_score: DeclaredScorePolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
            strict_validation: true,
            declared_score: DeclaredScorePolicy::Recompute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub row_number: usize,
    pub reason: String,
}

impl fmt::Display for RejectedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row_number, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub row_number: usize,
    pub key: DuplicateKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub row_number: usize,
    pub errors: Vec<String>,
}

/// Outcome of one import run. Never persisted as a whole.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportBatch {
    /// Accepted records in payload order.
    pub accepted: Vec<InspectionRecord>,
    /// Rows that could not be parsed into a record.
    pub rejected: Vec<RejectedRow>,
    pub skipped_duplicates: Vec<SkippedRow>,
    pub failed_validation: Vec<ValidationFailure>,
    /// Recomputed scores of accepted rows only.
    pub score_adjustments: Vec<ScoreAdjustment>,
}

impl ImportBatch {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            accepted: self.accepted.len(),
            skipped_duplicates: self.skipped_duplicates.len(),
            failed_validation: self.failed_validation.len(),
            parse_rejected: self.rejected.len(),
            score_adjustments: self.score_adjustments.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub accepted: usize,
    pub skipped_duplicates: usize,
    pub failed_validation: usize,
    pub parse_rejected: usize,
    pub score_adjustments: usize,
}

/// Drives tokenizing, mapping, and batch policy over a CSV payload.
#[derive(Debug, Clone, Default)]
pub struct InspectionImporter {
    engine: ScoringEngine,
    validator: RecordValidator,
}

impl InspectionImporter {
    pub fn new(engine: ScoringEngine, validator: RecordValidator) -> Self {
        Self { engine, validator }
    }

    pub fn import_path<P: AsRef<Path>>(
        &self,
        path: P,
        existing: &HashSet<DuplicateKey>,
        options: ImportOptions,
    ) -> Result<ImportBatch, InspectionImportError> {
        let file = std::fs::File::open(path)?;
        self.import_reader(file, existing, options)
    }

    pub fn import_reader<R: Read>(
        &self,
        mut reader: R,
        existing: &HashSet<DuplicateKey>,
        options: ImportOptions,
    ) -> Result<ImportBatch, InspectionImportError> {
        let mut payload = String::new();
        reader.read_to_string(&mut payload)?;
        self.import(&payload, existing, options)
    }

    pub fn import(
        &self,
        payload: &str,
        existing: &HashSet<DuplicateKey>,
        options: ImportOptions,
    ) -> Result<ImportBatch, InspectionImportError> {
        self.import_at(payload, existing, options, Utc::now())
    }

    /// Imports with an explicit timestamp stamped on every accepted record.
    pub fn import_at(
        &self,
        payload: &str,
        existing: &HashSet<DuplicateKey>,
        options: ImportOptions,
        imported_at: DateTime<Utc>,
    ) -> Result<ImportBatch, InspectionImportError> {
        let lines: Vec<&str> = payload.trim().lines().collect();
        let non_empty = lines.iter().filter(|line| !line.trim().is_empty()).count();
        if non_empty < 2 {
            return Err(InspectionImportError::NoDataRows);
        }

        let header = HeaderIndex::from_fields(&csv_line::split_line(lines[0]));
        let mut batch = ImportBatch::default();
        let mut candidates = Vec::new();

        for (idx, line) in lines.iter().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let row_number = idx + 1;
            let fields = csv_line::split_line(line);
            match mapper::map_row(
                &fields,
                &header,
                row_number,
                &self.engine,
                options.declared_score,
                imported_at,
            ) {
                Ok(mapped) => candidates.push((row_number, mapped)),
                Err(rejection) => {
                    debug!(row = row_number, %rejection, "rejected inspection row");
                    batch.rejected.push(RejectedRow {
                        row_number,
                        reason: rejection.to_string(),
                    });
                }
            }
        }

        let mut accepted_keys: HashSet<DuplicateKey> = HashSet::new();
        for (row_number, mapped) in candidates {
            let record = mapped.record;
            let key = record.duplicate_key();
            if options.skip_duplicates && (existing.contains(&key) || accepted_keys.contains(&key)) {
                batch.skipped_duplicates.push(SkippedRow { row_number, key });
                continue;
            }

            if options.strict_validation {
                if let Err(errors) = self.validator.validate(&record) {
                    debug!(row = row_number, ?errors, "inspection failed strict validation");
                    batch.failed_validation.push(ValidationFailure {
                        row_number,
                        errors: errors.iter().map(ToString::to_string).collect(),
                    });
                    continue;
                }
            }

            if let Some(adjustment) = mapped.adjustment {
                warn!(
                    row = row_number,
                    declared_score = adjustment.declared_score,
                    declared_status = %adjustment.declared_status,
                    computed_score = adjustment.computed.score,
                    computed_status = %adjustment.computed.status,
                    "declared score does not match violations; using derived score"
                );
                batch.score_adjustments.push(adjustment);
            }
            accepted_keys.insert(key);
            batch.accepted.push(record);
        }

        let summary = batch.summary();
        info!(
            accepted = summary.accepted,
            skipped_duplicates = summary.skipped_duplicates,
            failed_validation = summary.failed_validation,
            parse_rejected = summary.parse_rejected,
            "inspection import finished"
        );

        Ok(batch)
    }
}
