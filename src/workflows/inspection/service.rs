use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::catalog::{RoomRanges, ViolationCatalog};
use super::domain::{
    collect_keys, InspectionDraft, InspectionEdit, InspectionId, InspectionRecord, ViolationSet,
};
use super::export::{self, ExportError};
use super::import::{
    ImportOptions, ImportSummary, InspectionImportError, InspectionImporter, RejectedRow,
    ScoreAdjustment, SkippedRow, ValidationFailure,
};
use super::report::views::InspectionReportSummary;
use super::report::{DateRange, InspectionReport};
use super::repository::{InspectionRepository, RepositoryError};
use super::scoring::{Evaluation, ScoringConfig, ScoringEngine};
use super::validation::{describe, RecordValidator, ValidationError};

/// Configuration injected into the inspection workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionSettings {
    pub scoring: ScoringConfig,
    pub rooms: RoomRanges,
    pub catalog: ViolationCatalog,
}

/// Result of a persisted CSV import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub summary: ImportSummary,
    pub inspection_ids: Vec<InspectionId>,
    pub rejected: Vec<RejectedRow>,
    pub skipped_duplicates: Vec<SkippedRow>,
    pub failed_validation: Vec<ValidationFailure>,
    pub score_adjustments: Vec<ScoreAdjustment>,
    /// Accepted rows the repository refused; earlier and later rows stay persisted.
    pub failed_inserts: Vec<FailedInsert>,
}

/// Accepted import row that could not be stored.
#[derive(Debug, Clone, Serialize)]
pub struct FailedInsert {
    pub room_number: String,
    pub inspection_date: String,
    pub reason: String,
}

/// Service composing scoring, validation, import, and the repository.
pub struct InspectionService<R> {
    repository: Arc<R>,
    engine: ScoringEngine,
    catalog: ViolationCatalog,
    validator: RecordValidator,
    importer: InspectionImporter,
}

impl<R> InspectionService<R>
where
    R: InspectionRepository + 'static,
{
    pub fn new(repository: Arc<R>, settings: InspectionSettings) -> Self {
        let engine = ScoringEngine::new(settings.scoring);
        let validator = RecordValidator::new(settings.rooms);
        let importer = InspectionImporter::new(engine.clone(), validator.clone());

        Self {
            repository,
            engine,
            catalog: settings.catalog,
            validator,
            importer,
        }
    }

    pub fn catalog(&self) -> &ViolationCatalog {
        &self.catalog
    }

    pub fn evaluate(&self, regular: &ViolationSet, auto_failure: &ViolationSet) -> Evaluation {
        self.engine.evaluate(regular, auto_failure)
    }

    /// Score a new inspection and persist it.
    pub fn record(&self, draft: InspectionDraft) -> Result<InspectionRecord, InspectionServiceError> {
        self.check_catalog(Some(&draft.regular_violations), Some(&draft.auto_failure_violations))?;

        let record = InspectionRecord::from_draft(draft, &self.engine, Utc::now());
        self.validator
            .validate(&record)
            .map_err(InspectionServiceError::Validation)?;

        let stored = self.repository.insert(record)?;
        info!(
            id = ?stored.id,
            room = %stored.room_number,
            score = stored.score(),
            status = %stored.status(),
            "inspection recorded"
        );
        Ok(stored)
    }

    /// Apply an edit to a stored inspection, re-deriving its score.
    pub fn edit(
        &self,
        id: &InspectionId,
        edit: InspectionEdit,
    ) -> Result<InspectionRecord, InspectionServiceError> {
        self.check_catalog(
            edit.regular_violations.as_ref(),
            edit.auto_failure_violations.as_ref(),
        )?;

        let mut record = self.get(id)?;
        record.apply_edit(edit, &self.engine, Utc::now());
        self.validator
            .validate(&record)
            .map_err(InspectionServiceError::Validation)?;

        self.repository.update(record.clone())?;
        Ok(record)
    }

    pub fn get(&self, id: &InspectionId) -> Result<InspectionRecord, InspectionServiceError> {
        let record = self.repository.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<InspectionRecord>, InspectionServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn delete(&self, id: &InspectionId) -> Result<(), InspectionServiceError> {
        self.repository.delete(id)?;
        Ok(())
    }

    /// Import a CSV payload against the stored inspections and persist accepted rows.
    pub fn import_csv(
        &self,
        payload: &str,
        options: ImportOptions,
    ) -> Result<ImportOutcome, InspectionServiceError> {
        let existing = collect_keys(&self.repository.list()?);
        let batch = self.importer.import(payload, &existing, options)?;
        let summary = batch.summary();

        let mut inspection_ids = Vec::with_capacity(batch.accepted.len());
        let mut failed_inserts = Vec::new();
        for record in batch.accepted {
            let room_number = record.room_number.clone();
            let inspection_date = record.inspection_date.clone();
            match self.repository.insert(record) {
                Ok(stored) => inspection_ids.extend(stored.id),
                Err(error) => {
                    warn!(
                        room = %room_number,
                        date = %inspection_date,
                        %error,
                        "failed to store imported inspection"
                    );
                    failed_inserts.push(FailedInsert {
                        room_number,
                        inspection_date,
                        reason: error.to_string(),
                    });
                }
            }
        }

        Ok(ImportOutcome {
            summary,
            inspection_ids,
            rejected: batch.rejected,
            skipped_duplicates: batch.skipped_duplicates,
            failed_validation: batch.failed_validation,
            score_adjustments: batch.score_adjustments,
            failed_inserts,
        })
    }

    pub fn report(
        &self,
        range: DateRange,
        today: NaiveDate,
    ) -> Result<InspectionReportSummary, InspectionServiceError> {
        let records = self.repository.list()?;
        let in_range = range.filter(&records, today);
        Ok(InspectionReport::build(in_range).summary())
    }

    pub fn export_csv(&self) -> Result<String, InspectionServiceError> {
        let records = self.repository.list()?;
        Ok(export::to_csv_string(&records)?)
    }

    fn check_catalog(
        &self,
        regular: Option<&ViolationSet>,
        auto_failure: Option<&ViolationSet>,
    ) -> Result<(), InspectionServiceError> {
        let mut unknown: Vec<String> = Vec::new();
        if let Some(regular) = regular {
            unknown.extend(self.catalog.unknown_regular(regular).into_iter().map(String::from));
        }
        if let Some(auto_failure) = auto_failure {
            unknown.extend(
                self.catalog
                    .unknown_auto_failure(auto_failure)
                    .into_iter()
                    .map(String::from),
            );
        }

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(InspectionServiceError::UnknownViolations(unknown))
        }
    }
}

/// Error raised by the inspection service.
#[derive(Debug, thiserror::Error)]
pub enum InspectionServiceError {
    #[error("invalid inspection: {}", describe(.0))]
    Validation(Vec<ValidationError>),
    #[error("unknown violation labels: {}", .0.join(", "))]
    UnknownViolations(Vec<String>),
    #[error(transparent)]
    Import(#[from] InspectionImportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
