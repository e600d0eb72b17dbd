//! Dormitory room inspections: scoring, CSV import, reporting, and storage seams.

pub mod catalog;
pub mod domain;
pub mod export;
pub mod import;
pub mod report;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use catalog::{RoomRange, RoomRanges, ViolationCatalog};
pub use domain::{
    collect_keys, DuplicateKey, InspectionDraft, InspectionEdit, InspectionId, InspectionRecord,
    InspectionStatus, ViolationSet,
};
pub use import::{
    DeclaredScorePolicy, ImportBatch, ImportOptions, ImportSummary, InspectionImportError,
    InspectionImporter, RejectedRow, RowRejection,
};
pub use report::views::InspectionReportSummary;
pub use report::{DateRange, InspectionReport};
pub use repository::{InspectionRepository, MemoryInspectionRepository, RepositoryError};
pub use router::inspection_router;
pub use scoring::{Evaluation, ScoringConfig, ScoringEngine};
pub use service::{FailedInsert, ImportOutcome, InspectionService, InspectionServiceError, InspectionSettings};
pub use validation::{RecordValidator, ValidationError};
