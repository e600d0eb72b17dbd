use super::common::*;
use chrono::NaiveDate;

use crate::workflows::inspection::domain::{InspectionEdit, InspectionId, InspectionStatus, ViolationSet};
use crate::workflows::inspection::import::ImportOptions;
use crate::workflows::inspection::report::DateRange;
use crate::workflows::inspection::repository::{InspectionRepository, RepositoryError};
use crate::workflows::inspection::service::InspectionServiceError;
use crate::workflows::inspection::validation::ValidationError;

#[test]
fn record_scores_and_persists_the_draft() {
    let (service, repository) = build_service();

    let stored = service
        .record(draft("214", "2024-01-15"))
        .expect("record succeeds");

    assert_eq!(stored.id, Some(InspectionId("insp-000001".to_string())));
    assert_eq!(stored.score(), 2);
    assert_eq!(stored.status(), InspectionStatus::Passed);
    assert_eq!(repository.list().expect("list").len(), 1);
}

#[test]
fn record_rejects_invalid_rooms_without_persisting() {
    let (service, repository) = build_service();

    let error = service
        .record(draft("120", "2024-01-15"))
        .expect_err("room out of range");

    match error {
        InspectionServiceError::Validation(errors) => {
            assert_eq!(errors, vec![ValidationError::InvalidRoomNumber("120".to_string())]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(repository.list().expect("list").is_empty());
}

#[test]
fn record_rejects_labels_outside_the_catalog() {
    let (service, _) = build_service();
    let mut draft = draft("214", "2024-01-15");
    draft.auto_failure_violations = ViolationSet::from_labels(["Mirror"]);

    let error = service.record(draft).expect_err("wrong catalog");
    match error {
        InspectionServiceError::UnknownViolations(labels) => assert_eq!(labels, vec!["Mirror"]),
        other => panic!("expected unknown violations, got {other:?}"),
    }
}

#[test]
fn edit_rederives_score_and_persists() {
    let (service, repository) = build_service();
    let stored = service.record(draft("214", "2024-01-15")).expect("record");
    let id = stored.id.clone().expect("id");

    let edited = service
        .edit(
            &id,
            InspectionEdit {
                regular_violations: Some(ViolationSet::default()),
                ..InspectionEdit::default()
            },
        )
        .expect("edit succeeds");

    assert_eq!(edited.score(), 0);
    assert_eq!(edited.status(), InspectionStatus::Outstanding);
    let fetched = repository.fetch(&id).expect("fetch").expect("present");
    assert_eq!(fetched.status(), InspectionStatus::Outstanding);
    assert!(fetched.updated_at.is_some());
}

#[test]
fn edit_of_missing_inspection_is_not_found() {
    let (service, _) = build_service();
    let error = service
        .edit(&InspectionId("insp-404".to_string()), InspectionEdit::default())
        .expect_err("missing record");
    assert!(matches!(
        error,
        InspectionServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn import_skips_rows_matching_stored_inspections() {
    let (service, repository) = build_service();
    service.record(draft("214", "2024-01-15")).expect("record");

    let payload = format!(
        "{CSV_HEADER}\n214,Smith,2024-01-15,0,OUTSTANDING,,,\n215,Smith,2024-01-15,1,PASSED,Mirror,,\n216,Smith,2024-01-15,0,unknown,,,\n"
    );
    let outcome = service
        .import_csv(&payload, ImportOptions::default())
        .expect("import succeeds");

    assert_eq!(outcome.summary.accepted, 1);
    assert_eq!(outcome.summary.skipped_duplicates, 1);
    assert_eq!(outcome.summary.parse_rejected, 1);
    assert_eq!(outcome.inspection_ids.len(), 1);
    assert_eq!(repository.list().expect("list").len(), 2);
}

#[test]
fn import_without_data_rows_fails() {
    let (service, _) = build_service();
    let error = service
        .import_csv(CSV_HEADER, ImportOptions::default())
        .expect_err("no data rows");
    assert_eq!(error.to_string(), "CSV file is empty or has no data rows");
}

#[test]
fn report_and_export_cover_stored_inspections() {
    let (service, _) = build_service();
    service.record(draft("214", "2024-01-15")).expect("record");
    service.record(draft("215", "2023-06-01")).expect("record");

    let today = NaiveDate::from_ymd_opt(2024, 1, 20).expect("valid date");
    let week = service.report(DateRange::Week, today).expect("report");
    assert_eq!(week.total, 1);
    let all = service.report(DateRange::All, today).expect("report");
    assert_eq!(all.total, 2);
    assert_eq!(all.pass_rate, 100.0);

    let csv = service.export_csv().expect("export");
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn repository_failures_surface_from_the_service() {
    let service = crate::workflows::inspection::service::InspectionService::new(
        std::sync::Arc::new(UnavailableRepository),
        Default::default(),
    );
    let error = service
        .import_csv(
            &format!("{CSV_HEADER}\n214,Smith,2024-01-15,0,OUTSTANDING,,,\n"),
            ImportOptions::default(),
        )
        .expect_err("repository offline");
    assert!(matches!(
        error,
        InspectionServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}

#[test]
fn import_keeps_going_when_one_insert_fails() {
    let repository = std::sync::Arc::new(FlakyRepository::failing_on(2));
    let service = crate::workflows::inspection::service::InspectionService::new(
        repository.clone(),
        Default::default(),
    );
    let payload = format!(
        "{CSV_HEADER}\n214,Smith,2024-01-15,0,OUTSTANDING,,,\n215,Smith,2024-01-15,0,OUTSTANDING,,,\n216,Smith,2024-01-15,0,OUTSTANDING,,,\n"
    );

    let outcome = service
        .import_csv(&payload, ImportOptions::default())
        .expect("import reports partial failures");

    assert_eq!(outcome.summary.accepted, 3);
    assert_eq!(outcome.inspection_ids.len(), 2);
    assert_eq!(outcome.failed_inserts.len(), 1);
    assert_eq!(outcome.failed_inserts[0].room_number, "215");
    assert!(outcome.failed_inserts[0].reason.contains("write timed out"));
    assert_eq!(repository.list().expect("list").len(), 2);
}
