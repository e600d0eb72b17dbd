use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use axum::Router;
use serde_json::Value;

use crate::workflows::inspection::domain::{InspectionDraft, InspectionId, InspectionRecord, ViolationSet};
use crate::workflows::inspection::repository::{InspectionRepository, MemoryInspectionRepository, RepositoryError};
use crate::workflows::inspection::router::inspection_router;
use crate::workflows::inspection::service::{InspectionService, InspectionSettings};

pub(super) const CSV_HEADER: &str =
    "roomNumber,inspectorName,inspectionDate,score,status,demerits,autoFailureDemerits,notes";

pub(super) fn draft(room: &str, date: &str) -> InspectionDraft {
    InspectionDraft {
        room_number: room.to_string(),
        inspector_name: "Hoskins".to_string(),
        inspection_date: date.to_string(),
        regular_violations: ViolationSet::from_labels(["Mirror", "Trash"]),
        auto_failure_violations: ViolationSet::default(),
        notes: None,
    }
}

pub(super) fn build_service() -> (
    InspectionService<MemoryInspectionRepository>,
    Arc<MemoryInspectionRepository>,
) {
    let repository = Arc::new(MemoryInspectionRepository::new());
    let service = InspectionService::new(repository.clone(), InspectionSettings::default());
    (service, repository)
}

pub(super) fn router_with_service(service: InspectionService<MemoryInspectionRepository>) -> Router {
    inspection_router(Arc::new(service))
}

/// Accepts reads but refuses every write with a conflict.
pub(super) struct ConflictRepository;

impl InspectionRepository for ConflictRepository {
    fn insert(&self, _record: InspectionRecord) -> Result<InspectionRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: InspectionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &InspectionId) -> Result<Option<InspectionRecord>, RepositoryError> {
        Ok(None)
    }

    fn list(&self) -> Result<Vec<InspectionRecord>, RepositoryError> {
        Ok(Vec::new())
    }

    fn delete(&self, _id: &InspectionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::NotFound)
    }
}

/// Memory store that refuses the configured insert attempt (1-based).
pub(super) struct FlakyRepository {
    inner: MemoryInspectionRepository,
    attempts: AtomicUsize,
    fail_on: usize,
}

impl FlakyRepository {
    pub(super) fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: MemoryInspectionRepository::new(),
            attempts: AtomicUsize::new(0),
            fail_on,
        }
    }
}

impl InspectionRepository for FlakyRepository {
    fn insert(&self, record: InspectionRecord) -> Result<InspectionRecord, RepositoryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on {
            return Err(RepositoryError::Unavailable("write timed out".to_string()));
        }
        self.inner.insert(record)
    }

    fn update(&self, record: InspectionRecord) -> Result<(), RepositoryError> {
        self.inner.update(record)
    }

    fn fetch(&self, id: &InspectionId) -> Result<Option<InspectionRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(&self) -> Result<Vec<InspectionRecord>, RepositoryError> {
        self.inner.list()
    }

    fn delete(&self, id: &InspectionId) -> Result<(), RepositoryError> {
        self.inner.delete(id)
    }
}

pub(super) struct UnavailableRepository;

impl InspectionRepository for UnavailableRepository {
    fn insert(&self, _record: InspectionRecord) -> Result<InspectionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: InspectionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &InspectionId) -> Result<Option<InspectionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<InspectionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &InspectionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
