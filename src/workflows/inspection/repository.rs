use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::domain::{InspectionId, InspectionRecord};

/// Storage abstraction for finished inspections.
///
/// `insert` owns id assignment; records passed in are expected to have no id yet.
pub trait InspectionRepository: Send + Sync {
    fn insert(&self, record: InspectionRecord) -> Result<InspectionRecord, RepositoryError>;
    fn update(&self, record: InspectionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &InspectionId) -> Result<Option<InspectionRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<InspectionRecord>, RepositoryError>;
    fn delete(&self, id: &InspectionId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store keeping the newest inspection first.
#[derive(Debug, Default)]
pub struct MemoryInspectionRepository {
    records: Mutex<Vec<InspectionRecord>>,
    sequence: AtomicU64,
}

impl MemoryInspectionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> InspectionId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        InspectionId(format!("insp-{id:06}"))
    }

    fn records(&self) -> Result<MutexGuard<'_, Vec<InspectionRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("inspection store lock poisoned".to_string()))
    }
}

impl InspectionRepository for MemoryInspectionRepository {
    fn insert(&self, mut record: InspectionRecord) -> Result<InspectionRecord, RepositoryError> {
        if record.id.is_some() {
            return Err(RepositoryError::Conflict);
        }

        record.id = Some(self.next_id());
        self.records()?.insert(0, record.clone());
        Ok(record)
    }

    fn update(&self, record: InspectionRecord) -> Result<(), RepositoryError> {
        let mut records = self.records()?;
        let slot = records
            .iter_mut()
            .find(|existing| existing.id.is_some() && existing.id == record.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = record;
        Ok(())
    }

    fn fetch(&self, id: &InspectionId) -> Result<Option<InspectionRecord>, RepositoryError> {
        Ok(self
            .records()?
            .iter()
            .find(|record| record.id.as_ref() == Some(id))
            .cloned())
    }

    fn list(&self) -> Result<Vec<InspectionRecord>, RepositoryError> {
        Ok(self.records()?.clone())
    }

    fn delete(&self, id: &InspectionId) -> Result<(), RepositoryError> {
        let mut records = self.records()?;
        let before = records.len();
        records.retain(|record| record.id.as_ref() != Some(id));
        if records.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
