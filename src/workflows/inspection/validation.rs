use super::catalog::RoomRanges;
use super::domain::InspectionRecord;

/// A general record-validity failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Room number is required")]
    RoomNumberRequired,
    #[error("Invalid room number")]
    InvalidRoomNumber(String),
    #[error("Inspector name is required")]
    InspectorNameRequired,
    #[error("Inspection date is required")]
    InspectionDateRequired,
}

/// Checks the fields every stored inspection must carry.
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    rooms: RoomRanges,
}

impl RecordValidator {
    pub fn new(rooms: RoomRanges) -> Self {
        Self { rooms }
    }

    pub fn rooms(&self) -> &RoomRanges {
        &self.rooms
    }

    pub fn validate(&self, record: &InspectionRecord) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let room = record.room_number.trim();
        if room.is_empty() {
            errors.push(ValidationError::RoomNumberRequired);
        } else if !self.rooms.contains(room) {
            errors.push(ValidationError::InvalidRoomNumber(room.to_string()));
        }

        if record.inspector_name.trim().is_empty() {
            errors.push(ValidationError::InspectorNameRequired);
        }

        if record.inspection_date.trim().is_empty() {
            errors.push(ValidationError::InspectionDateRequired);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
