use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use super::scoring::{Evaluation, ScoringEngine};

/// Categorical result derived from an inspection score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    Outstanding,
    Passed,
    Failed,
}

impl InspectionStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Outstanding, Self::Passed, Self::Failed]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Outstanding => "OUTSTANDING",
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
        }
    }

    /// Valid values in the order used by import error messages.
    pub fn valid_labels() -> String {
        [Self::Passed, Self::Failed, Self::Outstanding]
            .iter()
            .map(|status| status.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown inspection status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for InspectionStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OUTSTANDING" => Ok(Self::Outstanding),
            "PASSED" => Ok(Self::Passed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(UnknownStatus(value.to_string())),
        }
    }
}

/// Duplicate-free collection of violation labels.
///
/// Labels are trimmed on insertion and blank labels are dropped, so selecting the same
/// violation twice never adds points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ViolationSet(BTreeSet<String>);

impl ViolationSet {
    pub fn from_labels<I>(labels: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut set = Self::default();
        for label in labels {
            set.insert(label);
        }
        set
    }

    /// Returns `true` when the label was newly added.
    pub fn insert(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.0.insert(trimmed.to_string())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label.trim())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for ViolationSet {
    fn from(labels: Vec<String>) -> Self {
        Self::from_labels(labels)
    }
}

impl From<ViolationSet> for Vec<String> {
    fn from(set: ViolationSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Identifier assigned by the persistence layer when a record is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InspectionId(pub String);

impl fmt::Display for InspectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selections captured for a room before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionDraft {
    pub room_number: String,
    pub inspector_name: String,
    pub inspection_date: String,
    #[serde(default)]
    pub regular_violations: ViolationSet,
    #[serde(default)]
    pub auto_failure_violations: ViolationSet,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update for an existing inspection; unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionEdit {
    #[serde(default)]
    pub inspector_name: Option<String>,
    #[serde(default)]
    pub inspection_date: Option<String>,
    #[serde(default)]
    pub regular_violations: Option<ViolationSet>,
    #[serde(default)]
    pub auto_failure_violations: Option<ViolationSet>,
    /// An empty string clears the notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// A scored room inspection.
///
/// `score` and `status` are private and only ever set from a [`ScoringEngine`]
/// evaluation of the two violation sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<InspectionId>,
    pub room_number: String,
    pub inspector_name: String,
    pub inspection_date: String,
    pub regular_violations: ViolationSet,
    pub auto_failure_violations: ViolationSet,
    score: u32,
    status: InspectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl InspectionRecord {
    pub fn from_draft(
        draft: InspectionDraft,
        engine: &ScoringEngine,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        let evaluation = engine.evaluate(
            &draft.regular_violations,
            &draft.auto_failure_violations,
        );

        Self {
            id: None,
            room_number: draft.room_number.trim().to_string(),
            inspector_name: draft.inspector_name.trim().to_string(),
            inspection_date: draft.inspection_date.trim().to_string(),
            regular_violations: draft.regular_violations,
            auto_failure_violations: draft.auto_failure_violations,
            score: evaluation.score,
            status: evaluation.status,
            notes: non_empty(draft.notes),
            recorded_at,
            updated_at: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn status(&self) -> InspectionStatus {
        self.status
    }

    pub fn evaluation(&self) -> Evaluation {
        Evaluation {
            score: self.score,
            status: self.status,
        }
    }

    /// Parsed `YYYY-MM-DD` inspection date, if the stored text is well formed.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.inspection_date.trim(), "%Y-%m-%d").ok()
    }

    pub fn duplicate_key(&self) -> DuplicateKey {
        DuplicateKey::of(self)
    }

    pub fn is_consistent(&self, engine: &ScoringEngine) -> bool {
        engine.evaluate(&self.regular_violations, &self.auto_failure_violations)
            == self.evaluation()
    }

    /// Applies an edit and re-derives the score from the resulting violation sets.
    pub fn apply_edit(&mut self, edit: InspectionEdit, engine: &ScoringEngine, now: DateTime<Utc>) {
        if let Some(inspector_name) = edit.inspector_name {
            self.inspector_name = inspector_name.trim().to_string();
        }
        if let Some(inspection_date) = edit.inspection_date {
            self.inspection_date = inspection_date.trim().to_string();
        }
        if let Some(regular) = edit.regular_violations {
            self.regular_violations = regular;
        }
        if let Some(auto_failure) = edit.auto_failure_violations {
            self.auto_failure_violations = auto_failure;
        }
        if let Some(notes) = edit.notes {
            self.notes = non_empty(Some(notes));
        }

        let evaluation = engine.evaluate(&self.regular_violations, &self.auto_failure_violations);
        self.score = evaluation.score;
        self.status = evaluation.status;
        self.updated_at = Some(now);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Room and date pair identifying a re-import of the same inspection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub room_number: String,
    pub inspection_date: String,
}

impl DuplicateKey {
    pub fn new(room_number: impl Into<String>, inspection_date: impl Into<String>) -> Self {
        Self {
            room_number: room_number.into(),
            inspection_date: inspection_date.into(),
        }
    }

    pub fn of(record: &InspectionRecord) -> Self {
        Self::new(record.room_number.clone(), record.inspection_date.clone())
    }
}

pub fn collect_keys<'a, I>(records: I) -> HashSet<DuplicateKey>
where
    I: IntoIterator<Item = &'a InspectionRecord>,
{
    records.into_iter().map(DuplicateKey::of).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    fn draft() -> InspectionDraft {
        InspectionDraft {
            room_number: " 214 ".to_string(),
            inspector_name: "Hoskins".to_string(),
            inspection_date: "2024-01-15".to_string(),
            regular_violations: ViolationSet::from_labels(["Mirror", "Trash"]),
            auto_failure_violations: ViolationSet::default(),
            notes: Some("  ".to_string()),
        }
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "outstanding".parse::<InspectionStatus>(),
            Ok(InspectionStatus::Outstanding)
        );
        assert_eq!(
            " Passed ".parse::<InspectionStatus>(),
            Ok(InspectionStatus::Passed)
        );
        assert_eq!(
            "FAILED".parse::<InspectionStatus>(),
            Ok(InspectionStatus::Failed)
        );
        assert!("maybe".parse::<InspectionStatus>().is_err());
        assert_eq!(InspectionStatus::valid_labels(), "PASSED, FAILED, OUTSTANDING");
    }

    #[test]
    fn violation_set_trims_and_collapses_duplicates() {
        let set = ViolationSet::from_labels(["A", " B", "B ", "", "  "]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("B"));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn violation_set_equality_ignores_order() {
        let left = ViolationSet::from_labels(["Trash", "Mirror"]);
        let right = ViolationSet::from_labels(["Mirror", "Trash"]);
        assert_eq!(left, right);
    }

    #[test]
    fn violation_set_deserializes_through_normalization() {
        let set: ViolationSet = serde_json::from_str(r#"["Mirror", "Mirror ", ""]"#).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["Mirror"]"#);
    }

    #[test]
    fn record_from_draft_derives_score_and_status() {
        let engine = ScoringEngine::default();
        let record = InspectionRecord::from_draft(draft(), &engine, now());

        assert_eq!(record.room_number, "214");
        assert_eq!(record.score(), 2);
        assert_eq!(record.status(), InspectionStatus::Passed);
        assert!(record.notes.is_none());
        assert!(record.id.is_none());
        assert!(record.is_consistent(&engine));
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn edit_rederives_score_from_new_violations() {
        let engine = ScoringEngine::default();
        let mut record = InspectionRecord::from_draft(draft(), &engine, now());

        record.apply_edit(
            InspectionEdit {
                auto_failure_violations: Some(ViolationSet::from_labels(["HAZMAT"])),
                notes: Some("follow up".to_string()),
                ..InspectionEdit::default()
            },
            &engine,
            now(),
        );

        assert_eq!(record.score(), 6);
        assert_eq!(record.status(), InspectionStatus::Failed);
        assert_eq!(record.notes.as_deref(), Some("follow up"));
        assert_eq!(record.updated_at, Some(now()));
        assert!(record.is_consistent(&engine));
    }

    #[test]
    fn deserialized_record_with_tampered_score_is_inconsistent() {
        let engine = ScoringEngine::default();
        let record = InspectionRecord::from_draft(draft(), &engine, now());
        let mut value = serde_json::to_value(&record).unwrap();
        value["score"] = serde_json::json!(0);
        value["status"] = serde_json::json!("OUTSTANDING");

        let tampered: InspectionRecord = serde_json::from_value(value).unwrap();
        assert!(!tampered.is_consistent(&engine));
    }

    #[test]
    fn duplicate_keys_pair_room_and_date() {
        let engine = ScoringEngine::default();
        let first = InspectionRecord::from_draft(draft(), &engine, now());
        let mut second = first.clone();
        second.inspector_name = "Smith".to_string();

        let keys = collect_keys([&first, &second]);
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&DuplicateKey::new("214", "2024-01-15")));
    }
}
