mod summary;
pub mod views;

pub use summary::{InspectionReport, StatusTally};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::domain::InspectionRecord;

/// Reporting window relative to an evaluation date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Week,
    Month,
    #[default]
    All,
}

impl DateRange {
    /// Inclusive `(start, end)` bounds ending on `today`.
    pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            DateRange::Week => today - Duration::days(7),
            DateRange::Month => today - Duration::days(30),
            DateRange::All => NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN),
        };
        (start, today)
    }

    /// Keeps records whose inspection date parses and lies within the bounds.
    pub fn filter<'a, I>(self, records: I, today: NaiveDate) -> Vec<&'a InspectionRecord>
    where
        I: IntoIterator<Item = &'a InspectionRecord>,
    {
        let (start, end) = self.bounds(today);
        records
            .into_iter()
            .filter(|record| {
                record
                    .date()
                    .map(|date| date >= start && date <= end)
                    .unwrap_or(false)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown date range '{0}': expected week, month, or all")]
pub struct UnknownDateRange(pub String);

impl FromStr for DateRange {
    type Err = UnknownDateRange;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            _ => Err(UnknownDateRange(value.to_string())),
        }
    }
}
