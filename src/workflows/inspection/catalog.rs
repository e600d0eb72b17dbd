use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::domain::ViolationSet;

const STANDARD_REGULAR: &[&str] = &[
    "Bed not made or missing 341",
    "Mirror",
    "Vanity/Sink",
    "Dirty tile or Carpet",
    "Foul odor",
    "High dust or excessive clutter",
    "Trash",
    "Fridge, freezer, or microwave",
    "Shower curtain",
    "Bathtub/shower",
    "Excessive mold build-up",
    "Toilet",
    "Dirty bathroom tile, rugs, or towels",
];

const STANDARD_AUTO_FAILURE: &[&str] = &[
    "HAZMAT",
    "Unsecured wall locker or keys",
    "Unsecured valuables or uniforms",
    "Unsecured prescription medications",
    "Unsecured Tobacco",
    "Unsecured perishable food",
    "Contraband",
    "Safety items/open window",
    "To-go container/pizza box",
];

/// Labels an inspector may select, split by how heavily they count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCatalog {
    pub regular: Vec<String>,
    pub auto_failure: Vec<String>,
}

impl ViolationCatalog {
    pub fn standard() -> Self {
        Self {
            regular: STANDARD_REGULAR.iter().map(|s| s.to_string()).collect(),
            auto_failure: STANDARD_AUTO_FAILURE.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn unknown_regular<'a>(&self, selected: &'a ViolationSet) -> Vec<&'a str> {
        unknown_labels(&self.regular, selected)
    }

    pub fn unknown_auto_failure<'a>(&self, selected: &'a ViolationSet) -> Vec<&'a str> {
        unknown_labels(&self.auto_failure, selected)
    }
}

impl Default for ViolationCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn unknown_labels<'a>(catalog: &[String], selected: &'a ViolationSet) -> Vec<&'a str> {
    selected
        .iter()
        .filter(|label| !catalog.iter().any(|known| known.as_str() == *label))
        .collect()
}

/// Inclusive span of numeric room identifiers, typically one floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRange {
    pub start: u32,
    pub end: u32,
}

impl RoomRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, number: u32) -> bool {
        number >= self.start && number <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRanges(Vec<RoomRange>);

impl RoomRanges {
    pub fn new(ranges: Vec<RoomRange>) -> Self {
        Self(ranges)
    }

    pub fn standard() -> Self {
        Self(vec![RoomRange::new(201, 299), RoomRange::new(301, 399)])
    }

    pub fn ranges(&self) -> &[RoomRange] {
        &self.0
    }

    /// Tests whether the leading number of `room` falls in any configured range.
    ///
    /// Trailing non-digit suffixes are ignored, so `"214B"` is treated as room 214.
    pub fn contains(&self, room: &str) -> bool {
        match leading_number(room) {
            Some(number) => self.0.iter().any(|range| range.contains(number)),
            None => false,
        }
    }
}

impl Default for RoomRanges {
    fn default() -> Self {
        Self::standard()
    }
}

fn leading_number(room: &str) -> Option<u32> {
    let trimmed = room.trim();
    let digits_end = trimmed
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(trimmed.len());
    trimmed[..digits_end].parse().ok()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid room range '{0}': expected START-END pairs separated by commas")]
pub struct RoomRangeParseError(pub String);

impl FromStr for RoomRanges {
    type Err = RoomRangeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut ranges = Vec::new();
        for part in value.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let (start, end) = part
                .split_once('-')
                .ok_or_else(|| RoomRangeParseError(part.to_string()))?;
            let start: u32 = start
                .trim()
                .parse()
                .map_err(|_| RoomRangeParseError(part.to_string()))?;
            let end: u32 = end
                .trim()
                .parse()
                .map_err(|_| RoomRangeParseError(part.to_string()))?;
            if start > end {
                return Err(RoomRangeParseError(part.to_string()));
            }
            ranges.push(RoomRange::new(start, end));
        }

        if ranges.is_empty() {
            return Err(RoomRangeParseError(value.to_string()));
        }

        Ok(Self(ranges))
    }
}

impl fmt::Display for RoomRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|range| format!("{}-{}", range.start, range.end))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
