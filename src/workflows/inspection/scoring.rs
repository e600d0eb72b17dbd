use serde::{Deserialize, Serialize};

use super::domain::{InspectionStatus, ViolationSet};

/// Point values and status thresholds applied to a room's violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub regular_point_value: u32,
    pub auto_failure_point_value: u32,
    /// Highest score still rated outstanding.
    pub outstanding_max: u32,
    /// Highest score still rated as a pass.
    pub passed_max: u32,
}

impl ScoringConfig {
    pub const REGULAR_POINT_VALUE: u32 = 1;
    pub const AUTO_FAILURE_POINT_VALUE: u32 = 4;
    pub const OUTSTANDING_MAX: u32 = 0;
    pub const PASSED_MAX: u32 = 3;
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            regular_point_value: Self::REGULAR_POINT_VALUE,
            auto_failure_point_value: Self::AUTO_FAILURE_POINT_VALUE,
            outstanding_max: Self::OUTSTANDING_MAX,
            passed_max: Self::PASSED_MAX,
        }
    }
}

/// Derived outcome of an inspection; only produced by [`ScoringEngine::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u32,
    pub status: InspectionStatus,
}

impl Evaluation {
    pub fn is_passing(&self) -> bool {
        self.status != InspectionStatus::Failed
    }
}

/// Stateless scorer that applies the configured weights to violation sets.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Saturates at `u32::MAX` so oversized weights still rate as a failure.
    pub fn score(&self, regular: &ViolationSet, auto_failure: &ViolationSet) -> u32 {
        let regular_points = points(regular.len(), self.config.regular_point_value);
        let auto_failure_points = points(auto_failure.len(), self.config.auto_failure_point_value);
        regular_points.saturating_add(auto_failure_points)
    }

    pub fn status(&self, score: u32) -> InspectionStatus {
        if score <= self.config.outstanding_max {
            InspectionStatus::Outstanding
        } else if score <= self.config.passed_max {
            InspectionStatus::Passed
        } else {
            InspectionStatus::Failed
        }
    }

    pub fn evaluate(&self, regular: &ViolationSet, auto_failure: &ViolationSet) -> Evaluation {
        let score = self.score(regular, auto_failure);
        Evaluation {
            score,
            status: self.status(score),
        }
    }
}

fn points(count: usize, value: u32) -> u32 {
    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(value)
}
