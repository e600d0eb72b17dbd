use serde::Serialize;

use super::super::domain::InspectionStatus;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: InspectionStatus,
    pub status_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectorStatsEntry {
    pub inspector: String,
    pub total: usize,
    pub outstanding: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f32,
    pub average_score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolationFrequencyEntry {
    pub label: String,
    pub count: usize,
    /// Share of inspections citing the label, in percent.
    pub percentage: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyTrendEntry {
    pub inspection_date: String,
    pub total: usize,
    pub pass_rate: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectionReportSummary {
    pub total: usize,
    pub status_counts: Vec<StatusCountEntry>,
    pub pass_rate: f32,
    pub inspectors: Vec<InspectorStatsEntry>,
    pub violations: Vec<ViolationFrequencyEntry>,
    pub daily_trend: Vec<DailyTrendEntry>,
}
