use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use super::super::domain::{InspectionRecord, InspectionStatus};
use super::views::{
    DailyTrendEntry, InspectionReportSummary, InspectorStatsEntry, StatusCountEntry,
    ViolationFrequencyEntry,
};

const UNKNOWN_INSPECTOR: &str = "Unknown";

#[derive(Debug, Default, Clone)]
pub struct StatusTally {
    pub outstanding: usize,
    pub passed: usize,
    pub failed: usize,
    pub score_total: u64,
}

impl StatusTally {
    fn record(&mut self, record: &InspectionRecord) {
        match record.status() {
            InspectionStatus::Outstanding => self.outstanding += 1,
            InspectionStatus::Passed => self.passed += 1,
            InspectionStatus::Failed => self.failed += 1,
        }
        self.score_total += u64::from(record.score());
    }

    pub fn total(&self) -> usize {
        self.outstanding + self.passed + self.failed
    }

    pub fn count(&self, status: InspectionStatus) -> usize {
        match status {
            InspectionStatus::Outstanding => self.outstanding,
            InspectionStatus::Passed => self.passed,
            InspectionStatus::Failed => self.failed,
        }
    }

    /// Percentage of passing inspections, rounded to one decimal.
    pub fn pass_rate(&self) -> f32 {
        percentage(self.outstanding + self.passed, self.total())
    }

    pub fn average_score(&self) -> f32 {
        match self.total() {
            0 => 0.0,
            total => round_tenth(self.score_total as f32 / total as f32),
        }
    }
}

/// Aggregated statistics over a set of inspections.
#[derive(Debug, Default)]
pub struct InspectionReport {
    pub overall: StatusTally,
    pub by_inspector: HashMap<String, StatusTally>,
    pub violation_counts: HashMap<String, usize>,
    /// Keyed by parsed date; records with unparseable dates are left out.
    pub by_date: BTreeMap<NaiveDate, StatusTally>,
}

impl InspectionReport {
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a InspectionRecord>,
    {
        let mut report = Self::default();

        for record in records {
            report.overall.record(record);

            let inspector = match record.inspector_name.trim() {
                "" => UNKNOWN_INSPECTOR.to_string(),
                name => name.to_string(),
            };
            report.by_inspector.entry(inspector).or_default().record(record);

            for label in record
                .regular_violations
                .iter()
                .chain(record.auto_failure_violations.iter())
            {
                *report.violation_counts.entry(label.to_string()).or_default() += 1;
            }

            if let Some(date) = record.date() {
                report.by_date.entry(date).or_default().record(record);
            }
        }

        report
    }

    pub fn total(&self) -> usize {
        self.overall.total()
    }

    pub fn summary(&self) -> InspectionReportSummary {
        let total = self.total();

        let status_counts = InspectionStatus::ordered()
            .into_iter()
            .map(|status| StatusCountEntry {
                status,
                status_label: status.label(),
                count: self.overall.count(status),
            })
            .collect();

        let mut inspectors: Vec<InspectorStatsEntry> = self
            .by_inspector
            .iter()
            .map(|(name, tally)| InspectorStatsEntry {
                inspector: name.clone(),
                total: tally.total(),
                outstanding: tally.outstanding,
                passed: tally.passed,
                failed: tally.failed,
                pass_rate: tally.pass_rate(),
                average_score: tally.average_score(),
            })
            .collect();
        inspectors.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.inspector.cmp(&b.inspector)));

        let mut violations: Vec<ViolationFrequencyEntry> = self
            .violation_counts
            .iter()
            .map(|(label, count)| ViolationFrequencyEntry {
                label: label.clone(),
                count: *count,
                percentage: percentage(*count, total),
            })
            .collect();
        violations.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        let daily_trend = self
            .by_date
            .iter()
            .map(|(date, tally)| DailyTrendEntry {
                inspection_date: date.format("%Y-%m-%d").to_string(),
                total: tally.total(),
                pass_rate: tally.pass_rate(),
            })
            .collect();

        InspectionReportSummary {
            total,
            status_counts,
            pass_rate: self.overall.pass_rate(),
            inspectors,
            violations,
            daily_trend,
        }
    }
}

impl InspectionReportSummary {
    pub fn top_violations(&self, limit: usize) -> &[ViolationFrequencyEntry] {
        &self.violations[..self.violations.len().min(limit)]
    }
}

fn percentage(part: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    round_tenth(part as f32 / total as f32 * 100.0)
}

fn round_tenth(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
