//! Audit reports over a set of deliberation records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use ethiq_council::{Decision, DeliberationRecord};

/// Time window covered by a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    /// Every record.
    #[default]
    All,
    /// Records created on the current UTC day.
    Today,
    /// Records created in the last seven days.
    LastWeek,
}

impl ReportPeriod {
    /// Returns true if a record created at `at` falls inside the period
    /// ending at `now`.
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            ReportPeriod::All => true,
            ReportPeriod::Today => at.date_naive() == now.date_naive(),
            ReportPeriod::LastWeek => at > now - Duration::days(7),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReportPeriod::All => "all",
            ReportPeriod::Today => "today",
            ReportPeriod::LastWeek => "last_week",
        };
        f.write_str(label)
    }
}

/// How one analyzer behaved across the reported deliberations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerPerformance {
    /// Deliberations the analyzer took part in.
    pub total_decisions: usize,
    /// Mean confidence of its verdicts, fallbacks included.
    pub average_confidence: f64,
    /// How often it reached each decision.
    pub decision_distribution: BTreeMap<Decision, usize>,
    /// How often it failed and was replaced by a fallback.
    pub failures: usize,
}

/// Aggregate quality of the reported deliberations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliberationQuality {
    /// Mean number of analyzers consulted.
    pub average_analyzers_per_deliberation: f64,
    /// Fraction of deliberations with unanimous analyzers.
    pub consensus_rate: f64,
    /// Fraction of deliberations with conflicting analyzers.
    pub conflict_rate: f64,
    /// Fraction of deliberations downgraded or flagged for review.
    pub review_rate: f64,
}

/// Summary of deliberations over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// Covered period.
    pub period: ReportPeriod,
    /// Number of deliberations covered.
    pub total_deliberations: usize,
    /// Final decisions by kind.
    pub decision_summary: BTreeMap<Decision, usize>,
    /// Per-analyzer statistics.
    pub analyzer_performance: BTreeMap<String, AnalyzerPerformance>,
    /// Agreement statistics.
    pub deliberation_quality: DeliberationQuality,
    /// Mean final confidence; 0 when empty.
    pub average_confidence: f64,
}

impl AuditReport {
    /// Builds a report over the records in `period` as of `now`.
    pub fn build<'a, I>(period: ReportPeriod, now: DateTime<Utc>, records: I) -> Self
    where
        I: IntoIterator<Item = &'a DeliberationRecord>,
    {
        let mut decision_summary: BTreeMap<Decision, usize> =
            Decision::ALL.iter().map(|d| (*d, 0)).collect();
        let mut performance: BTreeMap<String, AnalyzerPerformance> = BTreeMap::new();
        let mut confidence_sums: BTreeMap<String, f64> = BTreeMap::new();

        let mut total = 0usize;
        let mut analyzer_total = 0usize;
        let mut unanimous = 0usize;
        let mut conflicted = 0usize;
        let mut reviewed = 0usize;
        let mut confidence_total = 0.0;

        for record in records
            .into_iter()
            .filter(|r| period.contains(r.created_at, now))
        {
            total += 1;
            analyzer_total += record.analyzer_count();
            if record.examination.is_unanimous() {
                unanimous += 1;
            }
            if record.examination.has_conflict() {
                conflicted += 1;
            }

            let decision = record.final_verdict.decision();
            *decision_summary.entry(decision).or_default() += 1;
            if decision == Decision::FlagForReview {
                reviewed += 1;
            }
            confidence_total += record.final_verdict.confidence().value();

            for (name, verdict) in &record.verdicts {
                let stats = performance.entry(name.clone()).or_default();
                stats.total_decisions += 1;
                *stats
                    .decision_distribution
                    .entry(verdict.decision())
                    .or_default() += 1;
                if record.is_failed(name) {
                    stats.failures += 1;
                }
                *confidence_sums.entry(name.clone()).or_default() +=
                    verdict.confidence().value();
            }
        }

        for (name, stats) in performance.iter_mut() {
            if stats.total_decisions > 0 {
                let sum = confidence_sums.get(name).copied().unwrap_or(0.0);
                stats.average_confidence = sum / stats.total_decisions as f64;
            }
        }

        let rate = |count: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            }
        };

        Self {
            generated_at: now,
            period,
            total_deliberations: total,
            decision_summary,
            analyzer_performance: performance,
            deliberation_quality: DeliberationQuality {
                average_analyzers_per_deliberation: rate(analyzer_total),
                consensus_rate: rate(unanimous),
                conflict_rate: rate(conflicted),
                review_rate: rate(reviewed),
            },
            average_confidence: if total == 0 {
                0.0
            } else {
                confidence_total / total as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_contains() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let earlier_today = Utc.with_ymd_and_hms(2024, 6, 10, 1, 0, 0).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2024, 6, 9, 23, 0, 0).unwrap();
        let last_month = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        assert!(ReportPeriod::Today.contains(earlier_today, now));
        assert!(!ReportPeriod::Today.contains(yesterday, now));
        assert!(ReportPeriod::LastWeek.contains(yesterday, now));
        assert!(!ReportPeriod::LastWeek.contains(last_month, now));
        assert!(ReportPeriod::All.contains(last_month, now));
    }

    #[test]
    fn test_empty_report() {
        let report = AuditReport::build(ReportPeriod::All, Utc::now(), std::iter::empty());
        assert_eq!(report.total_deliberations, 0);
        assert_eq!(report.average_confidence, 0.0);
        assert_eq!(report.decision_summary[&Decision::Allow], 0);
        assert!(report.analyzer_performance.is_empty());
    }

    #[test]
    fn test_period_serializes_snake_case() {
        let json = serde_json::to_string(&ReportPeriod::LastWeek).unwrap();
        assert_eq!(json, "\"last_week\"");
    }
}
