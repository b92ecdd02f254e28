//! Metric series recorded through the `metrics` facade.
//! The host installs the recorder/exporter; without one these calls are no-ops.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

pub const WELLNESS_SCORE_OVERALL: &str = "wellness_score_overall";
pub const RISK_ASSESSMENTS_TOTAL: &str = "risk_assessments_total";
pub const INSIGHTS_GENERATED_TOTAL: &str = "insights_generated_total";
pub const INSIGHTS_EXPIRED_TOTAL: &str = "insights_expired_total";
pub const INSIGHTS_DISMISSED_TOTAL: &str = "insights_dismissed_total";
pub const INSIGHT_ANALYSIS_FAILURES_TOTAL: &str = "insight_analysis_failures_total";
pub const INSIGHTS_RETAINED: &str = "insights_retained";

/// One-time metrics registration (so series carry help text once exported).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_histogram!(
            WELLNESS_SCORE_OVERALL,
            "Overall wellness score per composition (0-100)."
        );
        describe_counter!(
            RISK_ASSESSMENTS_TOTAL,
            "Risk assessments by calculator and resulting level."
        );
        describe_counter!(
            INSIGHTS_GENERATED_TOTAL,
            "Insights produced by the engine, by type."
        );
        describe_counter!(
            INSIGHTS_EXPIRED_TOTAL,
            "Retained insights dropped because validity ended."
        );
        describe_counter!(INSIGHTS_DISMISSED_TOTAL, "Insights dismissed by the user.");
        describe_counter!(
            INSIGHT_ANALYSIS_FAILURES_TOTAL,
            "Sub-analyses that failed and were skipped."
        );
        describe_gauge!(INSIGHTS_RETAINED, "Insights retained after the last merge.");
    });
}

pub(crate) fn record_wellness_score(overall: u32) {
    histogram!(WELLNESS_SCORE_OVERALL).record(f64::from(overall));
}

pub(crate) fn record_assessment(calculator: &'static str, level: &'static str) {
    counter!(RISK_ASSESSMENTS_TOTAL, "calculator" => calculator, "level" => level).increment(1);
}

pub(crate) fn record_generated(insight_type: &'static str) {
    counter!(INSIGHTS_GENERATED_TOTAL, "type" => insight_type).increment(1);
}

pub(crate) fn record_expired(n: usize) {
    if n > 0 {
        counter!(INSIGHTS_EXPIRED_TOTAL).increment(n as u64);
    }
}

pub(crate) fn record_dismissed() {
    counter!(INSIGHTS_DISMISSED_TOTAL).increment(1);
}

pub(crate) fn record_analysis_failure(analysis: &'static str) {
    counter!(INSIGHT_ANALYSIS_FAILURES_TOTAL, "analysis" => analysis).increment(1);
}

pub(crate) fn record_retained(n: usize) {
    gauge!(INSIGHTS_RETAINED).set(n as f64);
}
