//! Positive-pattern heuristic: notices when things are going well.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Symptom, VitalReading};
use crate::wellness::within;

const WINDOW_DAYS: i64 = 3;
const MIN_STABLE_READINGS: usize = 3;
const IMPROVEMENT_RATIO: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositivePattern {
    pub improvements: Vec<String>,
    pub recent_symptom_count: usize,
    pub prior_symptom_count: usize,
}

/// Compares the last three days against the three before them.
///
/// Fires when symptom logs dropped below 70% of the prior window (which must be
/// non-empty), or when at least three recent vitals are all in range.
pub fn detect(vitals: &[VitalReading], symptoms: &[Symptom], now: DateTime<Utc>) -> Option<PositivePattern> {
    let recent_since = now - Duration::days(WINDOW_DAYS);
    let prior_since = recent_since - Duration::days(WINDOW_DAYS);

    let recent = symptoms
        .iter()
        .filter(|s| within(s.logged_at, recent_since, now))
        .count();
    let prior = symptoms
        .iter()
        .filter(|s| within(s.logged_at, prior_since, recent_since))
        .count();

    let recent_vitals: Vec<&VitalReading> = vitals
        .iter()
        .filter(|v| within(v.measured_at, recent_since, now))
        .collect();

    let mut improvements = Vec::new();
    if prior > 0 && (recent as f64) < (prior as f64) * IMPROVEMENT_RATIO {
        improvements.push(format!(
            "Fewer symptoms logged: {recent} in the last 3 days, down from {prior}."
        ));
    }
    if recent_vitals.len() >= MIN_STABLE_READINGS && recent_vitals.iter().all(|v| !v.out_of_range) {
        improvements.push(format!(
            "All {} vital readings from the last 3 days were within range.",
            recent_vitals.len()
        ));
    }

    if improvements.is_empty() {
        return None;
    }
    Some(PositivePattern {
        improvements,
        recent_symptom_count: recent,
        prior_symptom_count: prior,
    })
}
