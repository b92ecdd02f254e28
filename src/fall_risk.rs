//! # Fall Risk Calculator
//! Pure, testable scoring of fall risk from blood-pressure volatility, symptom
//! load and recent medication changes. No I/O.
//!
//! Factors and caps:
//!   - blood pressure (30): last 5 readings, hypotension/crisis/flagged, plus rapid swing
//!   - neurological (35): 7-day high-risk symptoms, severity × 5
//!   - medication changes (uncapped): count × 15
//!   - mobility (20): 7-day gait symptoms, severity × 7
//!   - cognitive (15): 7-day cognition symptoms, severity × 6
//!
//! Total is capped at 100; levels are critical ≥70, high ≥50, moderate ≥25.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Symptom, SymptomKind, VitalReading};
use crate::wellness::within;

const BP_CAP: u32 = 30;
const NEURO_CAP: u32 = 35;
const MOBILITY_CAP: u32 = 20;
const COGNITIVE_CAP: u32 = 15;
const BP_WINDOW_READINGS: usize = 5;

pub const HIGH_RISK_SYMPTOMS: &[SymptomKind] = &[
    SymptomKind::Dizziness,
    SymptomKind::Balance,
    SymptomKind::Coordination,
    SymptomKind::Weakness,
    SymptomKind::Confusion,
    SymptomKind::Disorientation,
    SymptomKind::WalkingDifficulty,
    SymptomKind::Tremor,
    SymptomKind::Stiffness,
    SymptomKind::Fatigue,
];

pub const MOBILITY_SYMPTOMS: &[SymptomKind] = &[
    SymptomKind::WalkingDifficulty,
    SymptomKind::Weakness,
    SymptomKind::Stiffness,
    SymptomKind::Tremor,
];

pub const COGNITIVE_SYMPTOMS: &[SymptomKind] = &[
    SymptomKind::Confusion,
    SymptomKind::Disorientation,
    SymptomKind::MemoryIssues,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallRiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl FallRiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            70.. => FallRiskLevel::Critical,
            50.. => FallRiskLevel::High,
            25.. => FallRiskLevel::Moderate,
            _ => FallRiskLevel::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FallRiskLevel::Low => "low",
            FallRiskLevel::Moderate => "moderate",
            FallRiskLevel::High => "high",
            FallRiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FallRiskFactors {
    pub blood_pressure: u32,
    pub neurological: u32,
    pub medication_changes: u32,
    pub mobility: u32,
    pub cognitive: u32,
}

impl FallRiskFactors {
    pub fn total(&self) -> u32 {
        self.blood_pressure
            .saturating_add(self.neurological)
            .saturating_add(self.medication_changes)
            .saturating_add(self.mobility)
            .saturating_add(self.cognitive)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallRiskAssessment {
    pub score: u32,
    pub level: FallRiskLevel,
    pub factors: FallRiskFactors,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_message: Option<String>,
}

pub fn assess(
    vitals: &[VitalReading],
    symptoms: &[Symptom],
    recent_medication_change_count: u32,
    now: DateTime<Utc>,
) -> FallRiskAssessment {
    let since = now - Duration::days(7);
    let recent: Vec<&Symptom> = symptoms
        .iter()
        .filter(|s| within(s.logged_at, since, now))
        .collect();

    let factors = FallRiskFactors {
        blood_pressure: blood_pressure_factor(vitals, now),
        neurological: severity_factor(&recent, HIGH_RISK_SYMPTOMS, 5.0, NEURO_CAP),
        medication_changes: recent_medication_change_count.saturating_mul(15),
        mobility: severity_factor(&recent, MOBILITY_SYMPTOMS, 7.0, MOBILITY_CAP),
        cognitive: severity_factor(&recent, COGNITIVE_SYMPTOMS, 6.0, COGNITIVE_CAP),
    };

    let score = factors.total().min(100);
    let level = FallRiskLevel::from_score(score);
    let recommendations = recommendations(&factors, level);
    let alert_message = alert_message(&factors, level);

    tracing::debug!(
        score,
        level = level.as_str(),
        bp = factors.blood_pressure,
        neuro = factors.neurological,
        med_changes = factors.medication_changes,
        mobility = factors.mobility,
        cognitive = factors.cognitive,
        "fall risk assessed"
    );
    crate::metrics::record_assessment("fall_risk", level.as_str());

    FallRiskAssessment {
        score,
        level,
        factors,
        recommendations,
        alert_message,
    }
}

/// Looks at the five most recent blood-pressure readings taken up to `now`.
fn blood_pressure_factor(vitals: &[VitalReading], now: DateTime<Utc>) -> u32 {
    let mut readings: Vec<(DateTime<Utc>, bool, f64, f64)> = vitals
        .iter()
        .filter(|v| v.measured_at <= now)
        .filter_map(|v| {
            v.blood_pressure_values()
                .map(|bp| (v.measured_at, v.out_of_range, bp.systolic, bp.diastolic))
        })
        .collect();
    if readings.len() < 2 {
        return 0;
    }
    readings.sort_by(|a, b| b.0.cmp(&a.0));
    readings.truncate(BP_WINDOW_READINGS);

    let mut points = 0u32;
    for &(_, flagged, sys, dia) in &readings {
        if sys < 90.0 || dia < 60.0 {
            points += 20;
        }
        if sys > 180.0 || dia > 110.0 {
            points += 15;
        }
        if flagged {
            points += 10;
        }
    }

    let (_, _, s0, d0) = readings[0];
    let (_, _, s1, d1) = readings[1];
    if (s0 - s1).abs() > 20.0 || (d0 - d1).abs() > 10.0 {
        points += 15;
    }
    points.min(BP_CAP)
}

fn severity_factor(recent: &[&Symptom], kinds: &[SymptomKind], per_point: f64, cap: u32) -> u32 {
    let sum: f64 = recent
        .iter()
        .filter(|s| s.is_any_of(kinds))
        .map(|s| s.severity() * per_point)
        .sum();
    (sum.round() as u32).min(cap)
}

fn recommendations(f: &FallRiskFactors, level: FallRiskLevel) -> Vec<String> {
    let mut out = Vec::new();
    if f.blood_pressure > 15 {
        out.push(
            "Rise slowly from sitting or lying down; blood pressure has been unstable.".to_string(),
        );
        out.push("Keep a log of dizziness episodes alongside blood pressure readings.".to_string());
    }
    if f.neurological > 20 {
        out.push("Use handrails and keep walkways clear and well lit.".to_string());
    }
    if f.medication_changes > 10 {
        out.push(
            "Recent medication changes can affect balance. Review side effects with your pharmacist."
                .to_string(),
        );
    }
    if f.mobility > 10 {
        out.push("Consider a walking aid and supportive, non-slip footwear.".to_string());
    }
    if f.cognitive > 8 {
        out.push(
            "Keep a familiar routine and have someone check in during the day.".to_string(),
        );
    }
    if level >= FallRiskLevel::High {
        out.push("Avoid walking alone until symptoms improve.".to_string());
        out.push("Discuss a fall-prevention plan with your healthcare provider.".to_string());
    }
    out
}

fn alert_message(f: &FallRiskFactors, level: FallRiskLevel) -> Option<String> {
    match level {
        FallRiskLevel::Critical => Some(
            "Very high fall risk detected. Contact your healthcare provider today and avoid moving around unassisted."
                .to_string(),
        ),
        FallRiskLevel::High if f.medication_changes > 15 && f.neurological > 15 => Some(
            "Recent medication changes combined with neurological symptoms are raising your fall risk. Please check in with your doctor."
                .to_string(),
        ),
        FallRiskLevel::High => Some(
            "Elevated fall risk. Take extra care when standing up and moving around.".to_string(),
        ),
        FallRiskLevel::Moderate if f.blood_pressure > 20 => Some(
            "Blood pressure changes may affect your balance. Move carefully, especially when getting up."
                .to_string(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn single_reading_gives_no_bp_points() {
        let v = VitalReading::blood_pressure(80.0, 50.0, now());
        assert_eq!(blood_pressure_factor(&[v], now()), 0);
    }

    #[test]
    fn only_five_latest_readings_count() {
        let mut vitals: Vec<VitalReading> = (0..5)
            .map(|i| VitalReading::blood_pressure(120.0, 80.0, now() - Duration::minutes(i)))
            .collect();
        // older hypotensive reading falls outside the five-reading window
        vitals.push(VitalReading::blood_pressure(80.0, 50.0, now() - Duration::hours(3)));
        assert_eq!(blood_pressure_factor(&vitals, now()), 0);
    }

    #[test]
    fn rapid_swing_counts_once() {
        let vitals = vec![
            VitalReading::blood_pressure(150.0, 90.0, now() - Duration::minutes(10)),
            VitalReading::blood_pressure(125.0, 82.0, now()),
        ];
        assert_eq!(blood_pressure_factor(&vitals, now()), 15);
    }

    #[test]
    fn medication_changes_are_uncapped_by_term() {
        let a = assess(&[], &[], 3, now());
        assert_eq!(a.factors.medication_changes, 45);
        assert_eq!(a.level, FallRiskLevel::Moderate);
        let b = assess(&[], &[], 10, now());
        assert_eq!(b.score, 100);
        assert_eq!(b.level, FallRiskLevel::Critical);
    }

    #[test]
    fn level_boundaries() {
        assert_eq!(FallRiskLevel::from_score(24), FallRiskLevel::Low);
        assert_eq!(FallRiskLevel::from_score(25), FallRiskLevel::Moderate);
        assert_eq!(FallRiskLevel::from_score(50), FallRiskLevel::High);
        assert_eq!(FallRiskLevel::from_score(70), FallRiskLevel::Critical);
    }
}
