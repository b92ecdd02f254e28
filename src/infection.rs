//! # Infection Early-Warning Calculator
//! Scores early signs of infection from temperature, pulse, co-occurring
//! symptoms and rapid vital changes. Temperatures are evaluated in °F.
//!
//! Factors and caps: temperature (50), pulse (30), symptoms (30), rapid change (20).
//! Total is capped at 100; levels are urgent ≥70, high ≥50, moderate ≥25.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    celsius_to_fahrenheit, fahrenheit_to_celsius, Symptom, SymptomKind, TemperatureUnit,
    VitalReading, VitalType,
};
use crate::wellness::within;

const TEMPERATURE_CAP: u32 = 50;
const PULSE_CAP: u32 = 30;
const SYMPTOM_CAP: u32 = 30;
const RAPID_CHANGE_CAP: u32 = 20;

pub const INFECTION_SYMPTOMS: &[SymptomKind] = &[
    SymptomKind::Fever,
    SymptomKind::Chills,
    SymptomKind::Fatigue,
    SymptomKind::Weakness,
    SymptomKind::Nausea,
    SymptomKind::LossOfAppetite,
    SymptomKind::Confusion,
    SymptomKind::RapidBreathing,
    SymptomKind::ChestPain,
    SymptomKind::Cough,
    SymptomKind::UrinaryIssues,
    SymptomKind::Headache,
];

/// Symptom pairs that point to infection more strongly together than apart.
const COMBINATIONS: &[(SymptomKind, SymptomKind, u32)] = &[
    (SymptomKind::Fever, SymptomKind::Confusion, 15),
    (SymptomKind::Chills, SymptomKind::Weakness, 10),
    (SymptomKind::RapidBreathing, SymptomKind::ChestPain, 12),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfectionRiskLevel {
    Low,
    Moderate,
    High,
    Urgent,
}

impl InfectionRiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            70.. => InfectionRiskLevel::Urgent,
            50.. => InfectionRiskLevel::High,
            25.. => InfectionRiskLevel::Moderate,
            _ => InfectionRiskLevel::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InfectionRiskLevel::Low => "low",
            InfectionRiskLevel::Moderate => "moderate",
            InfectionRiskLevel::High => "high",
            InfectionRiskLevel::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InfectionFactors {
    pub temperature: u32,
    pub pulse: u32,
    pub symptoms: u32,
    pub rapid_change: u32,
}

impl InfectionFactors {
    pub fn total(&self) -> u32 {
        self.temperature + self.pulse + self.symptoms + self.rapid_change
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfectionWarning {
    pub risk_level: InfectionRiskLevel,
    pub score: u32,
    pub factors: InfectionFactors,
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_message: Option<String>,
    pub symptoms_to_monitor: Vec<String>,
}

pub fn assess(vitals: &[VitalReading], symptoms: &[Symptom], now: DateTime<Utc>) -> InfectionWarning {
    let temps = sorted_desc(vitals, VitalType::Temperature, now);
    let pulses = sorted_desc(vitals, VitalType::Pulse, now);
    let latest_temp_f = temps.first().and_then(|v| v.temperature_fahrenheit());

    let since = now - Duration::days(3);
    let present: Vec<SymptomKind> = {
        let mut kinds: Vec<SymptomKind> = symptoms
            .iter()
            .filter(|s| within(s.logged_at, since, now))
            .filter_map(|s| s.kind())
            .filter(|k| INFECTION_SYMPTOMS.contains(k))
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    };

    let factors = InfectionFactors {
        temperature: temperature_factor(&temps),
        pulse: pulse_factor(&pulses, latest_temp_f),
        symptoms: symptom_factor(symptoms, since, now),
        rapid_change: rapid_change_factor(vitals, now),
    };

    let score = factors.total().min(100);
    let risk_level = InfectionRiskLevel::from_score(score);

    tracing::debug!(
        score,
        level = risk_level.as_str(),
        temperature = factors.temperature,
        pulse = factors.pulse,
        symptoms = factors.symptoms,
        rapid_change = factors.rapid_change,
        "infection risk assessed"
    );
    crate::metrics::record_assessment("infection", risk_level.as_str());

    InfectionWarning {
        risk_level,
        score,
        recommendations: recommendations(&factors, risk_level),
        alert_message: alert_message(&factors, risk_level),
        symptoms_to_monitor: symptoms_to_monitor(&factors, risk_level, &present),
        factors,
    }
}

/// Well-formed readings of one type taken up to `now`, newest first.
fn sorted_desc(vitals: &[VitalReading], vital_type: VitalType, now: DateTime<Utc>) -> Vec<&VitalReading> {
    let mut out: Vec<&VitalReading> = vitals
        .iter()
        .filter(|v| v.vital_type == vital_type && v.measured_at <= now)
        .filter(|v| v.primary_value().is_some())
        .collect();
    out.sort_by(|a, b| b.measured_at.cmp(&a.measured_at));
    out
}

fn temperature_factor(temps: &[&VitalReading]) -> u32 {
    let Some((latest_raw, latest_unit)) = temps.first().and_then(|v| v.temperature()) else {
        return 0;
    };
    let latest_f = to_fahrenheit(latest_raw, latest_unit);

    let mut points = if latest_f >= 103.0 {
        40
    } else if latest_f >= 101.0 {
        25
    } else if latest_f >= 99.5 {
        15
    } else if latest_f <= 95.0 {
        30
    } else {
        0
    };

    // Rising trend is judged in the unit the latest reading was recorded in.
    if let Some((prev_raw, prev_unit)) = temps.get(1).and_then(|v| v.temperature()) {
        let prev_same_unit = convert(prev_raw, prev_unit, latest_unit);
        if latest_raw - prev_same_unit > 0.5 && latest_f > 99.0 {
            points += 10;
        }
    }
    points.min(TEMPERATURE_CAP)
}

fn pulse_factor(pulses: &[&VitalReading], latest_temp_f: Option<f64>) -> u32 {
    let Some(bpm) = pulses.first().and_then(|v| v.primary_value()) else {
        return 0;
    };
    let mut points = if bpm > 120.0 {
        20
    } else if bpm > 100.0 {
        10
    } else if bpm < 50.0 {
        15
    } else {
        0
    };
    if bpm > 100.0 && latest_temp_f.is_some_and(|t| t > 99.5) {
        points += 15;
    }
    points.min(PULSE_CAP)
}

fn symptom_factor(symptoms: &[Symptom], since: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let recent: Vec<&Symptom> = symptoms
        .iter()
        .filter(|s| within(s.logged_at, since, now) && s.is_any_of(INFECTION_SYMPTOMS))
        .collect();
    let base: f64 = recent.iter().map(|s| s.severity() * 3.0).sum();

    let has = |k: SymptomKind| recent.iter().any(|s| s.kind() == Some(k));
    let bonus: u32 = COMBINATIONS
        .iter()
        .filter(|(a, b, _)| has(*a) && has(*b))
        .map(|(_, _, p)| *p)
        .sum();

    (base.round() as u32).saturating_add(bonus).min(SYMPTOM_CAP)
}

/// Compares latest vs earliest reading inside the trailing 24 hours.
fn rapid_change_factor(vitals: &[VitalReading], now: DateTime<Utc>) -> u32 {
    let since = now - Duration::hours(24);
    let window: Vec<&VitalReading> = vitals
        .iter()
        .filter(|v| within(v.measured_at, since, now))
        .collect();

    let mut points = 0;

    let temps = series(&window, VitalType::Temperature, |v| v.temperature_fahrenheit());
    if rise(&temps).is_some_and(|d| d > 1.5) {
        points += 10;
    }

    let pulses = series(&window, VitalType::Pulse, |v| v.primary_value());
    if rise(&pulses).is_some_and(|d| d > 20.0) {
        points += 8;
    }

    if window.iter().filter(|v| v.out_of_range).count() >= 3 {
        points += 12;
    }
    points.min(RAPID_CHANGE_CAP)
}

fn series(
    window: &[&VitalReading],
    vital_type: VitalType,
    value: impl Fn(&VitalReading) -> Option<f64>,
) -> Vec<(DateTime<Utc>, f64)> {
    let mut out: Vec<(DateTime<Utc>, f64)> = window
        .iter()
        .filter(|v| v.vital_type == vital_type)
        .filter_map(|v| value(v).map(|x| (v.measured_at, x)))
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

/// Latest minus earliest; `None` with fewer than two points.
fn rise(series: &[(DateTime<Utc>, f64)]) -> Option<f64> {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) if series.len() >= 2 => Some(last.1 - first.1),
        _ => None,
    }
}

fn to_fahrenheit(v: f64, unit: TemperatureUnit) -> f64 {
    convert(v, unit, TemperatureUnit::Fahrenheit)
}

fn convert(v: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    match (from, to) {
        (TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit) => celsius_to_fahrenheit(v),
        (TemperatureUnit::Fahrenheit, TemperatureUnit::Celsius) => fahrenheit_to_celsius(v),
        _ => v,
    }
}

fn recommendations(f: &InfectionFactors, level: InfectionRiskLevel) -> Vec<String> {
    let mut out = Vec::new();
    if f.temperature > 20 {
        out.push("Check your temperature every 4 hours and stay well hydrated.".to_string());
    }
    if f.pulse > 15 {
        out.push("Rest and recheck your pulse in an hour.".to_string());
    }
    if f.symptoms > 15 {
        out.push("Write down when each symptom started to share with your care team.".to_string());
    }
    if f.rapid_change > 10 {
        out.push(
            "Your vitals changed quickly over the last day. Keep monitoring closely.".to_string(),
        );
    }
    match level {
        InfectionRiskLevel::Urgent => {
            out.push("Seek medical attention today.".to_string());
            out.push("Do not wait for symptoms to pass on their own.".to_string());
        }
        InfectionRiskLevel::High => {
            out.push("Contact your healthcare provider within 24 hours.".to_string());
        }
        InfectionRiskLevel::Moderate | InfectionRiskLevel::Low => {}
    }
    out
}

fn alert_message(f: &InfectionFactors, level: InfectionRiskLevel) -> Option<String> {
    match level {
        InfectionRiskLevel::Urgent => Some(
            "Possible serious infection. Contact your healthcare provider or seek urgent care now."
                .to_string(),
        ),
        InfectionRiskLevel::High => Some(
            "Several early signs of infection detected. Please contact your healthcare provider."
                .to_string(),
        ),
        InfectionRiskLevel::Moderate if f.temperature >= 25 => Some(
            "You have a fever. Monitor it closely and call your provider if it keeps rising."
                .to_string(),
        ),
        _ => None,
    }
}

fn symptoms_to_monitor(
    f: &InfectionFactors,
    level: InfectionRiskLevel,
    present: &[SymptomKind],
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if f.temperature > 0 {
        out.push("temperature changes".to_string());
    }
    if f.pulse > 0 {
        out.push("heart rate".to_string());
    }
    for k in present {
        out.push(k.as_str().replace('_', " "));
    }
    if level >= InfectionRiskLevel::Moderate {
        for extra in ["confusion or drowsiness", "difficulty breathing"] {
            if !out.iter().any(|s| s == extra) {
                out.push(extra.to_string());
            }
        }
    }
    out
}
