//! # Vital Classifier
//! Resolves a reading to a band, an out-of-range flag and a medical-significance
//! tier with its urgency tag. Pure and infallible: malformed readings classify
//! as plain "normal" instead of failing.

use serde::{Deserialize, Serialize};

use crate::model::{ConditionCategory, TemperatureUnit, VitalType, VitalValues};
use crate::ranges::{self, LowThresholds, RangeTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalBand {
    Low,
    Optimal,
    Normal,
    Attention,
    High,
}

/// Ordered from least to most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Normal,
    Mild,
    Moderate,
    Severe,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    None,
    Routine,
    Soon,
    Urgent,
    Emergency,
}

impl Significance {
    pub fn urgency(self) -> Urgency {
        match self {
            Significance::Normal => Urgency::None,
            Significance::Mild => Urgency::Routine,
            Significance::Moderate => Urgency::Soon,
            Significance::Severe => Urgency::Urgent,
            Significance::Critical => Urgency::Emergency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalClassification {
    pub band: VitalBand,
    pub out_of_range: bool,
    pub significance: Significance,
    pub urgency: Urgency,
}

impl VitalClassification {
    fn unremarkable() -> Self {
        Self {
            band: VitalBand::Normal,
            out_of_range: false,
            significance: Significance::Normal,
            urgency: Urgency::None,
        }
    }
}

/// Classify one reading against the condition/age-adjusted table.
///
/// `conditions` order matters: the first condition with an override for
/// `vital_type` supplies the table.
pub fn classify(
    vital_type: VitalType,
    values: &VitalValues,
    conditions: &[ConditionCategory],
    age: Option<u32>,
) -> VitalClassification {
    if vital_type == VitalType::Unrecognized {
        return VitalClassification::unremarkable();
    }
    let Some(value) = classification_value(vital_type, values) else {
        return VitalClassification::unremarkable();
    };

    let table = ranges::resolve_table(vital_type, conditions, age);
    let band = band_for(&table, value);
    let out_of_range = value < table.normal.min || value > table.high.max;

    let significance = match band {
        VitalBand::High => high_significance(value, table.normal.max),
        VitalBand::Low => low_significance(value, ranges::low_thresholds(vital_type)),
        VitalBand::Attention => Significance::Mild,
        VitalBand::Optimal | VitalBand::Normal => Significance::Normal,
    };

    VitalClassification {
        band,
        out_of_range,
        significance,
        urgency: significance.urgency(),
    }
}

/// Number the tables are expressed in: systolic for blood pressure, °C for
/// temperature, the raw value otherwise.
fn classification_value(vital_type: VitalType, values: &VitalValues) -> Option<f64> {
    let v = match (vital_type, values) {
        (VitalType::BloodPressure, VitalValues::BloodPressure(bp)) => bp.systolic,
        (VitalType::BloodPressure, VitalValues::Scalar(_)) => return None,
        (VitalType::Temperature, VitalValues::Scalar(s)) => {
            match TemperatureUnit::resolve(s.unit.as_deref(), s.value) {
                TemperatureUnit::Celsius => s.value,
                TemperatureUnit::Fahrenheit => crate::model::fahrenheit_to_celsius(s.value),
            }
        }
        (_, VitalValues::Scalar(s)) => s.value,
        (_, VitalValues::BloodPressure(_)) => return None,
    };
    v.is_finite().then_some(v)
}

fn band_for(table: &RangeTable, v: f64) -> VitalBand {
    if v < table.normal.min {
        VitalBand::Low
    } else if table.optimal.contains(v) {
        VitalBand::Optimal
    } else if table.normal.contains(v) {
        VitalBand::Normal
    } else if table.attention.contains(v) {
        VitalBand::Attention
    } else {
        VitalBand::High
    }
}

fn high_significance(v: f64, normal_max: f64) -> Significance {
    if normal_max <= 0.0 {
        return Significance::Mild;
    }
    let ratio = v / normal_max;
    if ratio > 2.0 {
        Significance::Critical
    } else if ratio > 1.5 {
        Significance::Severe
    } else if ratio > 1.2 {
        Significance::Moderate
    } else {
        Significance::Mild
    }
}

fn low_significance(v: f64, thresholds: Option<LowThresholds>) -> Significance {
    match thresholds {
        Some(t) if v < t.critical => Significance::Critical,
        Some(t) if v < t.severe => Significance::Severe,
        Some(t) if v < t.moderate => Significance::Moderate,
        _ => Significance::Mild,
    }
}
