//! # Range tables
//!
//! Static per-vital numeric bands (optimal / normal / attention / high) with
//! condition-specific and age-specific overrides. Pure lookups, no state.
//!
//! - Blood pressure bands apply to the systolic value.
//! - Temperature bands are in °C.
//! - Condition overrides: first matching active condition wins (caller order).
//! - Patients aged 65+ get +10 on the upper bound of "normal" blood pressure.

use serde::Serialize;

use crate::model::{ConditionCategory, VitalType};

/// Age from which the elderly blood-pressure allowance applies.
pub const ELDERLY_AGE: u32 = 65;
/// Allowance added to `normal.max` of blood pressure for elderly patients.
pub const ELDERLY_BP_ALLOWANCE: f64 = 10.0;

/// Closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeTable {
    pub optimal: Band,
    pub normal: Band,
    pub attention: Band,
    pub high: Band,
}

impl RangeTable {
    const fn new(optimal: Band, normal: Band, attention: Band, high: Band) -> Self {
        Self {
            optimal,
            normal,
            attention,
            high,
        }
    }
}

/// Fixed absolute thresholds for the low band: below `critical` is critical,
/// below `severe` is severe, below `moderate` is moderate, anything else mild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowThresholds {
    pub critical: f64,
    pub severe: f64,
    pub moderate: f64,
}

const BLOOD_PRESSURE: RangeTable = RangeTable::new(
    Band::new(90.0, 120.0),
    Band::new(90.0, 130.0),
    Band::new(130.0, 140.0),
    Band::new(140.0, 180.0),
);

const BLOOD_SUGAR: RangeTable = RangeTable::new(
    Band::new(80.0, 100.0),
    Band::new(70.0, 140.0),
    Band::new(140.0, 180.0),
    Band::new(180.0, 250.0),
);

const PULSE: RangeTable = RangeTable::new(
    Band::new(60.0, 80.0),
    Band::new(60.0, 100.0),
    Band::new(100.0, 110.0),
    Band::new(110.0, 130.0),
);

const WEIGHT: RangeTable = RangeTable::new(
    Band::new(50.0, 90.0),
    Band::new(40.0, 120.0),
    Band::new(120.0, 150.0),
    Band::new(150.0, 200.0),
);

const TEMPERATURE_C: RangeTable = RangeTable::new(
    Band::new(36.1, 37.2),
    Band::new(36.0, 37.5),
    Band::new(37.5, 38.0),
    Band::new(38.0, 40.0),
);

/// Lookup fallback for unknown vital types. `classify` reports them as
/// band `normal` without consulting a table.
const PERMISSIVE: RangeTable = RangeTable::new(
    Band::new(0.0, 1000.0),
    Band::new(0.0, 1000.0),
    Band::new(1000.0, 2000.0),
    Band::new(2000.0, 3000.0),
);

// --- condition overrides ---

const HYPERTENSION_BP: RangeTable = RangeTable::new(
    Band::new(90.0, 120.0),
    Band::new(90.0, 125.0),
    Band::new(125.0, 135.0),
    Band::new(135.0, 160.0),
);

const DIABETES_SUGAR: RangeTable = RangeTable::new(
    Band::new(80.0, 100.0),
    Band::new(70.0, 130.0),
    Band::new(130.0, 160.0),
    Band::new(160.0, 220.0),
);

const HEART_FAILURE_PULSE: RangeTable = RangeTable::new(
    Band::new(60.0, 80.0),
    Band::new(60.0, 90.0),
    Band::new(90.0, 100.0),
    Band::new(100.0, 120.0),
);

/// Base table for a vital type, without overrides.
pub fn base_table(vital_type: VitalType) -> RangeTable {
    match vital_type {
        VitalType::BloodPressure => BLOOD_PRESSURE,
        VitalType::BloodSugar => BLOOD_SUGAR,
        VitalType::Pulse => PULSE,
        VitalType::Weight => WEIGHT,
        VitalType::Temperature => TEMPERATURE_C,
        VitalType::Unrecognized => PERMISSIVE,
    }
}

/// Documented override for a condition/vital pair, if any.
pub fn condition_override(
    condition: ConditionCategory,
    vital_type: VitalType,
) -> Option<RangeTable> {
    match (condition, vital_type) {
        (ConditionCategory::Hypertension, VitalType::BloodPressure) => Some(HYPERTENSION_BP),
        (ConditionCategory::Diabetes, VitalType::BloodSugar) => Some(DIABETES_SUGAR),
        (ConditionCategory::HeartFailure, VitalType::Pulse) => Some(HEART_FAILURE_PULSE),
        _ => None,
    }
}

/// Resolve the effective table: first matching condition override, then the
/// elderly blood-pressure allowance.
pub fn resolve_table(
    vital_type: VitalType,
    conditions: &[ConditionCategory],
    age: Option<u32>,
) -> RangeTable {
    let mut table = conditions
        .iter()
        .find_map(|c| condition_override(*c, vital_type))
        .unwrap_or_else(|| base_table(vital_type));

    if vital_type == VitalType::BloodPressure && age.is_some_and(|a| a >= ELDERLY_AGE) {
        table.normal.max += ELDERLY_BP_ALLOWANCE;
    }
    table
}

/// Absolute low-band thresholds; `None` means low readings are always mild.
pub fn low_thresholds(vital_type: VitalType) -> Option<LowThresholds> {
    let t = match vital_type {
        VitalType::BloodPressure => LowThresholds {
            critical: 70.0,
            severe: 80.0,
            moderate: 85.0,
        },
        VitalType::BloodSugar => LowThresholds {
            critical: 50.0,
            severe: 55.0,
            moderate: 60.0,
        },
        VitalType::Pulse => LowThresholds {
            critical: 40.0,
            severe: 45.0,
            moderate: 50.0,
        },
        VitalType::Temperature => LowThresholds {
            critical: 35.0,
            severe: 35.5,
            moderate: 35.8,
        },
        VitalType::Weight | VitalType::Unrecognized => return None,
    };
    Some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_condition_wins() {
        let t = resolve_table(
            VitalType::BloodPressure,
            &[
                ConditionCategory::Diabetes,
                ConditionCategory::Hypertension,
            ],
            None,
        );
        assert_eq!(t, HYPERTENSION_BP);

        // diabetes has no BP override, so it does not shadow hypertension
        let s = resolve_table(
            VitalType::BloodSugar,
            &[
                ConditionCategory::Hypertension,
                ConditionCategory::Diabetes,
            ],
            None,
        );
        assert_eq!(s, DIABETES_SUGAR);
    }

    #[test]
    fn unrecognized_condition_has_no_override() {
        let t = resolve_table(VitalType::Pulse, &[ConditionCategory::Other], None);
        assert_eq!(t, PULSE);
    }

    #[test]
    fn elderly_allowance_only_for_blood_pressure() {
        let bp = resolve_table(VitalType::BloodPressure, &[], Some(70));
        assert_eq!(bp.normal.max, 140.0);
        let bp_young = resolve_table(VitalType::BloodPressure, &[], Some(64));
        assert_eq!(bp_young.normal.max, 130.0);
        let pulse = resolve_table(VitalType::Pulse, &[], Some(80));
        assert_eq!(pulse.normal.max, 100.0);
    }
}
