//! # Input model
//! Plain value types supplied by the host data layer: vital readings, symptoms,
//! medications, medication logs and comorbidities.
//!
//! Nothing in here is mutated by the calculators; they only read these values
//! and return fresh result objects. Free-form strings coming from the UI
//! (`symptom_type`, `condition_name`) are resolved into closed vocabularies
//! (`SymptomKind`, `ConditionCategory`) so heuristics never depend on spelling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classifier::{self, VitalClassification};

/* ----------------------------
Vitals
---------------------------- */

/// Kind of vital sign. Unknown strings deserialize to `Unrecognized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalType {
    BloodPressure,
    BloodSugar,
    Pulse,
    Weight,
    Temperature,
    #[serde(other)]
    Unrecognized,
}

impl VitalType {
    pub fn as_str(self) -> &'static str {
        match self {
            VitalType::BloodPressure => "blood_pressure",
            VitalType::BloodSugar => "blood_sugar",
            VitalType::Pulse => "pulse",
            VitalType::Weight => "weight",
            VitalType::Temperature => "temperature",
            VitalType::Unrecognized => "unrecognized",
        }
    }
}

/// Blood pressure pair in mmHg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureValues {
    pub systolic: f64,
    pub diastolic: f64,
}

/// Single numeric measurement with an optional unit label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarValues {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Shape of a reading. Blood pressure carries a pair, every other type a scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VitalValues {
    BloodPressure(BloodPressureValues),
    Scalar(ScalarValues),
}

/// Temperature unit, normalized from the free-form `unit` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Resolve a unit label; without one, anything above 50 is taken as Fahrenheit.
    pub fn resolve(unit: Option<&str>, value: f64) -> Self {
        let label = unit
            .map(|u| u.trim().trim_start_matches('°').to_ascii_lowercase())
            .unwrap_or_default();
        match label.as_str() {
            "f" | "fahrenheit" | "degf" => TemperatureUnit::Fahrenheit,
            "c" | "celsius" | "degc" => TemperatureUnit::Celsius,
            _ if value > 50.0 => TemperatureUnit::Fahrenheit,
            _ => TemperatureUnit::Celsius,
        }
    }
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// A single vital-sign observation.
///
/// `out_of_range` is set once at ingestion by the classifier
/// (see [`VitalReading::classified`]) and is authoritative downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    pub vital_type: VitalType,
    pub values: VitalValues,
    pub measured_at: DateTime<Utc>,
    #[serde(default)]
    pub out_of_range: bool,
}

impl VitalReading {
    pub fn blood_pressure(systolic: f64, diastolic: f64, measured_at: DateTime<Utc>) -> Self {
        Self {
            vital_type: VitalType::BloodPressure,
            values: VitalValues::BloodPressure(BloodPressureValues {
                systolic,
                diastolic,
            }),
            measured_at,
            out_of_range: false,
        }
    }

    /// Scalar reading. Passing `VitalType::BloodPressure` here yields a reading whose
    /// shape does not match its type; such readings have no primary value.
    pub fn scalar(
        vital_type: VitalType,
        value: f64,
        unit: Option<&str>,
        measured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            vital_type,
            values: VitalValues::Scalar(ScalarValues {
                value,
                unit: unit.map(str::to_string),
            }),
            measured_at,
            out_of_range: false,
        }
    }

    /// Builder-style override of the ingestion flag.
    pub fn flagged(mut self, out_of_range: bool) -> Self {
        self.out_of_range = out_of_range;
        self
    }

    /// Blood pressure pair, if this is a well-formed blood pressure reading.
    pub fn blood_pressure_values(&self) -> Option<BloodPressureValues> {
        match (&self.vital_type, &self.values) {
            (VitalType::BloodPressure, VitalValues::BloodPressure(bp))
                if bp.systolic.is_finite() && bp.diastolic.is_finite() =>
            {
                Some(*bp)
            }
            _ => None,
        }
    }

    /// Primary numeric value: systolic for blood pressure, `value` otherwise.
    /// `None` when shape and type disagree or the number is not finite.
    pub fn primary_value(&self) -> Option<f64> {
        let v = match (&self.vital_type, &self.values) {
            (VitalType::BloodPressure, VitalValues::BloodPressure(bp)) => bp.systolic,
            (VitalType::BloodPressure, VitalValues::Scalar(_)) => return None,
            (_, VitalValues::Scalar(s)) => s.value,
            (_, VitalValues::BloodPressure(_)) => return None,
        };
        v.is_finite().then_some(v)
    }

    pub fn unit(&self) -> Option<&str> {
        match &self.values {
            VitalValues::Scalar(s) => s.unit.as_deref(),
            VitalValues::BloodPressure(_) => None,
        }
    }

    /// Temperature in the unit it was recorded in, plus that unit.
    pub fn temperature(&self) -> Option<(f64, TemperatureUnit)> {
        if self.vital_type != VitalType::Temperature {
            return None;
        }
        let v = self.primary_value()?;
        Some((v, TemperatureUnit::resolve(self.unit(), v)))
    }

    pub fn temperature_celsius(&self) -> Option<f64> {
        self.temperature().map(|(v, unit)| match unit {
            TemperatureUnit::Celsius => v,
            TemperatureUnit::Fahrenheit => fahrenheit_to_celsius(v),
        })
    }

    pub fn temperature_fahrenheit(&self) -> Option<f64> {
        self.temperature().map(|(v, unit)| match unit {
            TemperatureUnit::Celsius => celsius_to_fahrenheit(v),
            TemperatureUnit::Fahrenheit => v,
        })
    }

    /// Run the classifier and return a copy with `out_of_range` set from the result.
    pub fn classified(&self, conditions: &[ConditionCategory], age: Option<u32>) -> Self {
        let c = self.classification(conditions, age);
        Self {
            out_of_range: c.out_of_range,
            ..self.clone()
        }
    }

    pub fn classification(
        &self,
        conditions: &[ConditionCategory],
        age: Option<u32>,
    ) -> VitalClassification {
        classifier::classify(self.vital_type, &self.values, conditions, age)
    }
}

/* ----------------------------
Symptoms
---------------------------- */

/// Recognized symptom vocabulary. Free-form `symptom_type` strings map onto this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomKind {
    Tremor,
    Stiffness,
    Balance,
    Coordination,
    Speech,
    Cognitive,
    Dizziness,
    Weakness,
    Confusion,
    Disorientation,
    WalkingDifficulty,
    Fatigue,
    MemoryIssues,
    Pain,
    Fever,
    Chills,
    Nausea,
    LossOfAppetite,
    RapidBreathing,
    ChestPain,
    Cough,
    UrinaryIssues,
    Headache,
}

impl SymptomKind {
    /// Parse a free-form symptom label. Unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        let key = normalize_label(label);
        let kind = match key.as_str() {
            "tremor" | "tremors" => SymptomKind::Tremor,
            "stiffness" | "rigidity" => SymptomKind::Stiffness,
            "balance" | "balance_issues" | "balance_problems" => SymptomKind::Balance,
            "coordination" | "coordination_problems" | "coordination_issues" => {
                SymptomKind::Coordination
            }
            "speech" | "speech_issues" | "speech_difficulty" => SymptomKind::Speech,
            "cognitive" | "cognitive_issues" => SymptomKind::Cognitive,
            "dizziness" | "dizzy" => SymptomKind::Dizziness,
            "weakness" => SymptomKind::Weakness,
            "confusion" => SymptomKind::Confusion,
            "disorientation" => SymptomKind::Disorientation,
            "walking_difficulty" | "difficulty_walking" => SymptomKind::WalkingDifficulty,
            "fatigue" | "tiredness" => SymptomKind::Fatigue,
            "memory" | "memory_issues" | "memory_loss" => SymptomKind::MemoryIssues,
            "pain" => SymptomKind::Pain,
            "fever" => SymptomKind::Fever,
            "chills" => SymptomKind::Chills,
            "nausea" => SymptomKind::Nausea,
            "loss_of_appetite" | "appetite_loss" => SymptomKind::LossOfAppetite,
            "rapid_breathing" | "shortness_of_breath" => SymptomKind::RapidBreathing,
            "chest_pain" => SymptomKind::ChestPain,
            "cough" => SymptomKind::Cough,
            "urinary_issues" | "urinary" => SymptomKind::UrinaryIssues,
            "headache" => SymptomKind::Headache,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SymptomKind::Tremor => "tremor",
            SymptomKind::Stiffness => "stiffness",
            SymptomKind::Balance => "balance",
            SymptomKind::Coordination => "coordination",
            SymptomKind::Speech => "speech",
            SymptomKind::Cognitive => "cognitive",
            SymptomKind::Dizziness => "dizziness",
            SymptomKind::Weakness => "weakness",
            SymptomKind::Confusion => "confusion",
            SymptomKind::Disorientation => "disorientation",
            SymptomKind::WalkingDifficulty => "walking_difficulty",
            SymptomKind::Fatigue => "fatigue",
            SymptomKind::MemoryIssues => "memory_issues",
            SymptomKind::Pain => "pain",
            SymptomKind::Fever => "fever",
            SymptomKind::Chills => "chills",
            SymptomKind::Nausea => "nausea",
            SymptomKind::LossOfAppetite => "loss_of_appetite",
            SymptomKind::RapidBreathing => "rapid_breathing",
            SymptomKind::ChestPain => "chest_pain",
            SymptomKind::Cough => "cough",
            SymptomKind::UrinaryIssues => "urinary_issues",
            SymptomKind::Headache => "headache",
        }
    }
}

/// A patient-reported symptom entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub symptom_type: String,
    /// Patient-reported 0–10; out-of-range values are clamped on read.
    pub severity: i32,
    pub logged_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl Symptom {
    pub fn new(symptom_type: impl Into<String>, severity: i32, logged_at: DateTime<Utc>) -> Self {
        Self {
            symptom_type: symptom_type.into(),
            severity,
            logged_at,
            details: None,
        }
    }

    pub fn kind(&self) -> Option<SymptomKind> {
        SymptomKind::parse(&self.symptom_type)
    }

    pub fn severity(&self) -> f64 {
        f64::from(self.severity.clamp(0, 10))
    }

    pub fn is_any_of(&self, kinds: &[SymptomKind]) -> bool {
        self.kind().is_some_and(|k| kinds.contains(&k))
    }
}

/* ----------------------------
Medications
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub times_per_day: u32,
}

impl Default for Frequency {
    fn default() -> Self {
        Self { times_per_day: 1 }
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Medication {
    pub fn new(id: impl Into<String>, name: impl Into<String>, times_per_day: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dosage: String::new(),
            frequency: Frequency { times_per_day },
            active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicationStatus {
    Taken,
    Postponed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationLog {
    pub medication_id: String,
    pub status: MedicationStatus,
    pub created_at: DateTime<Utc>,
}

impl MedicationLog {
    pub fn new(
        medication_id: impl Into<String>,
        status: MedicationStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            medication_id: medication_id.into(),
            status,
            created_at,
        }
    }
}

/* ----------------------------
Comorbidities
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSeverity {
    Mild,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    Active,
    Controlled,
    Monitoring,
    Inactive,
}

/// Conditions the heuristics know about; everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Hypertension,
    Diabetes,
    HeartFailure,
    Parkinsons,
    Other,
}

impl ConditionCategory {
    /// Exact alias lookup after normalization; no substring guessing.
    pub fn from_name(name: &str) -> Self {
        match normalize_label(name).as_str() {
            "hypertension" | "high_blood_pressure" | "htn" | "essential_hypertension" => {
                ConditionCategory::Hypertension
            }
            "diabetes" | "diabetes_mellitus" | "type_1_diabetes" | "type_2_diabetes"
            | "type1_diabetes" | "type2_diabetes" | "t1d" | "t2d" => ConditionCategory::Diabetes,
            "heart_failure" | "congestive_heart_failure" | "chf" => {
                ConditionCategory::HeartFailure
            }
            "parkinsons" | "parkinson" | "parkinsons_disease" | "parkinson_disease"
            | "parkinson_s_disease" | "parkinson_s" => ConditionCategory::Parkinsons,
            _ => ConditionCategory::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comorbidity {
    pub condition_name: String,
    pub severity: ConditionSeverity,
    pub status: ConditionStatus,
    pub updated_at: DateTime<Utc>,
}

impl Comorbidity {
    pub fn new(
        condition_name: impl Into<String>,
        severity: ConditionSeverity,
        status: ConditionStatus,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            condition_name: condition_name.into(),
            severity,
            status,
            updated_at,
        }
    }

    pub fn category(&self) -> ConditionCategory {
        ConditionCategory::from_name(&self.condition_name)
    }
}

/// Conditions that drive range overrides: everything not `inactive`, caller order kept.
pub fn active_conditions(comorbidities: &[Comorbidity]) -> Vec<ConditionCategory> {
    comorbidities
        .iter()
        .filter(|c| c.status != ConditionStatus::Inactive)
        .map(Comorbidity::category)
        .collect()
}

/* ----------------------------
Session context
---------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Patient,
    Caregiver,
}

/// Everything the host hands over for one evaluation cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthSnapshot {
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub medication_logs: Vec<MedicationLog>,
    #[serde(default)]
    pub comorbidities: Vec<Comorbidity>,
    #[serde(default)]
    pub vitals: Vec<VitalReading>,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub recent_medication_change_count: u32,
    #[serde(default)]
    pub user_role: UserRole,
    #[serde(default)]
    pub age: Option<u32>,
}

impl HealthSnapshot {
    /// Ingestion step: vitals with `out_of_range` recomputed against this
    /// patient's conditions and age.
    pub fn classify_vitals(&self) -> Vec<VitalReading> {
        let conditions = active_conditions(&self.comorbidities);
        self.vitals
            .iter()
            .map(|v| v.classified(&conditions, self.age))
            .collect()
    }
}

/// Lowercase, map separators to `_`, drop apostrophes, collapse repeats.
fn normalize_label(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_sep = true;
    for ch in s.trim().chars() {
        let lc = ch.to_ascii_lowercase();
        if lc.is_ascii_alphanumeric() {
            out.push(lc);
            last_sep = false;
        } else if matches!(lc, '\'' | '’') {
            continue;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
