// src/lib.rs
// Public library surface for the demo binary and integration tests.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod fall_risk;
pub mod infection;
pub mod insight;
pub mod metrics;
pub mod model;
pub mod ranges;
pub mod wellness;

// Engine-side heuristics (medication timing, positive pattern, caregiver burnout)
pub mod analyze;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{BurnoutAssessment, BurnoutAssessor, BurnoutLevel, FixedBurnout};
pub use crate::classifier::{classify, Significance, Urgency, VitalBand, VitalClassification};
pub use crate::config::{EngineConfig, InsightValidity, WellnessWeights};
pub use crate::engine::{InsightEngine, InsightRequest, SharedInsightEngine};
pub use crate::fall_risk::{FallRiskAssessment, FallRiskFactors, FallRiskLevel};
pub use crate::infection::{InfectionFactors, InfectionRiskLevel, InfectionWarning};
pub use crate::insight::{Insight, InsightData, InsightType, Priority};
pub use crate::model::{
    Comorbidity, ConditionCategory, ConditionSeverity, ConditionStatus, HealthSnapshot,
    Medication, MedicationLog, MedicationStatus, Symptom, SymptomKind, UserRole, VitalReading,
    VitalType, VitalValues,
};
pub use crate::wellness::{AlertLevel, WellnessBreakdown, WellnessComposer, WellnessScore};
