// src/analyze/mod.rs
//! Heuristic analyses the insight engine runs alongside the risk calculators.

pub mod burnout;
pub mod medication_timing;
pub mod positive_pattern;

pub use burnout::{BurnoutAssessment, BurnoutAssessor, BurnoutLevel, FixedBurnout};
pub use medication_timing::TimingSuggestion;
pub use positive_pattern::PositivePattern;
