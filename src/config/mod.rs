// src/config/mod.rs
pub mod engine;

pub use engine::{EngineConfig, InsightValidity, WellnessWeights};
