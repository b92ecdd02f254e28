// src/config/engine.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const ENV_CONFIG_PATH: &str = "WELLNESS_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/wellness.toml";
pub const DEFAULT_JSON_PATH: &str = "config/wellness.json";

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;
const MAX_VALIDITY_DAYS: i64 = 365;

/// Sub-score weights of the wellness composite, in integer percent.
///
/// The overall score is divided by the sum of weights, so a custom set does
/// not have to add up to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellnessWeights {
    pub medication_adherence: u32,
    pub comorbidity_management: u32,
    pub neurological: u32,
    pub vitals_stability: u32,
    pub general_wellness: u32,
}

impl Default for WellnessWeights {
    fn default() -> Self {
        Self {
            medication_adherence: 30,
            comorbidity_management: 25,
            neurological: 20,
            vitals_stability: 15,
            general_wellness: 10,
        }
    }
}

impl WellnessWeights {
    /// Sum of all weights, widened so any `u32` values add without overflow.
    pub fn total(&self) -> u64 {
        [
            self.medication_adherence,
            self.comorbidity_management,
            self.neurological,
            self.vitals_stability,
            self.general_wellness,
        ]
        .into_iter()
        .map(u64::from)
        .sum()
    }
}

/// How long each insight kind stays valid after it is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightValidity {
    pub fall_risk_hours: i64,
    pub infection_hours: i64,
    pub medication_timing_days: i64,
    pub positive_pattern_days: i64,
    pub caregiver_support_days: i64,
}

impl Default for InsightValidity {
    fn default() -> Self {
        Self {
            fall_risk_hours: 24,
            infection_hours: 12,
            medication_timing_days: 7,
            positive_pattern_days: 3,
            caregiver_support_days: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: WellnessWeights,
    pub validity: InsightValidity,
    /// Offset applied before binning symptom timestamps by hour of day.
    pub utc_offset_minutes: i32,
}

impl EngineConfig {
    /// Load from an explicit path. Supports TOML or JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Load using env var + fallbacks:
    /// 1) $WELLNESS_CONFIG_PATH
    /// 2) config/wellness.toml
    /// 3) config/wellness.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Ok(Self::default())
    }

    /// Repair values that would make scoring meaningless.
    pub fn sanitized(mut self) -> Self {
        if self.weights.total() == 0 {
            tracing::warn!("all wellness weights are zero; using defaults");
            self.weights = WellnessWeights::default();
        }
        let v = &mut self.validity;
        let max_hours = MAX_VALIDITY_DAYS * 24;
        v.fall_risk_hours = v.fall_risk_hours.clamp(1, max_hours);
        v.infection_hours = v.infection_hours.clamp(1, max_hours);
        v.medication_timing_days = v.medication_timing_days.clamp(1, MAX_VALIDITY_DAYS);
        v.positive_pattern_days = v.positive_pattern_days.clamp(1, MAX_VALIDITY_DAYS);
        v.caregiver_support_days = v.caregiver_support_days.clamp(1, MAX_VALIDITY_DAYS);
        self.utc_offset_minutes = self
            .utc_offset_minutes
            .clamp(-MAX_UTC_OFFSET_MINUTES, MAX_UTC_OFFSET_MINUTES);
        self
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<EngineConfig> {
    // JSON first when hinted or when the content looks like an object.
    let try_json = hint_ext == "json" || s.trim_start().starts_with('{');
    if try_json {
        if let Ok(c) = serde_json::from_str::<EngineConfig>(s) {
            return Ok(c);
        }
    }
    match toml::from_str::<EngineConfig>(s) {
        Ok(c) => Ok(c),
        Err(toml_err) if !try_json => {
            serde_json::from_str::<EngineConfig>(s).map_err(|_| anyhow!(toml_err))
        }
        Err(_) => Err(anyhow!("unsupported engine config format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = parse_config(
            r#"
utc_offset_minutes = 60

[weights]
medication_adherence = 40
"#,
            "toml",
        )
        .unwrap();
        assert_eq!(cfg.weights.medication_adherence, 40);
        assert_eq!(cfg.weights.neurological, 20);
        assert_eq!(cfg.validity, InsightValidity::default());
        assert_eq!(cfg.utc_offset_minutes, 60);
    }

    #[test]
    fn json_without_extension_hint() {
        let cfg = parse_config(r#"{"validity":{"infection_hours":6}}"#, "").unwrap();
        assert_eq!(cfg.validity.infection_hours, 6);
        assert_eq!(cfg.validity.fall_risk_hours, 24);
    }

    #[test]
    fn sanitize_repairs_degenerate_values() {
        let cfg = EngineConfig {
            weights: WellnessWeights {
                medication_adherence: 0,
                comorbidity_management: 0,
                neurological: 0,
                vitals_stability: 0,
                general_wellness: 0,
            },
            validity: InsightValidity {
                fall_risk_hours: 0,
                infection_hours: -5,
                ..InsightValidity::default()
            },
            utc_offset_minutes: 10_000,
        }
        .sanitized();
        assert_eq!(cfg.weights, WellnessWeights::default());
        assert_eq!(cfg.validity.fall_risk_hours, 1);
        assert_eq!(cfg.validity.infection_hours, 1);
        assert_eq!(cfg.utc_offset_minutes, 14 * 60);
    }

    #[test]
    fn sanitize_caps_validity_windows() {
        let cfg = EngineConfig {
            validity: InsightValidity {
                fall_risk_hours: i64::MAX,
                medication_timing_days: 10_000,
                ..InsightValidity::default()
            },
            ..EngineConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.validity.fall_risk_hours, 365 * 24);
        assert_eq!(cfg.validity.medication_timing_days, 365);
        assert_eq!(cfg.validity.infection_hours, 12);
    }

    #[test]
    fn huge_weights_do_not_overflow() {
        let w = WellnessWeights {
            medication_adherence: u32::MAX,
            comorbidity_management: u32::MAX,
            ..WellnessWeights::default()
        };
        assert_eq!(w.total(), 2 * u64::from(u32::MAX) + 45);
        let cfg = EngineConfig {
            weights: w,
            ..EngineConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.weights, w);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_config("weights = [", "toml").is_err());
    }
}
