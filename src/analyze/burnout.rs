//! Caregiver burnout hook. The engine does not estimate strain itself; the
//! host plugs in an assessor and the engine turns a non-low result into a
//! caregiver-support insight.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::insight::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnoutLevel {
    Low,
    Moderate,
    High,
}

impl BurnoutLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            BurnoutLevel::Low => "low",
            BurnoutLevel::Moderate => "moderate",
            BurnoutLevel::High => "high",
        }
    }

    /// `None` for low: nothing to surface.
    pub fn priority(self) -> Option<Priority> {
        match self {
            BurnoutLevel::High => Some(Priority::High),
            BurnoutLevel::Moderate => Some(Priority::Medium),
            BurnoutLevel::Low => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnoutAssessment {
    pub level: BurnoutLevel,
    #[serde(default)]
    pub indicators: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl BurnoutAssessment {
    pub fn new(level: BurnoutLevel) -> Self {
        Self {
            level,
            indicators: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn with_indicators<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indicators = indicators.into_iter().map(Into::into).collect();
        self
    }
}

/// Supplied by the host application. Errors are logged and the caregiver
/// analysis is skipped for that cycle.
pub trait BurnoutAssessor: Send + Sync {
    fn assess(&self, now: DateTime<Utc>) -> Result<BurnoutAssessment>;
}

impl<F> BurnoutAssessor for F
where
    F: Fn(DateTime<Utc>) -> Result<BurnoutAssessment> + Send + Sync,
{
    fn assess(&self, now: DateTime<Utc>) -> Result<BurnoutAssessment> {
        self(now)
    }
}

/// Always reports the same assessment.
#[derive(Debug, Clone)]
pub struct FixedBurnout(pub BurnoutAssessment);

impl BurnoutAssessor for FixedBurnout {
    fn assess(&self, _now: DateTime<Utc>) -> Result<BurnoutAssessment> {
        Ok(self.0.clone())
    }
}

pub(crate) fn default_recommendations(level: BurnoutLevel) -> Vec<String> {
    let mut out = vec![
        "Schedule at least one short break for yourself each day.".to_string(),
        "Ask a family member or friend to cover one caregiving task this week.".to_string(),
    ];
    if level == BurnoutLevel::High {
        out.push("Consider talking to a counselor or a caregiver support group.".to_string());
        out.push("Look into respite care options in your area.".to_string());
    }
    out
}
