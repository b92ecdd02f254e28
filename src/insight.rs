//! # Insights
//! Normalized advisory records surfaced to the user.
//!
//! Every calculator result the engine keeps is wrapped into an [`Insight`]
//! on a shared priority scale. The calculator's own payload stays in `data`,
//! so the priority collapse loses nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analyze::burnout::BurnoutAssessment;
use crate::fall_risk::{FallRiskAssessment, FallRiskLevel};
use crate::infection::{InfectionRiskLevel, InfectionWarning};
use crate::model::SymptomKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    FallRisk,
    InfectionWarning,
    MedicationTiming,
    CaregiverSupport,
    PositivePattern,
}

impl InsightType {
    pub fn as_str(self) -> &'static str {
        match self {
            InsightType::FallRisk => "fall_risk",
            InsightType::InfectionWarning => "infection_warning",
            InsightType::MedicationTiming => "medication_timing",
            InsightType::CaregiverSupport => "caregiver_support",
            InsightType::PositivePattern => "positive_pattern",
        }
    }
}

/// Shared priority scale. Ordering follows rank: `Low < Medium < High < Urgent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }
}

impl From<FallRiskLevel> for Priority {
    fn from(level: FallRiskLevel) -> Self {
        match level {
            FallRiskLevel::Critical => Priority::Urgent,
            FallRiskLevel::High => Priority::High,
            FallRiskLevel::Moderate => Priority::Medium,
            FallRiskLevel::Low => Priority::Low,
        }
    }
}

impl From<InfectionRiskLevel> for Priority {
    fn from(level: InfectionRiskLevel) -> Self {
        match level {
            InfectionRiskLevel::Urgent => Priority::Urgent,
            InfectionRiskLevel::High => Priority::High,
            InfectionRiskLevel::Moderate => Priority::Medium,
            InfectionRiskLevel::Low => Priority::Low,
        }
    }
}

/// Calculator-specific payload. Risk levels keep their own vocabulary here
/// (`critical` vs `urgent`) even though both collapse to priority `urgent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InsightData {
    FallRisk {
        risk_level: FallRiskLevel,
        assessment: FallRiskAssessment,
    },
    InfectionWarning {
        risk_level: InfectionRiskLevel,
        warning: InfectionWarning,
    },
    MedicationTiming {
        medication_id: String,
        medication_name: String,
        symptom: SymptomKind,
        peak_hour: u32,
        suggested_hour: u32,
    },
    CaregiverSupport {
        assessment: BurnoutAssessment,
    },
    PositivePattern {
        improvements: Vec<String>,
        recent_symptom_count: usize,
        prior_symptom_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub actionable: bool,
    pub dismissible: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub data: InsightData,
}

impl Insight {
    /// Builds an insight with a deterministic id derived from type, title and time.
    pub fn new(
        insight_type: InsightType,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
        data: InsightData,
        now: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        Self {
            id: insight_id(insight_type, &title, now),
            insight_type,
            priority,
            title,
            message: message.into(),
            recommendations: Vec::new(),
            actionable: false,
            dismissible: true,
            created_at: now,
            valid_until: None,
            data,
        }
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn actionable(mut self, actionable: bool) -> Self {
        self.actionable = actionable;
        self
    }

    pub fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = dismissible;
        self
    }

    pub fn valid_until(mut self, until: DateTime<Utc>) -> Self {
        self.valid_until = Some(until);
        self
    }

    /// Expired strictly after `valid_until`; insights without one never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| now > until)
    }

    /// Two insights describe the same thing when type and title match.
    pub fn same_subject(&self, other: &Insight) -> bool {
        self.insight_type == other.insight_type && self.title == other.title
    }
}

/// `<type>-<first 12 hex chars of sha256(type|title|unix_ms)>`
fn insight_id(insight_type: InsightType, title: &str, now: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(insight_type.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(now.timestamp_millis().to_be_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(insight_type.as_str().len() + 13);
    out.push_str(insight_type.as_str());
    out.push('-');
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
