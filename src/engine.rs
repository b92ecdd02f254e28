//! # Insight Engine
//! Runs the risk calculators and heuristics over one input snapshot, wraps
//! non-trivial results as [`Insight`]s and merges them into a retained list
//! that survives across calls.
//!
//! Merge policy: expired entries are dropped, a new insight replaces a
//! retained one with the same `{type, title}`, anything else is appended; the
//! list is then stable-sorted by priority rank, highest first.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use tracing::{debug, info, warn};

use crate::analyze::burnout::{self, BurnoutAssessor};
use crate::analyze::{medication_timing, positive_pattern};
use crate::config::EngineConfig;
use crate::fall_risk::{self, FallRiskLevel};
use crate::infection::{self, InfectionRiskLevel};
use crate::insight::{Insight, InsightData, InsightType, Priority};
use crate::metrics;
use crate::model::{HealthSnapshot, Medication, Symptom, UserRole, VitalReading};

pub const FALL_RISK_TITLE: &str = "Fall risk alert";
pub const INFECTION_TITLE: &str = "Infection early warning";
pub const CAREGIVER_TITLE: &str = "Caregiver support";
pub const POSITIVE_PATTERN_TITLE: &str = "Positive progress";

/// Inputs for one `generate` cycle.
#[derive(Debug, Clone, Copy)]
pub struct InsightRequest<'a> {
    pub vitals: &'a [VitalReading],
    pub symptoms: &'a [Symptom],
    pub medications: &'a [Medication],
    pub recent_medication_change_count: u32,
    pub user_role: UserRole,
}

impl<'a> InsightRequest<'a> {
    pub fn new(
        vitals: &'a [VitalReading],
        symptoms: &'a [Symptom],
        medications: &'a [Medication],
    ) -> Self {
        Self {
            vitals,
            symptoms,
            medications,
            recent_medication_change_count: 0,
            user_role: UserRole::Patient,
        }
    }

    /// Uses the snapshot's symptoms, medications and scalars with the given
    /// vitals (typically the classified copy).
    pub fn from_snapshot(snapshot: &'a HealthSnapshot, vitals: &'a [VitalReading]) -> Self {
        Self {
            vitals,
            symptoms: &snapshot.symptoms,
            medications: &snapshot.medications,
            recent_medication_change_count: snapshot.recent_medication_change_count,
            user_role: snapshot.user_role,
        }
    }

    pub fn medication_changes(mut self, count: u32) -> Self {
        self.recent_medication_change_count = count;
        self
    }

    pub fn role(mut self, role: UserRole) -> Self {
        self.user_role = role;
        self
    }
}

pub struct InsightEngine {
    config: EngineConfig,
    retained: Vec<Insight>,
    burnout: Option<Box<dyn BurnoutAssessor>>,
}

impl fmt::Debug for InsightEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsightEngine")
            .field("config", &self.config)
            .field("retained", &self.retained.len())
            .field("burnout_assessor", &self.burnout.is_some())
            .finish()
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl InsightEngine {
    pub fn new(config: EngineConfig) -> Self {
        metrics::ensure_described();
        Self {
            config: config.sanitized(),
            retained: Vec::new(),
            burnout: None,
        }
    }

    /// Without an assessor the caregiver analysis never runs.
    pub fn with_burnout_assessor(mut self, assessor: impl BurnoutAssessor + 'static) -> Self {
        self.burnout = Some(Box::new(assessor));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every analysis, merges the batch into the retained list and
    /// returns the merged list.
    pub fn generate(&mut self, request: &InsightRequest<'_>, now: DateTime<Utc>) -> Vec<Insight> {
        let mut batch = Vec::new();
        batch.extend(run_analysis("fall_risk", || {
            Ok(self.fall_risk_insight(request, now))
        }));
        batch.extend(run_analysis("infection_warning", || {
            Ok(self.infection_insight(request, now))
        }));
        batch.extend(run_analysis("medication_timing", || {
            self.medication_timing_insights(request, now)
        }));
        batch.extend(run_analysis("positive_pattern", || {
            Ok(self.positive_pattern_insight(request, now))
        }));
        if request.user_role == UserRole::Caregiver {
            batch.extend(run_analysis("caregiver_support", || {
                self.caregiver_insight(now)
            }));
        }

        for insight in &batch {
            metrics::record_generated(insight.insight_type.as_str());
            debug!(id = %insight.id, insight_type = insight.insight_type.as_str(), priority = ?insight.priority, "insight generated");
        }

        let batch_len = batch.len();
        let expired = self.merge(batch, now);
        info!(
            batch = batch_len,
            retained = self.retained.len(),
            expired,
            "insight generation finished"
        );
        self.retained.clone()
    }

    /// Retained, unexpired insights in priority order.
    pub fn insights(&self, now: DateTime<Utc>) -> Vec<Insight> {
        self.live(now).cloned().collect()
    }

    pub fn by_priority(&self, priority: Priority, now: DateTime<Utc>) -> Vec<Insight> {
        self.live(now)
            .filter(|i| i.priority == priority)
            .cloned()
            .collect()
    }

    pub fn actionable_only(&self, now: DateTime<Utc>) -> Vec<Insight> {
        self.live(now).filter(|i| i.actionable).cloned().collect()
    }

    /// Removes the insight with `id`. Returns whether anything was removed.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.retained.len();
        self.retained.retain(|i| i.id != id);
        let removed = self.retained.len() < before;
        if removed {
            metrics::record_dismissed();
            metrics::record_retained(self.retained.len());
            debug!(id, "insight dismissed");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.retained.clear();
        metrics::record_retained(0);
    }

    fn live(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Insight> + '_ {
        self.retained.iter().filter(move |i| !i.is_expired(now))
    }

    /// Returns the number of expired insights dropped.
    fn merge(&mut self, batch: Vec<Insight>, now: DateTime<Utc>) -> usize {
        let before = self.retained.len();
        self.retained.retain(|i| !i.is_expired(now));
        let expired = before - self.retained.len();
        metrics::record_expired(expired);

        for insight in batch {
            match self.retained.iter_mut().find(|r| r.same_subject(&insight)) {
                Some(slot) => *slot = insight,
                None => self.retained.push(insight),
            }
        }
        // sort_by is stable: equal ranks keep insertion order
        self.retained
            .sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
        metrics::record_retained(self.retained.len());
        expired
    }

    fn fall_risk_insight(&self, request: &InsightRequest<'_>, now: DateTime<Utc>) -> Option<Insight> {
        let assessment = fall_risk::assess(
            request.vitals,
            request.symptoms,
            request.recent_medication_change_count,
            now,
        );
        if assessment.level == FallRiskLevel::Low {
            return None;
        }
        let level = assessment.level;
        let message = assessment.alert_message.clone().unwrap_or_else(|| {
            format!(
                "Your fall risk is {} (score {}). Take care when moving around.",
                level.as_str(),
                assessment.score
            )
        });
        let recommendations = assessment.recommendations.clone();
        Some(
            Insight::new(
                InsightType::FallRisk,
                Priority::from(level),
                FALL_RISK_TITLE,
                message,
                InsightData::FallRisk {
                    risk_level: level,
                    assessment,
                },
                now,
            )
            .with_recommendations(recommendations)
            .actionable(true)
            .dismissible(level <= FallRiskLevel::Moderate)
            .valid_until(now + Duration::hours(self.config.validity.fall_risk_hours)),
        )
    }

    fn infection_insight(&self, request: &InsightRequest<'_>, now: DateTime<Utc>) -> Option<Insight> {
        let warning = infection::assess(request.vitals, request.symptoms, now);
        if warning.risk_level == InfectionRiskLevel::Low {
            return None;
        }
        let level = warning.risk_level;
        let message = warning.alert_message.clone().unwrap_or_else(|| {
            format!(
                "Possible early signs of infection ({} risk, score {}).",
                level.as_str(),
                warning.score
            )
        });
        let recommendations = warning.recommendations.clone();
        Some(
            Insight::new(
                InsightType::InfectionWarning,
                Priority::from(level),
                INFECTION_TITLE,
                message,
                InsightData::InfectionWarning {
                    risk_level: level,
                    warning,
                },
                now,
            )
            .with_recommendations(recommendations)
            .actionable(true)
            .dismissible(level <= InfectionRiskLevel::Moderate)
            .valid_until(now + Duration::hours(self.config.validity.infection_hours)),
        )
    }

    fn medication_timing_insights(
        &self,
        request: &InsightRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Insight>> {
        let offset = FixedOffset::east_opt(self.config.utc_offset_minutes * 60)
            .ok_or_else(|| anyhow!("utc offset {} minutes out of range", self.config.utc_offset_minutes))?;
        let valid_until = now + Duration::days(self.config.validity.medication_timing_days);

        let insights = medication_timing::suggest(request.medications, request.symptoms, offset)
            .into_iter()
            .map(|s| {
                let title = format!("Timing suggestion for {}", s.medication_name);
                let message = format!(
                    "{} is most often logged around {:02}:00. Taking {} around {:02}:00 may help keep it under control.",
                    capitalize(s.symptom.as_str()),
                    s.peak_hour,
                    s.medication_name,
                    s.suggested_hour
                );
                let recommendations = vec![
                    format!("Ask your doctor whether taking {} around {:02}:00 is appropriate.", s.medication_name, s.suggested_hour),
                    "Keep logging symptoms so the pattern can be confirmed.".to_string(),
                ];
                Insight::new(
                    InsightType::MedicationTiming,
                    Priority::Medium,
                    title,
                    message,
                    InsightData::MedicationTiming {
                        medication_id: s.medication_id,
                        medication_name: s.medication_name,
                        symptom: s.symptom,
                        peak_hour: s.peak_hour,
                        suggested_hour: s.suggested_hour,
                    },
                    now,
                )
                .with_recommendations(recommendations)
                .actionable(true)
                .dismissible(true)
                .valid_until(valid_until)
            })
            .collect();
        Ok(insights)
    }

    fn positive_pattern_insight(&self, request: &InsightRequest<'_>, now: DateTime<Utc>) -> Option<Insight> {
        let pattern = positive_pattern::detect(request.vitals, request.symptoms, now)?;
        let message = format!("Nice work! {}", pattern.improvements.join(" "));
        Some(
            Insight::new(
                InsightType::PositivePattern,
                Priority::Low,
                POSITIVE_PATTERN_TITLE,
                message,
                InsightData::PositivePattern {
                    improvements: pattern.improvements,
                    recent_symptom_count: pattern.recent_symptom_count,
                    prior_symptom_count: pattern.prior_symptom_count,
                },
                now,
            )
            .actionable(false)
            .dismissible(true)
            .valid_until(now + Duration::days(self.config.validity.positive_pattern_days)),
        )
    }

    fn caregiver_insight(&self, now: DateTime<Utc>) -> Result<Option<Insight>> {
        let Some(assessor) = self.burnout.as_ref() else {
            return Ok(None);
        };
        let assessment = assessor.assess(now)?;
        let Some(priority) = assessment.level.priority() else {
            return Ok(None);
        };
        let recommendations = if assessment.recommendations.is_empty() {
            burnout::default_recommendations(assessment.level)
        } else {
            assessment.recommendations.clone()
        };
        let message = format!(
            "Signs of {} caregiver strain. Looking after yourself helps you look after them.",
            assessment.level.as_str()
        );
        Ok(Some(
            Insight::new(
                InsightType::CaregiverSupport,
                priority,
                CAREGIVER_TITLE,
                message,
                InsightData::CaregiverSupport { assessment },
                now,
            )
            .with_recommendations(recommendations)
            .actionable(true)
            .dismissible(true)
            .valid_until(now + Duration::days(self.config.validity.caregiver_support_days)),
        ))
    }
}

/// Runs one analysis; errors and panics are logged, counted and yield nothing.
fn run_analysis<T, F>(name: &'static str, analysis: F) -> Vec<Insight>
where
    T: IntoIterator<Item = Insight>,
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(analysis)) {
        Ok(Ok(found)) => found.into_iter().collect(),
        Ok(Err(e)) => {
            warn!(analysis = name, error = %e, "insight analysis failed; skipping");
            metrics::record_analysis_failure(name);
            Vec::new()
        }
        Err(_) => {
            warn!(analysis = name, "insight analysis panicked; skipping");
            metrics::record_analysis_failure(name);
            Vec::new()
        }
    }
}

fn capitalize(s: &str) -> String {
    let s = s.replace('_', " ");
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/* ----------------------------
Thread-safe handle
---------------------------- */

/// Cloneable handle for hosts that share one engine between threads.
/// Each call holds the lock for its whole read-modify-write.
#[derive(Clone, Debug)]
pub struct SharedInsightEngine {
    inner: Arc<Mutex<InsightEngine>>,
}

impl SharedInsightEngine {
    pub fn new(engine: InsightEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InsightEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generate(&self, request: &InsightRequest<'_>, now: DateTime<Utc>) -> Vec<Insight> {
        self.lock().generate(request, now)
    }

    pub fn insights(&self, now: DateTime<Utc>) -> Vec<Insight> {
        self.lock().insights(now)
    }

    pub fn by_priority(&self, priority: Priority, now: DateTime<Utc>) -> Vec<Insight> {
        self.lock().by_priority(priority, now)
    }

    pub fn actionable_only(&self, now: DateTime<Utc>) -> Vec<Insight> {
        self.lock().actionable_only(now)
    }

    pub fn dismiss(&self, id: &str) -> bool {
        self.lock().dismiss(id)
    }

    pub fn clear(&self) {
        self.lock().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn make(t: InsightType, p: Priority, title: &str, at: DateTime<Utc>) -> Insight {
        Insight::new(
            t,
            p,
            title,
            "m",
            InsightData::PositivePattern {
                improvements: vec![],
                recent_symptom_count: 0,
                prior_symptom_count: 0,
            },
            at,
        )
    }

    #[test]
    fn merge_replaces_same_subject_and_sorts_stably() {
        let mut engine = InsightEngine::default();
        engine.merge(
            vec![
                make(InsightType::PositivePattern, Priority::Low, "a", now()),
                make(InsightType::MedicationTiming, Priority::Medium, "b", now()),
                make(InsightType::MedicationTiming, Priority::Medium, "c", now()),
            ],
            now(),
        );
        let later = now() + Duration::minutes(5);
        engine.merge(
            vec![make(InsightType::MedicationTiming, Priority::Urgent, "c", later)],
            later,
        );
        let titles: Vec<&str> = engine.retained.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);
        assert_eq!(engine.retained.len(), 3);
    }

    #[test]
    fn merge_drops_expired() {
        let mut engine = InsightEngine::default();
        engine.merge(
            vec![make(InsightType::PositivePattern, Priority::Low, "a", now())
                .valid_until(now() + Duration::hours(1))],
            now(),
        );
        let expired = engine.merge(Vec::new(), now() + Duration::hours(2));
        assert_eq!(expired, 1);
        assert!(engine.retained.is_empty());
    }

    #[test]
    fn panicking_analysis_is_skipped() {
        let out = run_analysis::<Vec<Insight>, _>("boom", || panic!("bad input"));
        assert!(out.is_empty());
        let out = run_analysis::<Vec<Insight>, _>("err", || Err(anyhow!("nope")));
        assert!(out.is_empty());
    }

    #[test]
    fn capitalize_handles_underscores() {
        assert_eq!(capitalize("walking_difficulty"), "Walking difficulty");
        assert_eq!(capitalize(""), "");
    }
}
