//! # Wellness Score Composer
//! Combines five weighted sub-scores into one 0–100 score with an alert level
//! and short advice strings.
//!
//! | Sub-score               | Window | Default | Floor |
//! |-------------------------|--------|---------|-------|
//! | medication adherence    | 7 d    | 85      | 0     |
//! | comorbidity management  | –      | 90      | 0     |
//! | neurological impact     | 14 d   | 85      | 30    |
//! | vitals stability        | 30 d   | 75 / 80 | 30    |
//! | general wellness        | 7 d    | 85      | 40    |
//!
//! Overall = Σ(sub-score × weight) / Σ weights, rounded. Defaults are the
//! 30/25/20/15/10 split from [`WellnessWeights`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::WellnessWeights;
use crate::model::{
    Comorbidity, ConditionCategory, ConditionSeverity, ConditionStatus, Medication,
    MedicationLog, MedicationStatus, Symptom, SymptomKind, VitalReading,
};

const NEUTRAL_ADHERENCE: f64 = 85.0;
const NEUTRAL_COMORBIDITY: f64 = 90.0;
const NEUTRAL_NEUROLOGICAL: f64 = 85.0;
const VITALS_NONE_IN_WINDOW: f64 = 75.0;
const VITALS_NEVER_LOGGED: f64 = 80.0;
const GENERAL_BASE: f64 = 85.0;
const ENGAGEMENT_BONUS: f64 = 5.0;

/// Days after which a comorbidity record starts losing a point per day.
const STALENESS_GRACE_DAYS: i64 = 30;

pub const NEUROLOGICAL_SYMPTOMS: &[SymptomKind] = &[
    SymptomKind::Tremor,
    SymptomKind::Stiffness,
    SymptomKind::Balance,
    SymptomKind::Coordination,
    SymptomKind::Speech,
    SymptomKind::Cognitive,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Good,
    Attention,
    Urgent,
}

/// Per-factor sub-scores, each 0–100 and rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellnessBreakdown {
    pub medication_adherence: f64,
    pub comorbidity_management: f64,
    pub neurological: f64,
    pub vitals_stability: f64,
    pub general_wellness: f64,
}

impl WellnessBreakdown {
    fn rounded(self) -> Self {
        Self {
            medication_adherence: round1(self.medication_adherence),
            comorbidity_management: round1(self.comorbidity_management),
            neurological: round1(self.neurological),
            vitals_stability: round1(self.vitals_stability),
            general_wellness: round1(self.general_wellness),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessScore {
    pub overall: u32,
    pub breakdown: WellnessBreakdown,
    pub weights: WellnessWeights,
    pub insights: Vec<String>,
    pub alert_level: AlertLevel,
}

/// Compose with the default weight split.
pub fn compose(
    medications: &[Medication],
    medication_logs: &[MedicationLog],
    comorbidities: &[Comorbidity],
    vitals: &[VitalReading],
    symptoms: &[Symptom],
    now: DateTime<Utc>,
) -> WellnessScore {
    WellnessComposer::default().compose(
        medications,
        medication_logs,
        comorbidities,
        vitals,
        symptoms,
        now,
    )
}

#[derive(Debug, Clone, Default)]
pub struct WellnessComposer {
    weights: WellnessWeights,
}

impl WellnessComposer {
    pub fn new(weights: WellnessWeights) -> Self {
        Self { weights }
    }

    pub fn compose(
        &self,
        medications: &[Medication],
        medication_logs: &[MedicationLog],
        comorbidities: &[Comorbidity],
        vitals: &[VitalReading],
        symptoms: &[Symptom],
        now: DateTime<Utc>,
    ) -> WellnessScore {
        crate::metrics::ensure_described();

        let raw = WellnessBreakdown {
            medication_adherence: medication_adherence(medications, medication_logs, now),
            comorbidity_management: comorbidity_management(comorbidities, now),
            neurological: neurological_impact(symptoms, now),
            vitals_stability: vitals_stability(vitals, comorbidities, now),
            general_wellness: general_wellness(symptoms, vitals, now),
        };

        // Rounding is for reporting only; the composite uses the exact sub-scores.
        let overall = weighted_overall(&raw, &self.weights);
        let alert_level = alert_level(overall, comorbidities, vitals, now);
        let insights = advice(&raw, vitals.is_empty());
        let breakdown = raw.rounded();

        tracing::debug!(
            overall,
            ?alert_level,
            medication = breakdown.medication_adherence,
            comorbidity = breakdown.comorbidity_management,
            neurological = breakdown.neurological,
            vitals = breakdown.vitals_stability,
            general = breakdown.general_wellness,
            "wellness score composed"
        );
        crate::metrics::record_wellness_score(overall);

        WellnessScore {
            overall,
            breakdown,
            weights: self.weights,
            insights,
            alert_level,
        }
    }
}

/// Taken doses over the trailing 7 days against the doses active medications call for.
pub fn medication_adherence(
    medications: &[Medication],
    logs: &[MedicationLog],
    now: DateTime<Utc>,
) -> f64 {
    if medications.is_empty() {
        return NEUTRAL_ADHERENCE;
    }
    let expected: u64 = medications
        .iter()
        .filter(|m| m.active)
        .map(|m| u64::from(m.frequency.times_per_day) * 7)
        .sum();
    if expected == 0 {
        return NEUTRAL_ADHERENCE;
    }
    let since = now - Duration::days(7);
    let taken = logs
        .iter()
        .filter(|l| l.status == MedicationStatus::Taken && within(l.created_at, since, now))
        .count();
    clamp_score(taken as f64 / expected as f64 * 100.0, 0.0)
}

/// Severity-weighted mean of per-condition status scores with a staleness penalty.
pub fn comorbidity_management(comorbidities: &[Comorbidity], now: DateTime<Utc>) -> f64 {
    if comorbidities.is_empty() {
        return NEUTRAL_COMORBIDITY;
    }
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for c in comorbidities {
        let base = match c.status {
            ConditionStatus::Controlled => 90.0,
            ConditionStatus::Monitoring => 70.0,
            ConditionStatus::Active => 50.0,
            ConditionStatus::Inactive => 95.0,
        };
        let days = (now - c.updated_at).num_days();
        let stale = (days - STALENESS_GRACE_DAYS).max(0) as f64;
        let w = match c.severity {
            ConditionSeverity::Severe => 3.0,
            ConditionSeverity::Moderate => 2.0,
            ConditionSeverity::Mild => 1.0,
        };
        weighted += (base - stale) * w;
        total_weight += w;
    }
    clamp_score(weighted / total_weight, 0.0)
}

/// Burden of movement/cognition symptoms over the trailing 14 days.
pub fn neurological_impact(symptoms: &[Symptom], now: DateTime<Utc>) -> f64 {
    let since = now - Duration::days(14);
    let neuro: Vec<&Symptom> = symptoms
        .iter()
        .filter(|s| within(s.logged_at, since, now) && s.is_any_of(NEUROLOGICAL_SYMPTOMS))
        .collect();
    if neuro.is_empty() {
        return NEUTRAL_NEUROLOGICAL;
    }
    let count = neuro.len() as f64;
    let avg = neuro.iter().map(|s| s.severity()).sum::<f64>() / count;
    clamp_score(100.0 - avg * 15.0 - (count * 2.0).min(20.0), 30.0)
}

/// Share of out-of-range readings over the trailing 30 days.
pub fn vitals_stability(
    vitals: &[VitalReading],
    comorbidities: &[Comorbidity],
    now: DateTime<Utc>,
) -> f64 {
    if vitals.is_empty() {
        return VITALS_NEVER_LOGGED;
    }
    let since = now - Duration::days(30);
    let recent: Vec<&VitalReading> = vitals
        .iter()
        .filter(|v| within(v.measured_at, since, now))
        .collect();
    if recent.is_empty() {
        return VITALS_NONE_IN_WINDOW;
    }
    let flagged = recent.iter().filter(|v| v.out_of_range).count();
    let rate = flagged as f64 / recent.len() as f64 * 100.0;

    let mut score = 100.0 - rate * 2.0;
    let cardiometabolic = comorbidities.iter().any(|c| {
        c.status == ConditionStatus::Active
            && matches!(
                c.category(),
                ConditionCategory::Hypertension | ConditionCategory::Diabetes
            )
    });
    if cardiometabolic {
        score -= rate * 0.5;
    }
    clamp_score(score, 30.0)
}

/// Non-neurological symptom load over 7 days, with a bonus for regular vitals logging.
pub fn general_wellness(symptoms: &[Symptom], vitals: &[VitalReading], now: DateTime<Utc>) -> f64 {
    let since = now - Duration::days(7);
    let general: Vec<&Symptom> = symptoms
        .iter()
        .filter(|s| within(s.logged_at, since, now) && !s.is_any_of(NEUROLOGICAL_SYMPTOMS))
        .collect();

    let mut score = GENERAL_BASE;
    if !general.is_empty() {
        let avg = general.iter().map(|s| s.severity()).sum::<f64>() / general.len() as f64;
        score -= avg * 5.0;
    }
    let logged = vitals
        .iter()
        .filter(|v| within(v.measured_at, since, now))
        .count();
    if logged >= 3 {
        score += ENGAGEMENT_BONUS;
    }
    clamp_score(score, 40.0)
}

fn weighted_overall(b: &WellnessBreakdown, w: &WellnessWeights) -> u32 {
    let total = w.total().max(1);
    let raw = b.medication_adherence * f64::from(w.medication_adherence)
        + b.comorbidity_management * f64::from(w.comorbidity_management)
        + b.neurological * f64::from(w.neurological)
        + b.vitals_stability * f64::from(w.vitals_stability)
        + b.general_wellness * f64::from(w.general_wellness);
    let overall = clamp_score(raw / total as f64, 0.0).round();
    overall as u32
}

/// Vital and comorbidity triggers are checked before the score thresholds.
fn alert_level(
    overall: u32,
    comorbidities: &[Comorbidity],
    vitals: &[VitalReading],
    now: DateTime<Utc>,
) -> AlertLevel {
    let since = now - Duration::hours(24);
    let recent_flag = vitals
        .iter()
        .any(|v| v.out_of_range && within(v.measured_at, since, now));
    let severe_active = comorbidities
        .iter()
        .any(|c| c.status == ConditionStatus::Active && c.severity == ConditionSeverity::Severe);

    if recent_flag || severe_active || overall < 50 {
        AlertLevel::Urgent
    } else if overall < 70 {
        AlertLevel::Attention
    } else {
        AlertLevel::Good
    }
}

fn advice(b: &WellnessBreakdown, no_vitals: bool) -> Vec<String> {
    let mut out = Vec::new();
    if b.medication_adherence < 70.0 {
        out.push(
            "Several doses were missed this week. Setting medication reminders could help you stay on track."
                .to_string(),
        );
    } else if b.medication_adherence > 90.0 {
        out.push("Excellent medication adherence this week. Keep it up!".to_string());
    }
    if b.comorbidity_management < 60.0 {
        out.push(
            "Some of your conditions need attention. Consider scheduling a follow-up with your care team."
                .to_string(),
        );
    }
    if b.vitals_stability < 70.0 {
        out.push(
            "Several recent vital readings were out of range. Discuss them with your doctor."
                .to_string(),
        );
    }
    if no_vitals {
        out.push(
            "Start tracking your vitals regularly to get a fuller picture of your health."
                .to_string(),
        );
    }
    if out.is_empty() {
        out.push("Your health indicators look steady. Maintain your current routine.".to_string());
    }
    out
}

/// `since < t <= now`
pub(crate) fn within(t: DateTime<Utc>, since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    t > since && t <= now
}

/// Clamp into `[floor, 100]`; non-finite input collapses to `floor`.
fn clamp_score(x: f64, floor: f64) -> f64 {
    if x.is_finite() {
        x.clamp(floor, 100.0)
    } else {
        floor
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
