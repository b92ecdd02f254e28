// tests/insight_engine.rs
use std::collections::HashSet;
use std::thread;

use anyhow::anyhow;
use chrono::{DateTime, Duration, TimeZone, Utc};
use wellness_insights::{
    BurnoutAssessment, BurnoutLevel, EngineConfig, FallRiskLevel, FixedBurnout, Insight,
    InsightData, InsightEngine, InsightRequest, InsightValidity, InsightType, Medication, Priority,
    SharedInsightEngine, Symptom, UserRole, VitalReading, VitalType,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

/// Critical fall risk plus urgent infection warning.
fn acute_inputs() -> (Vec<VitalReading>, Vec<Symptom>) {
    let vitals = vec![
        VitalReading::blood_pressure(90.0, 58.0, now() - Duration::minutes(10)),
        VitalReading::blood_pressure(115.0, 75.0, now()),
        VitalReading::scalar(VitalType::Temperature, 103.2, Some("°F"), now() - Duration::minutes(5)),
        VitalReading::scalar(VitalType::Pulse, 125.0, None, now() - Duration::minutes(5)),
    ];
    let symptoms = vec![
        Symptom::new("tremor", 6, now() - Duration::hours(1)),
        Symptom::new("fever", 7, now() - Duration::hours(1)),
        Symptom::new("confusion", 5, now() - Duration::hours(1)),
    ];
    (vitals, symptoms)
}

fn find(list: &[Insight], t: InsightType) -> Option<&Insight> {
    list.iter().find(|i| i.insight_type == t)
}

fn subjects(list: &[Insight]) -> HashSet<(InsightType, String)> {
    list.iter().map(|i| (i.insight_type, i.title.clone())).collect()
}

#[test]
fn acute_inputs_produce_urgent_risk_insights() {
    let (vitals, symptoms) = acute_inputs();
    let mut engine = InsightEngine::default();
    let out = engine.generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());

    let fall = find(&out, InsightType::FallRisk).expect("fall risk insight");
    assert_eq!(fall.priority, Priority::Urgent);
    assert!(!fall.dismissible);
    assert!(fall.actionable);
    assert_eq!(fall.valid_until, Some(now() + Duration::hours(24)));
    match &fall.data {
        InsightData::FallRisk { risk_level, .. } => assert_eq!(*risk_level, FallRiskLevel::Critical),
        other => panic!("unexpected payload {other:?}"),
    }

    let infection = find(&out, InsightType::InfectionWarning).expect("infection insight");
    assert_eq!(infection.priority, Priority::Urgent);
    assert_eq!(infection.valid_until, Some(now() + Duration::hours(12)));

    assert_eq!(out[0].priority, Priority::Urgent);
    let ranks: Vec<u8> = out.iter().map(|i| i.priority.rank()).collect();
    assert!(ranks.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn low_risk_produces_no_risk_insights() {
    let mut engine = InsightEngine::default();
    let out = engine.generate(&InsightRequest::new(&[], &[], &[]), now());
    assert!(out.is_empty());
}

#[test]
fn repeated_generation_does_not_duplicate() {
    let (vitals, symptoms) = acute_inputs();
    let request = InsightRequest::new(&vitals, &symptoms, &[]);
    let mut engine = InsightEngine::default();

    let first = engine.generate(&request, now());
    let second = engine.generate(&request, now());
    let third = engine.generate(&request, now() + Duration::minutes(30));

    assert_eq!(first.len(), second.len());
    assert_eq!(first.len(), third.len());
    assert_eq!(subjects(&third).len(), third.len());
    assert_eq!(first, second);
}

#[test]
fn expired_insights_leave_the_views() {
    let (vitals, symptoms) = acute_inputs();
    let mut engine = InsightEngine::default();
    engine.generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());
    assert_eq!(engine.by_priority(Priority::Urgent, now()).len(), 2);

    let later = now() + Duration::hours(13);
    let urgent = engine.by_priority(Priority::Urgent, later);
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].insight_type, InsightType::FallRisk);

    let much_later = now() + Duration::hours(25);
    assert!(engine.by_priority(Priority::Urgent, much_later).is_empty());
    assert!(engine.actionable_only(much_later).is_empty());

    // the next cycle drops them from the retained list too
    let out = engine.generate(&InsightRequest::new(&[], &[], &[]), much_later);
    assert!(find(&out, InsightType::FallRisk).is_none());
}

#[test]
fn dismiss_removes_exactly_one() {
    let (vitals, symptoms) = acute_inputs();
    let mut engine = InsightEngine::default();
    let out = engine.generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());
    let id = find(&out, InsightType::InfectionWarning).unwrap().id.clone();

    assert!(engine.dismiss(&id));
    assert!(!engine.dismiss(&id));
    let left = engine.insights(now());
    assert_eq!(left.len(), out.len() - 1);
    assert!(left.iter().all(|i| i.id != id));

    engine.clear();
    assert!(engine.insights(now()).is_empty());
}

#[test]
fn caregiver_support_depends_on_role_and_level() {
    let (vitals, symptoms) = acute_inputs();
    let high = FixedBurnout(BurnoutAssessment::new(BurnoutLevel::High).with_indicators(["night waking"]));

    let mut engine = InsightEngine::default().with_burnout_assessor(high.clone());
    let patient = InsightRequest::new(&vitals, &symptoms, &[]);
    assert!(find(&engine.generate(&patient, now()), InsightType::CaregiverSupport).is_none());

    let caregiver = patient.role(UserRole::Caregiver);
    let out = engine.generate(&caregiver, now());
    let support = find(&out, InsightType::CaregiverSupport).expect("caregiver insight");
    assert_eq!(support.priority, Priority::High);
    assert!(support.actionable);
    assert!(support.dismissible);
    assert_eq!(support.valid_until, Some(now() + Duration::days(2)));
    assert!(!support.recommendations.is_empty());

    let mut calm = InsightEngine::default()
        .with_burnout_assessor(FixedBurnout(BurnoutAssessment::new(BurnoutLevel::Low)));
    assert!(find(&calm.generate(&caregiver, now()), InsightType::CaregiverSupport).is_none());

    let mut unconfigured = InsightEngine::default();
    assert!(find(&unconfigured.generate(&caregiver, now()), InsightType::CaregiverSupport).is_none());
}

#[test]
fn failing_analysis_is_skipped_not_fatal() {
    let (vitals, symptoms) = acute_inputs();
    let mut engine = InsightEngine::default().with_burnout_assessor(
        |_now: DateTime<Utc>| -> anyhow::Result<BurnoutAssessment> { Err(anyhow!("usage data unavailable")) },
    );
    let out = engine.generate(
        &InsightRequest::new(&vitals, &symptoms, &[]).role(UserRole::Caregiver),
        now(),
    );
    assert!(find(&out, InsightType::CaregiverSupport).is_none());
    assert!(find(&out, InsightType::FallRisk).is_some());
    assert!(find(&out, InsightType::InfectionWarning).is_some());
}

#[test]
fn panicking_assessor_does_not_take_the_engine_down() {
    let (vitals, symptoms) = acute_inputs();
    let mut engine = InsightEngine::default().with_burnout_assessor(
        |_now: DateTime<Utc>| -> anyhow::Result<BurnoutAssessment> { panic!("assessor bug") },
    );
    let out = engine.generate(
        &InsightRequest::new(&vitals, &symptoms, &[]).role(UserRole::Caregiver),
        now(),
    );
    assert!(find(&out, InsightType::FallRisk).is_some());
}

#[test]
fn morning_stiffness_suggests_earlier_dose() {
    let symptoms: Vec<Symptom> = (1..=3)
        .map(|d| {
            let at = Utc.with_ymd_and_hms(2025, 6, 15 - d, 7, 20, 0).unwrap();
            Symptom::new("stiffness", 1, at)
        })
        .collect();
    let meds = vec![Medication::new("med-1", "Levodopa", 3)];
    let mut engine = InsightEngine::default();
    let out = engine.generate(&InsightRequest::new(&[], &symptoms, &meds), now());

    let timing = find(&out, InsightType::MedicationTiming).expect("timing insight");
    assert_eq!(timing.title, "Timing suggestion for Levodopa");
    assert_eq!(timing.priority, Priority::Medium);
    assert!(timing.dismissible);
    assert_eq!(timing.valid_until, Some(now() + Duration::days(7)));
    match &timing.data {
        InsightData::MedicationTiming {
            peak_hour,
            suggested_hour,
            medication_id,
            ..
        } => {
            assert_eq!(*peak_hour, 7);
            assert_eq!(*suggested_hour, 6);
            assert_eq!(medication_id, "med-1");
        }
        other => panic!("unexpected payload {other:?}"),
    }

    let shifted = EngineConfig {
        utc_offset_minutes: 120,
        ..EngineConfig::default()
    };
    let out = InsightEngine::new(shifted).generate(&InsightRequest::new(&[], &symptoms, &meds), now());
    match &find(&out, InsightType::MedicationTiming).unwrap().data {
        InsightData::MedicationTiming { suggested_hour, .. } => assert_eq!(*suggested_hour, 8),
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn oversized_validity_still_yields_risk_insights() {
    let (vitals, symptoms) = acute_inputs();
    let config = EngineConfig {
        validity: InsightValidity {
            fall_risk_hours: i64::MAX,
            infection_hours: i64::MAX,
            ..InsightValidity::default()
        },
        ..EngineConfig::default()
    };
    let out = InsightEngine::new(config).generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());
    let fall = find(&out, InsightType::FallRisk).expect("fall risk insight");
    assert_eq!(fall.priority, Priority::Urgent);
    assert_eq!(fall.valid_until, Some(now() + Duration::days(365)));
    assert!(find(&out, InsightType::InfectionWarning).is_some());
}

#[test]
fn fewer_symptoms_are_celebrated() {
    let mut symptoms: Vec<Symptom> = (0..5)
        .map(|i| Symptom::new("pain", 3, now() - Duration::days(4) - Duration::hours(i)))
        .collect();
    symptoms.push(Symptom::new("pain", 3, now() - Duration::hours(5)));

    let mut engine = InsightEngine::default();
    let out = engine.generate(&InsightRequest::new(&[], &symptoms, &[]), now());
    let positive = find(&out, InsightType::PositivePattern).expect("positive insight");
    assert_eq!(positive.priority, Priority::Low);
    assert!(!positive.actionable);
    assert!(positive.dismissible);
    assert_eq!(positive.valid_until, Some(now() + Duration::days(3)));
    assert!(engine.actionable_only(now()).iter().all(|i| i.insight_type != InsightType::PositivePattern));
}

#[test]
fn insights_serialize_with_type_tags() {
    let (vitals, symptoms) = acute_inputs();
    let mut engine = InsightEngine::default();
    let out = engine.generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());
    let json = serde_json::to_value(find(&out, InsightType::FallRisk).unwrap()).unwrap();
    assert_eq!(json["type"], "fall_risk");
    assert_eq!(json["priority"], "urgent");
    assert_eq!(json["data"]["risk_level"], "critical");
}

#[test]
fn shared_engine_serialises_concurrent_generation() {
    let (vitals, symptoms) = acute_inputs();
    let shared = SharedInsightEngine::new(InsightEngine::default());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            let vitals = vitals.clone();
            let symptoms = symptoms.clone();
            thread::spawn(move || {
                shared.generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let mut single = InsightEngine::default();
    let expected = single.generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());
    let got = shared.insights(now());
    assert_eq!(got.len(), expected.len());
    assert_eq!(subjects(&got), subjects(&expected));
}
