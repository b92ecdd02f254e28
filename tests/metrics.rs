// tests/metrics.rs
use anyhow::anyhow;
use chrono::{DateTime, Duration, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusBuilder;
use wellness_insights::{
    wellness, BurnoutAssessment, InsightEngine, InsightRequest, InsightType, Symptom, UserRole,
    VitalReading, VitalType,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn acute_inputs() -> (Vec<VitalReading>, Vec<Symptom>) {
    let vitals = vec![
        VitalReading::blood_pressure(90.0, 58.0, now() - Duration::minutes(10)),
        VitalReading::blood_pressure(115.0, 75.0, now()),
        VitalReading::scalar(VitalType::Temperature, 103.2, Some("°F"), now()),
        VitalReading::scalar(VitalType::Pulse, 125.0, None, now()),
    ];
    let symptoms = vec![
        Symptom::new("tremor", 6, now() - Duration::hours(1)),
        Symptom::new("fever", 7, now() - Duration::hours(1)),
        Symptom::new("confusion", 5, now() - Duration::hours(1)),
    ];
    (vitals, symptoms)
}

/// Runs `f` against a fresh local Prometheus recorder and returns the exposition text.
fn render_with(f: impl FnOnce()) -> String {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::with_local_recorder(&recorder, f);
    handle.render()
}

#[test]
fn generation_records_assessments_and_insights() {
    let (vitals, symptoms) = acute_inputs();
    let text = render_with(|| {
        let mut engine = InsightEngine::default();
        engine.generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());
    });

    assert!(
        text.lines().any(|l| l.starts_with("risk_assessments_total{")
            && l.contains(r#"calculator="fall_risk""#)
            && l.contains(r#"level="critical""#)
            && l.ends_with(" 1")),
        "missing fall risk assessment counter\n{text}"
    );
    assert!(
        text.lines().any(|l| l.starts_with("risk_assessments_total{")
            && l.contains(r#"calculator="infection""#)
            && l.contains(r#"level="urgent""#)),
        "missing infection assessment counter\n{text}"
    );
    for needle in [
        r#"insights_generated_total{type="fall_risk"} 1"#,
        r#"insights_generated_total{type="infection_warning"} 1"#,
        "insights_retained",
    ] {
        assert!(text.contains(needle), "exposition missing '{needle}'\n{text}");
    }
}

#[test]
fn dismiss_and_expiry_are_counted() {
    let (vitals, symptoms) = acute_inputs();
    let text = render_with(|| {
        let mut engine = InsightEngine::default();
        let out = engine.generate(&InsightRequest::new(&vitals, &symptoms, &[]), now());
        let positive = out
            .iter()
            .find(|i| i.insight_type == InsightType::PositivePattern)
            .map(|i| i.id.clone())
            .expect("stable vitals celebrated");
        assert!(engine.dismiss(&positive));
        // fall risk (24h) and infection (12h) both lapse
        engine.generate(&InsightRequest::new(&[], &[], &[]), now() + Duration::hours(25));
    });

    assert!(text.contains("insights_dismissed_total 1"), "{text}");
    assert!(text.contains("insights_expired_total 2"), "{text}");
}

#[test]
fn failed_analysis_is_counted() {
    let (vitals, symptoms) = acute_inputs();
    let text = render_with(|| {
        let mut engine = InsightEngine::default().with_burnout_assessor(
            |_now: DateTime<Utc>| -> anyhow::Result<BurnoutAssessment> { Err(anyhow!("offline")) },
        );
        engine.generate(
            &InsightRequest::new(&vitals, &symptoms, &[]).role(UserRole::Caregiver),
            now(),
        );
    });
    assert!(
        text.contains(r#"insight_analysis_failures_total{analysis="caregiver_support"} 1"#),
        "{text}"
    );
}

#[test]
fn compose_records_the_overall_score() {
    let text = render_with(|| {
        wellness::compose(&[], &[], &[], &[], &[], now());
    });
    assert!(text.contains("wellness_score_overall"), "{text}");
}
