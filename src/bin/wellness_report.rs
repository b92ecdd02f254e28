//! Wellness report demo: reads one health snapshot (JSON) and prints the full
//! evaluation (wellness score, fall risk, infection warning, insight feed).
//!
//! Usage: `wellness-report <snapshot.json>` or set `WELLNESS_SNAPSHOT_PATH`.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wellness_insights::{
    fall_risk, infection, EngineConfig, FallRiskAssessment, HealthSnapshot, InfectionWarning,
    Insight, InsightEngine, InsightRequest, WellnessComposer, WellnessScore,
};

const ENV_SNAPSHOT_PATH: &str = "WELLNESS_SNAPSHOT_PATH";

#[derive(Serialize)]
struct Report {
    generated_at: chrono::DateTime<Utc>,
    wellness: WellnessScore,
    fall_risk: FallRiskAssessment,
    infection: InfectionWarning,
    insights: Vec<Insight>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wellness_insights=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn snapshot_path() -> Result<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(PathBuf::from(arg));
    }
    std::env::var(ENV_SNAPSHOT_PATH)
        .map(PathBuf::from)
        .map_err(|_| anyhow!("usage: wellness-report <snapshot.json> (or set {ENV_SNAPSHOT_PATH})"))
}

fn main() -> Result<()> {
    // .env is optional; a missing file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = EngineConfig::load_default().context("loading engine config")?;
    let path = snapshot_path()?;
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: HealthSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;

    let now = Utc::now();
    let vitals = snapshot.classify_vitals();

    let wellness = WellnessComposer::new(config.weights).compose(
        &snapshot.medications,
        &snapshot.medication_logs,
        &snapshot.comorbidities,
        &vitals,
        &snapshot.symptoms,
        now,
    );
    let fall_risk = fall_risk::assess(
        &vitals,
        &snapshot.symptoms,
        snapshot.recent_medication_change_count,
        now,
    );
    let infection = infection::assess(&vitals, &snapshot.symptoms, now);

    let mut engine = InsightEngine::new(config);
    let insights = engine.generate(&InsightRequest::from_snapshot(&snapshot, &vitals), now);

    let report = Report {
        generated_at: now,
        wellness,
        fall_risk,
        infection,
        insights,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
