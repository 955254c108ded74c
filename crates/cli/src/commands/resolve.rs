use envlink_config::Config;
use envlink_core::{EntryOutcome, EntryStatus, Materialization, PassStatus, ResolutionReport};
use envlink_env::Engine;
use serde_json::{json, Value};

pub async fn execute(config: &Config, json: bool) -> eyre::Result<()> {
    let engine = Engine::from_config(config)?;
    let report = engine.resolve().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
    } else {
        print!("{}", report_text(&report));
    }
    Ok(())
}

/// Machine readable report. Inline values are never included.
fn report_json(report: &ResolutionReport) -> Value {
    let status = match report.status() {
        PassStatus::Skipped => json!({"state": "skipped"}),
        PassStatus::Complete => json!({"state": "complete"}),
        PassStatus::Partial { failed } => json!({"state": "partial", "failed": failed}),
    };

    json!({
        "profile": report.profile,
        "status": status,
        "elapsed_ms": u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
        "entries": report.outcomes.iter().map(outcome_json).collect::<Vec<_>>(),
    })
}

fn outcome_json(outcome: &EntryOutcome) -> Value {
    match &outcome.status {
        EntryStatus::Passthrough => json!({
            "variable": outcome.variable,
            "outcome": "passthrough",
        }),
        EntryStatus::Resolved(result) => {
            let mut entry = json!({
                "variable": outcome.variable,
                "outcome": "resolved",
                "materialization": result.materialization(),
            });
            if result.materialization() == Materialization::TempFile {
                entry["path"] = json!(result.value());
            }
            entry
        }
        EntryStatus::Failed { stage, error } => json!({
            "variable": outcome.variable,
            "outcome": "failed",
            "stage": stage,
            "error": error.to_string(),
        }),
    }
}

fn report_text(report: &ResolutionReport) -> String {
    let mut out = String::new();
    match report.status() {
        PassStatus::Skipped => {
            out.push_str("runtime: unknown, nothing resolved\n");
            return out;
        }
        PassStatus::Complete => {
            out.push_str(&format!("runtime: {} (complete)\n", report.profile));
        }
        PassStatus::Partial { failed } => {
            out.push_str(&format!(
                "runtime: {} ({failed} failed)\n",
                report.profile
            ));
        }
    }

    for outcome in &report.outcomes {
        let line = match &outcome.status {
            EntryStatus::Passthrough => "passthrough".to_string(),
            EntryStatus::Resolved(result) => match result.materialization() {
                Materialization::Inline => "resolved".to_string(),
                Materialization::TempFile => {
                    format!("resolved -> {}", result.value())
                }
            },
            EntryStatus::Failed { stage, error } => format!("failed at {stage}: {error}"),
        };
        out.push_str(&format!("  {}: {line}\n", outcome.variable));
    }
    out
}
