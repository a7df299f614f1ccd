//! Workload health command

use anyhow::Result;
use tabled::Tabled;
use topology_lib::{HealthRecord, HealthSignal, InferenceEngine, InventorySource};

use crate::output::{color_status, print_success, table, to_json, truncate, OutputFormat};

/// Row for health table
#[derive(Tabled)]
struct HealthRow {
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Signal")]
    signal: String,
    #[tabled(rename = "Message")]
    message: String,
}

fn describe_signal(signal: Option<&HealthSignal>) -> String {
    match signal {
        Some(HealthSignal::Condition(c)) => format!("condition {}", c),
        Some(HealthSignal::Container(c)) => format!("container {}", c),
        Some(HealthSignal::Phase) => "phase".to_string(),
        None => "-".to_string(),
    }
}

/// Show health records, unhealthy only unless `all` is set
pub async fn show_health(
    source: &dyn InventorySource,
    engine: &InferenceEngine,
    all: bool,
    format: OutputFormat,
) -> Result<()> {
    let inventory = source.snapshot().await?;
    let records: Vec<HealthRecord> = engine
        .health_records(&inventory)
        .into_iter()
        .filter(|r| all || !r.is_healthy())
        .collect();

    match format {
        OutputFormat::Json => println!("{}", to_json(&records)?),
        OutputFormat::Table | OutputFormat::Dot => {
            if records.is_empty() {
                print_success("All workloads are healthy");
                return Ok(());
            }
            let rows: Vec<HealthRow> = records
                .iter()
                .map(|r| HealthRow {
                    workload: r.workload_key.clone(),
                    phase: color_status(&r.phase),
                    state: if r.is_healthy() {
                        color_status("healthy")
                    } else {
                        color_status("unhealthy")
                    },
                    reason: r.reason.as_deref().map(color_status).unwrap_or_default(),
                    signal: describe_signal(r.signal.as_ref()),
                    message: truncate(r.message.as_deref().unwrap_or(""), 60),
                })
                .collect();
            println!("{}", table(&rows));
            println!("\nTotal: {} workloads", records.len());
        }
    }

    Ok(())
}
