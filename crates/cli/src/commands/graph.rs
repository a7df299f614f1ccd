//! Topology graph command

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use tabled::Tabled;
use topology_lib::{InferenceEngine, InferencePolicy, InventorySource, TopologyGraph, TopologyLogger};
use tracing::warn;

use crate::output::{
    color_sensitive, color_status, emit, print_info, print_warning, table, to_json, truncate,
    OutputFormat,
};
use crate::render::to_dot;

/// Row for services table
#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Type")]
    service_type: String,
    #[tabled(rename = "Ports")]
    ports: String,
}

/// Row for unhealthy workloads table
#[derive(Tabled)]
struct UnhealthyRow {
    #[tabled(rename = "Workload")]
    name: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Row for edges table
#[derive(Tabled)]
struct EdgeRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "Protocol")]
    protocol: String,
}

/// Options for the graph command
pub struct GraphOptions {
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Fetch a snapshot, infer the topology and print it
pub async fn show_graph(
    source: &dyn InventorySource,
    policy: InferencePolicy,
    options: GraphOptions,
) -> Result<()> {
    let logger = TopologyLogger::new(source.describe());
    let inventory = source.snapshot().await?;
    logger.log_inventory_loaded(
        inventory.workloads.len(),
        inventory.services.len(),
        inventory.config_entries.len(),
    );
    if inventory.is_empty() {
        warn!(source = %source.describe(), "Snapshot contains no workloads, services or config stores");
    }

    let engine = InferenceEngine::new(policy).with_logger(logger);
    let graph = engine.infer(&inventory);

    match options.format {
        OutputFormat::Json => emit(&to_json(&graph)?, options.output.as_deref()),
        OutputFormat::Dot => emit(&to_dot(&graph)?, options.output.as_deref()),
        OutputFormat::Table => {
            let text = render_tables(&graph);
            emit(&text, options.output.as_deref())?;
            print_summary(&graph);
            Ok(())
        }
    }
}

fn render_tables(graph: &TopologyGraph) -> String {
    let mut sections = Vec::new();

    let services: Vec<ServiceRow> = graph
        .services
        .iter()
        .map(|s| ServiceRow {
            name: color_sensitive(&s.name, s.sensitive),
            namespace: s.namespace.clone(),
            service_type: s.service_type.clone(),
            ports: s
                .ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();
    sections.push(format!("{}\n{}", "Services".bold(), table(&services)));

    if !graph.edges.is_empty() {
        let edges: Vec<EdgeRow> = graph
            .edges
            .iter()
            .map(|e| EdgeRow {
                source: e.source_key.clone(),
                destination: e.dest_key.clone(),
                ports: format!("{} → {}", e.source_port, e.dest_port),
                protocol: e.protocol.to_string(),
            })
            .collect();
        sections.push(format!("{}\n{}", "Dependencies".bold(), table(&edges)));
    }

    if !graph.unhealthy_workloads.is_empty() {
        let rows: Vec<UnhealthyRow> = graph
            .unhealthy_workloads
            .iter()
            .map(|w| UnhealthyRow {
                name: w.name.clone(),
                namespace: w.namespace.clone(),
                phase: color_status(&w.phase),
                reason: color_status(&w.reason),
                message: truncate(&w.message, 50),
            })
            .collect();
        sections.push(format!("{}\n{}", "Unhealthy workloads".bold(), table(&rows)));
    }

    if !graph.unresolved.is_empty() {
        let lines: Vec<String> = graph
            .unresolved
            .iter()
            .map(|u| format!("  {} -> {} ({})", u.source_key, u.url, u.protocol))
            .collect();
        sections.push(format!("{}\n{}", "Unresolved addresses".bold(), lines.join("\n")));
    }

    sections.join("\n\n")
}

fn print_summary(graph: &TopologyGraph) {
    println!();
    print_info(&format!(
        "{} services, {} dependencies",
        graph.services.len(),
        graph.edges.len()
    ));

    let sensitive = graph.sensitive_services().count();
    if sensitive > 0 {
        print_warning(&format!(
            "{} service(s) classified as authentication-related",
            sensitive
        ));
    }
    if !graph.unhealthy_workloads.is_empty() {
        print_warning(&format!(
            "{} unhealthy workload(s) detected",
            graph.unhealthy_workloads.len()
        ));
    }
}
