//! Graphviz DOT rendering of a topology graph

use std::fmt::Write;
use topology_lib::TopologyGraph;

const SERVICE_FILL: &str = "#2D2D2D";
const SENSITIVE_FILL: &str = "#4A1500";
const SENSITIVE_STROKE: &str = "#FF8C00";
const UNHEALTHY_FILL: &str = "#8B0000";
const REASON_WIDTH: usize = 50;

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render `graph` as a DOT digraph
pub fn to_dot(graph: &TopologyGraph) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "digraph topology {{")?;
    writeln!(out, "  rankdir=TB;")?;
    writeln!(out, "  bgcolor=\"#121212\";")?;
    writeln!(
        out,
        "  node [shape=box, style=filled, fontname=\"Consolas\", fontsize=10, fontcolor=white];"
    )?;
    writeln!(
        out,
        "  edge [fontname=\"Consolas\", fontsize=8, color=white, fontcolor=white];"
    )?;

    for svc in &graph.services {
        let label = format!("{}\\n({})", escape(&svc.name), escape(&svc.namespace));
        if svc.sensitive {
            writeln!(
                out,
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\", color=\"{}\"];",
                escape(&svc.key),
                label,
                SENSITIVE_FILL,
                SENSITIVE_STROKE
            )?;
        } else {
            writeln!(
                out,
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\"];",
                escape(&svc.key),
                label,
                SERVICE_FILL
            )?;
        }
    }

    for w in &graph.unhealthy_workloads {
        let reason = crate::output::truncate(&w.reason, REASON_WIDTH);
        writeln!(
            out,
            "  \"unhealthy_{}\" [label=\"UNHEALTHY: {}\\n({})\\nStatus: {}\\n{}\", shape=ellipse, fillcolor=\"{}\"];",
            escape(&w.key),
            escape(&w.name),
            escape(&w.namespace),
            escape(&w.phase),
            escape(&reason),
            UNHEALTHY_FILL
        )?;
    }

    for e in &graph.edges {
        writeln!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{} → {}\\n({})\"];",
            escape(&e.source_key),
            escape(&e.dest_key),
            e.source_port,
            e.dest_port,
            e.protocol
        )?;
    }

    writeln!(out, "}}")?;
    Ok(out)
}
