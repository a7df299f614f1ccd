//! Structured logging for topology runs
//!
//! Every significant step of a run is emitted as a `tracing` event with
//! an `event` field so JSON log output can be filtered by name.

use crate::models::{HealthRecord, ServiceReference, TopologyGraph};
use tracing::{debug, info, warn};

/// Structured logger for inference events
#[derive(Debug, Clone)]
pub struct TopologyLogger {
    source: String,
}

impl TopologyLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Log a freshly loaded snapshot
    pub fn log_inventory_loaded(&self, workloads: usize, services: usize, config_entries: usize) {
        info!(
            event = "inventory_loaded",
            source = %self.source,
            workloads = workloads,
            services = services,
            config_entries = config_entries,
            "Inventory snapshot loaded"
        );
    }

    /// Log the summary of a finished graph
    pub fn log_graph_built(&self, graph: &TopologyGraph) {
        info!(
            event = "graph_built",
            source = %self.source,
            services = graph.services.len(),
            sensitive_services = graph.sensitive_services().count(),
            unhealthy_workloads = graph.unhealthy_workloads.len(),
            edges = graph.edges.len(),
            unresolved = graph.unresolved.len(),
            "Topology graph built"
        );
    }

    pub fn log_unresolved_reference(&self, source_key: &str, reference: &ServiceReference) {
        debug!(
            event = "reference_unresolved",
            source = %self.source,
            source_key = %source_key,
            url = %reference.url,
            service_key = %reference.service_key(),
            "Address names no known service"
        );
    }

    pub fn log_undecodable_value(&self, config_key: &str, entry_key: &str) {
        debug!(
            event = "config_value_undecodable",
            source = %self.source,
            config = %config_key,
            key = %entry_key,
            "Skipping configuration value that is not text"
        );
    }

    pub fn log_unhealthy_workload(&self, record: &HealthRecord) {
        info!(
            event = "workload_unhealthy",
            source = %self.source,
            workload = %record.workload_key,
            phase = %record.phase,
            reason = record.reason.as_deref().unwrap_or(""),
            "Unhealthy workload"
        );
    }

    pub fn log_duplicate_service(&self, service_key: &str) {
        warn!(
            event = "duplicate_service",
            source = %self.source,
            service = %service_key,
            "Service key seen twice, keeping the first"
        );
    }
}

impl Default for TopologyLogger {
    fn default() -> Self {
        Self::new("snapshot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let logger = TopologyLogger::new("cluster:prod");
        assert_eq!(logger.source(), "cluster:prod");
        logger.log_inventory_loaded(1, 2, 3);
        logger.log_graph_built(&TopologyGraph::default());
    }
}
