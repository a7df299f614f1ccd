//! Dependency inference
//!
//! Turns an inventory snapshot into a topology graph: service nodes,
//! unhealthy-workload nodes, and the edges implied by service addresses
//! found in container specs and configuration stores.
//!
//! Inference is a single synchronous pass over an immutable snapshot.
//! Node and edge order follow snapshot order and first discovery, so the
//! same input always yields the same graph.

mod edges;


pub use edges::{EdgeSet, OrderedSet, ServiceCatalog, UnresolvedSet};

use crate::extractor::UrlExtractor;
use crate::health::HealthClassifier;
use crate::inventory::{ConfigKind, Inventory};
use crate::models::{
    DependencyEdge, HealthRecord, ServiceNode, ServiceReference, SourceKind, SourcePort,
    TopologyGraph, UnhealthyWorkload, UnresolvedReference, Workload,
};
use crate::observability::TopologyLogger;
use crate::policy::InferencePolicy;

/// Builds topology graphs from inventory snapshots
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    policy: InferencePolicy,
    extractor: UrlExtractor,
    classifier: HealthClassifier,
    logger: TopologyLogger,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new(InferencePolicy::default())
    }
}

/// Accumulates graph parts during one run
struct Run<'a> {
    catalog: ServiceCatalog<'a>,
    edges: EdgeSet,
    unresolved: UnresolvedSet,
}

impl InferenceEngine {
    pub fn new(policy: InferencePolicy) -> Self {
        Self {
            extractor: UrlExtractor::with_default_port(policy.default_destination_port),
            classifier: HealthClassifier::new(),
            logger: TopologyLogger::default(),
            policy,
        }
    }

    pub fn with_logger(mut self, logger: TopologyLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Health verdict for every workload, in snapshot order
    pub fn health_records(&self, inventory: &Inventory) -> Vec<HealthRecord> {
        inventory
            .workloads
            .iter()
            .map(|w| self.classifier.classify(w))
            .collect()
    }

    /// Build the topology graph for `inventory`
    pub fn infer(&self, inventory: &Inventory) -> TopologyGraph {
        let (catalog, duplicates) = ServiceCatalog::build(&inventory.services);
        for key in &duplicates {
            self.logger.log_duplicate_service(key);
        }

        let mut run = Run {
            catalog,
            edges: EdgeSet::new(),
            unresolved: UnresolvedSet::new(),
        };

        for workload in &inventory.workloads {
            self.scan_workload(workload, &mut run);
        }

        if self.policy.scan_config_stores {
            self.scan_config_stores(inventory, &mut run);
        }

        let services = run
            .catalog
            .iter()
            .map(|s| ServiceNode {
                key: s.key(),
                name: s.name.clone(),
                namespace: s.namespace.clone(),
                service_type: s.service_type.clone(),
                ports: s.ports.iter().map(|p| p.port).collect(),
                sensitive: self.policy.sensitivity.is_sensitive(&s.name),
            })
            .collect();

        let unhealthy_workloads = inventory
            .workloads
            .iter()
            .filter_map(|w| {
                let record = self.classifier.classify(w);
                if record.is_healthy() {
                    return None;
                }
                self.logger.log_unhealthy_workload(&record);
                Some(unhealthy_node(w, record))
            })
            .collect();

        let graph = TopologyGraph {
            captured_at: inventory.captured_at,
            services,
            unhealthy_workloads,
            edges: run.edges.into_vec(),
            unresolved: run.unresolved.into_vec(),
        };
        self.logger.log_graph_built(&graph);
        graph
    }

    fn scan_workload(&self, workload: &Workload, run: &mut Run<'_>) {
        let source_key = workload.key();
        for container in &workload.containers {
            let source_port = SourcePort::Port(
                container
                    .primary_port()
                    .unwrap_or(self.policy.default_source_port),
            );
            for value in container.scannable_values() {
                for reference in self.extractor.extract(value) {
                    self.record(
                        &source_key,
                        SourceKind::Workload,
                        source_port,
                        reference,
                        run,
                    );
                }
            }
        }
    }

    fn scan_config_stores(&self, inventory: &Inventory, run: &mut Run<'_>) {
        for entry in &inventory.config_entries {
            let source_key = entry.source.key();
            let Some(text) = entry.value.decode() else {
                self.logger.log_undecodable_value(&source_key, &entry.key);
                continue;
            };
            let kind = match entry.source.kind {
                ConfigKind::ConfigMap => SourceKind::ConfigMap,
                ConfigKind::Secret => SourceKind::Secret,
            };
            for reference in self.extractor.extract(&text) {
                self.record(&source_key, kind, SourcePort::NotApplicable, reference, run);
            }
        }
    }

    fn record(
        &self,
        source_key: &str,
        source_kind: SourceKind,
        source_port: SourcePort,
        reference: ServiceReference,
        run: &mut Run<'_>,
    ) {
        let dest_key = reference.service_key();
        if !run.catalog.contains(&dest_key) {
            self.logger.log_unresolved_reference(source_key, &reference);
            if self.policy.report_unresolved {
                run.unresolved.insert(UnresolvedReference {
                    source_key: source_key.to_string(),
                    url: reference.url,
                    service_key: dest_key,
                    port: reference.port,
                    protocol: reference.protocol,
                });
            }
            return;
        }

        run.edges.insert_edge(DependencyEdge {
            source_key: source_key.to_string(),
            source_kind,
            source_port,
            dest_key,
            dest_port: reference.port,
            protocol: reference.protocol,
        });
    }
}

fn unhealthy_node(workload: &Workload, record: HealthRecord) -> UnhealthyWorkload {
    UnhealthyWorkload {
        key: record.workload_key,
        name: workload.name.clone(),
        namespace: workload.namespace.clone(),
        owner: workload.owner.clone(),
        phase: record.phase,
        reason: record.reason.unwrap_or_default(),
        message: record.message.unwrap_or_default(),
    }
}
