//! Core data models for topology inference

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace assumed when a record does not carry one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Phase assumed when a workload does not report one
pub const UNKNOWN_PHASE: &str = "Unknown";

/// Builds the canonical `name.namespace` lookup key
pub fn object_key(name: &str, namespace: &str) -> String {
    format!("{}.{}", name, namespace)
}

/// A running unit of one or more containers (pod-equivalent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub name: String,
    pub namespace: String,
    /// Name of the owning controller, if any
    pub owner: Option<String>,
    pub phase: String,
    pub conditions: Vec<WorkloadCondition>,
    pub containers: Vec<Container>,
    pub container_statuses: Vec<ContainerStatus>,
}

impl Workload {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            owner: None,
            phase: UNKNOWN_PHASE.to_string(),
            conditions: Vec::new(),
            containers: Vec::new(),
            container_statuses: Vec::new(),
        }
    }

    pub fn key(&self) -> String {
        object_key(&self.name, &self.namespace)
    }
}

/// Workload-level condition as reported by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadCondition {
    pub condition_type: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// A container declared by a workload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    /// Declared container ports, in declaration order
    pub ports: Vec<u16>,
    /// Literal environment values, in declaration order
    pub env: Vec<EnvVar>,
    pub command: Vec<String>,
    pub args: Vec<String>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First declared port, if any
    pub fn primary_port(&self) -> Option<u16> {
        self.ports.first().copied()
    }

    /// Every text value that may carry an embedded service address
    pub fn scannable_values(&self) -> impl Iterator<Item = &str> {
        self.env
            .iter()
            .map(|e| e.value.as_str())
            .chain(self.command.iter().map(String::as_str))
            .chain(self.args.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Runtime status of one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub state: Option<ContainerState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Waiting {
        reason: Option<String>,
        message: Option<String>,
    },
    Terminated {
        reason: Option<String>,
        message: Option<String>,
    },
}

/// A stable named network endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub namespace: String,
    pub service_type: String,
    pub ports: Vec<ServicePort>,
    pub selector: Vec<(String, String)>,
}

impl Service {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            service_type: "ClusterIP".to_string(),
            ports: Vec::new(),
            selector: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.ports.push(ServicePort {
            port,
            target_port: port.to_string(),
            protocol: "TCP".to_string(),
        });
        self
    }

    pub fn key(&self) -> String {
        object_key(&self.name, &self.namespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    pub port: u16,
    /// Numeric or named target port
    pub target_port: String,
    pub protocol: String,
}

/// Application protocol implied by the address scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "HTTP"),
            Protocol::Https => write!(f, "HTTPS"),
        }
    }
}

/// A decoded in-cluster service address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReference {
    pub service: String,
    pub namespace: String,
    pub port: u16,
    pub protocol: Protocol,
    /// The matched substring
    pub url: String,
}

impl ServiceReference {
    pub fn service_key(&self) -> String {
        object_key(&self.service, &self.namespace)
    }
}

/// Source port of an edge; config-store edges have none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourcePort {
    Port(u16),
    NotApplicable,
}

impl fmt::Display for SourcePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcePort::Port(p) => write!(f, "{}", p),
            SourcePort::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Where an edge was inferred from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Workload,
    ConfigMap,
    Secret,
}

/// Inferred directed link from a workload (or config store) to a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub source_key: String,
    pub source_kind: SourceKind,
    pub source_port: SourcePort,
    pub dest_key: String,
    pub dest_port: u16,
    pub protocol: Protocol,
}

/// Identity of an edge: (source, source port, destination, destination port, protocol)
pub type EdgeKey = (String, SourcePort, String, u16, Protocol);

impl DependencyEdge {
    /// Two edges with the same key are the same logical dependency
    pub fn key(&self) -> EdgeKey {
        (
            self.source_key.clone(),
            self.source_port,
            self.dest_key.clone(),
            self.dest_port,
            self.protocol,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
}

/// Which check produced a health verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum HealthSignal {
    Condition(String),
    Container(String),
    Phase,
}

/// Health verdict for one workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub workload_key: String,
    pub phase: String,
    pub state: HealthState,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub signal: Option<HealthSignal>,
}

impl HealthRecord {
    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }
}

/// Service node in the output graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNode {
    pub key: String,
    pub name: String,
    pub namespace: String,
    pub service_type: String,
    pub ports: Vec<u16>,
    pub sensitive: bool,
}

/// Unhealthy workload node in the output graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnhealthyWorkload {
    pub key: String,
    pub name: String,
    pub namespace: String,
    pub owner: Option<String>,
    pub phase: String,
    pub reason: String,
    pub message: String,
}

/// Address that matched the convention but names no known service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedReference {
    pub source_key: String,
    pub url: String,
    pub service_key: String,
    pub port: u16,
    pub protocol: Protocol,
}

/// Inferred cluster topology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyGraph {
    pub captured_at: i64,
    pub services: Vec<ServiceNode>,
    pub unhealthy_workloads: Vec<UnhealthyWorkload>,
    pub edges: Vec<DependencyEdge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<UnresolvedReference>,
}

impl TopologyGraph {
    pub fn service(&self, key: &str) -> Option<&ServiceNode> {
        self.services.iter().find(|s| s.key == key)
    }

    pub fn sensitive_services(&self) -> impl Iterator<Item = &ServiceNode> {
        self.services.iter().filter(|s| s.sensitive)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.unhealthy_workloads.is_empty() && self.edges.is_empty()
    }
}
