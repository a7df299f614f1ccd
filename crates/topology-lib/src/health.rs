//! Workload health classification
//!
//! Pod-level conditions are checked before container detail: a failed
//! scheduling or readiness condition is the stronger signal. The first
//! failing check decides the reported reason.

use crate::models::{
    ContainerState, HealthRecord, HealthSignal, HealthState, Workload,
};

/// Phase string of a healthy workload
pub const RUNNING_PHASE: &str = "Running";

/// Conditions whose `False` status marks a workload unhealthy, checked in order
pub const BLOCKING_CONDITIONS: &[&str] = &["Ready", "PodScheduled", "ContainersReady"];

const DEFAULT_CONDITION_REASON: &str = "Unknown";
const DEFAULT_WAITING_REASON: &str = "Unknown";
const DEFAULT_TERMINATED_REASON: &str = "Terminated";
const NOT_READY_REASON: &str = "NotReady";

/// Classifies workloads as healthy or unhealthy
#[derive(Debug, Clone)]
pub struct HealthClassifier {
    blocking_conditions: Vec<String>,
}

impl Default for HealthClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthClassifier {
    pub fn new() -> Self {
        Self {
            blocking_conditions: BLOCKING_CONDITIONS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn classify(&self, workload: &Workload) -> HealthRecord {
        let key = workload.key();

        let blocking = workload.conditions.iter().find(|c| {
            c.status == "False" && self.blocking_conditions.iter().any(|t| *t == c.condition_type)
        });
        if let Some(condition) = blocking {
            return unhealthy(
                key,
                &workload.phase,
                condition
                    .reason
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CONDITION_REASON.to_string()),
                condition.message.clone(),
                HealthSignal::Condition(condition.condition_type.clone()),
            );
        }

        if let Some(status) = workload.container_statuses.iter().find(|s| !s.ready) {
            let signal = HealthSignal::Container(status.name.clone());
            let (reason, message) = match &status.state {
                Some(ContainerState::Waiting { reason, message }) => (
                    reason.clone().unwrap_or_else(|| DEFAULT_WAITING_REASON.to_string()),
                    message.clone(),
                ),
                Some(ContainerState::Terminated { reason, message }) => (
                    reason
                        .clone()
                        .unwrap_or_else(|| DEFAULT_TERMINATED_REASON.to_string()),
                    message.clone(),
                ),
                Some(ContainerState::Running) | None => (
                    NOT_READY_REASON.to_string(),
                    Some(format!("container {} is not ready", status.name)),
                ),
            };
            return unhealthy(key, &workload.phase, reason, message, signal);
        }

        if workload.phase == RUNNING_PHASE {
            return HealthRecord {
                workload_key: key,
                phase: workload.phase.clone(),
                state: HealthState::Healthy,
                reason: None,
                message: None,
                signal: None,
            };
        }

        unhealthy(
            key,
            &workload.phase,
            workload.phase.clone(),
            None,
            HealthSignal::Phase,
        )
    }
}

fn unhealthy(
    workload_key: String,
    phase: &str,
    reason: String,
    message: Option<String>,
    signal: HealthSignal,
) -> HealthRecord {
    HealthRecord {
        workload_key,
        phase: phase.to_string(),
        state: HealthState::Unhealthy,
        reason: Some(reason),
        message,
        signal: Some(signal),
    }
}
