//! Conversion from cluster API objects
//!
//! Records from the cluster are occasionally incomplete; missing fields
//! fall back to documented defaults instead of failing the record.

use super::{ConfigEntry, ConfigKind, ConfigSource, ConfigValue};
use crate::models::{
    Container, ContainerState, ContainerStatus, EnvVar, Service, ServicePort, Workload,
    WorkloadCondition, DEFAULT_NAMESPACE, UNKNOWN_PHASE,
};
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tracing::debug;

const UNKNOWN_NAME: &str = "unknown";
const DEFAULT_SERVICE_TYPE: &str = "ClusterIP";
const DEFAULT_PORT_PROTOCOL: &str = "TCP";

pub(crate) fn name_and_namespace(meta: &ObjectMeta) -> (String, String) {
    (
        meta.name.clone().unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        meta.namespace
            .clone()
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
    )
}

fn port_from_i32(port: i32) -> Option<u16> {
    u16::try_from(port).ok().filter(|p| *p != 0)
}

/// Convert a Pod into a workload
pub fn workload_from_pod(pod: &core::Pod) -> Workload {
    let (name, namespace) = name_and_namespace(&pod.metadata);
    let mut workload = Workload::new(name, namespace);

    workload.owner = pod
        .metadata
        .owner_references
        .as_ref()
        .and_then(|refs| refs.first())
        .map(|r| r.name.clone());

    if let Some(spec) = &pod.spec {
        workload.containers = spec.containers.iter().map(container_from_api).collect();
    }

    if let Some(status) = &pod.status {
        workload.phase = status
            .phase
            .clone()
            .unwrap_or_else(|| UNKNOWN_PHASE.to_string());
        workload.conditions = status
            .conditions
            .iter()
            .flatten()
            .map(|c| WorkloadCondition {
                condition_type: c.type_.clone(),
                status: c.status.clone(),
                reason: c.reason.clone(),
                message: c.message.clone(),
            })
            .collect();
        workload.container_statuses = status
            .container_statuses
            .iter()
            .flatten()
            .map(container_status_from_api)
            .collect();
    }

    workload
}

fn container_from_api(c: &core::Container) -> Container {
    let ports = c
        .ports
        .iter()
        .flatten()
        .filter_map(|p| {
            let port = port_from_i32(p.container_port);
            if port.is_none() {
                debug!(container = %c.name, port = p.container_port, "Ignoring invalid container port");
            }
            port
        })
        .collect();

    // valueFrom references carry no literal text to scan
    let env = c
        .env
        .iter()
        .flatten()
        .filter_map(|e| e.value.as_ref().map(|v| EnvVar::new(e.name.clone(), v.clone())))
        .collect();

    Container {
        name: c.name.clone(),
        ports,
        env,
        command: c.command.clone().unwrap_or_default(),
        args: c.args.clone().unwrap_or_default(),
    }
}

fn container_status_from_api(s: &core::ContainerStatus) -> ContainerStatus {
    let state = s.state.as_ref().and_then(|state| {
        if let Some(w) = &state.waiting {
            Some(ContainerState::Waiting {
                reason: w.reason.clone(),
                message: w.message.clone(),
            })
        } else if let Some(t) = &state.terminated {
            Some(ContainerState::Terminated {
                reason: t.reason.clone(),
                message: t.message.clone(),
            })
        } else {
            state.running.as_ref().map(|_| ContainerState::Running)
        }
    });

    ContainerStatus {
        name: s.name.clone(),
        ready: s.ready,
        state,
    }
}

/// Convert a Service object
pub fn service_from_api(svc: &core::Service) -> Service {
    let (name, namespace) = name_and_namespace(&svc.metadata);
    let mut service = Service::new(name, namespace);

    if let Some(spec) = &svc.spec {
        service.service_type = spec
            .type_
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_string());
        service.ports = spec
            .ports
            .iter()
            .flatten()
            .filter_map(|p| {
                let port = port_from_i32(p.port)?;
                let target_port = match &p.target_port {
                    Some(IntOrString::Int(n)) => n.to_string(),
                    Some(IntOrString::String(s)) => s.clone(),
                    None => port.to_string(),
                };
                Some(ServicePort {
                    port,
                    target_port,
                    protocol: p
                        .protocol
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PORT_PROTOCOL.to_string()),
                })
            })
            .collect();
        service.selector = spec
            .selector
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
    } else {
        service.service_type = DEFAULT_SERVICE_TYPE.to_string();
    }

    service
}

/// Entries of a ConfigMap; binary data is kept as raw bytes
pub fn config_map_entries(cm: &core::ConfigMap) -> Vec<ConfigEntry> {
    let (name, namespace) = name_and_namespace(&cm.metadata);
    let source = ConfigSource::new(ConfigKind::ConfigMap, name, namespace);

    let text = cm
        .data
        .iter()
        .flatten()
        .map(|(k, v)| ConfigEntry::new(source.clone(), k.clone(), ConfigValue::Text(v.clone())));
    let binary = cm.binary_data.iter().flatten().map(|(k, v)| {
        ConfigEntry::new(source.clone(), k.clone(), ConfigValue::Bytes(v.0.clone()))
    });

    text.chain(binary).collect()
}

/// Entries of a Secret as returned by the API (already base64-decoded)
pub fn secret_entries(secret: &core::Secret) -> Vec<ConfigEntry> {
    let (name, namespace) = name_and_namespace(&secret.metadata);
    let source = ConfigSource::new(ConfigKind::Secret, name, namespace);

    let data = secret.data.iter().flatten().map(|(k, v)| {
        ConfigEntry::new(source.clone(), k.clone(), ConfigValue::Bytes(v.0.clone()))
    });
    let string_data = secret
        .string_data
        .iter()
        .flatten()
        .map(|(k, v)| ConfigEntry::new(source.clone(), k.clone(), ConfigValue::Text(v.clone())));

    data.chain(string_data).collect()
}
