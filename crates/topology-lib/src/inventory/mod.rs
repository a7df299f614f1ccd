//! Inventory snapshots
//!
//! A snapshot is the point-in-time listing of workloads, services and
//! configuration stores that inference runs over. This module converts
//! cluster API objects and saved `kubectl` JSON documents into the
//! crate's data model and defines the seam through which snapshots are
//! fetched.

mod convert;
mod kubectl;

#[cfg(test)]
mod tests;

pub use convert::{
    config_map_entries, secret_entries, service_from_api, workload_from_pod,
};

use crate::models::{object_key, Service, Workload};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Point-in-time listing of cluster state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub workloads: Vec<Workload>,
    pub services: Vec<Service>,
    pub config_entries: Vec<ConfigEntry>,
    /// Unix timestamp at which the snapshot was taken
    pub captured_at: i64,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty snapshot stamped with the current time
    pub fn captured_now() -> Self {
        Self {
            captured_at: chrono::Utc::now().timestamp(),
            ..Default::default()
        }
    }

    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workloads.push(workload);
        self
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn with_config_entry(mut self, entry: ConfigEntry) -> Self {
        self.config_entries.push(entry);
        self
    }

    /// Keep only objects in `namespace`
    pub fn retain_namespace(&mut self, namespace: &str) {
        self.workloads.retain(|w| w.namespace == namespace);
        self.services.retain(|s| s.namespace == namespace);
        self.config_entries
            .retain(|e| e.source.namespace == namespace);
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty() && self.services.is_empty() && self.config_entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    ConfigMap,
    Secret,
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::ConfigMap => write!(f, "configmap"),
            ConfigKind::Secret => write!(f, "secret"),
        }
    }
}

/// The key/value store an entry was read from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigSource {
    pub kind: ConfigKind,
    pub name: String,
    pub namespace: String,
}

impl ConfigSource {
    pub fn new(kind: ConfigKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// `kind/name.namespace`, so a store never collides with a workload or
    /// with a store of the other kind
    pub fn key(&self) -> String {
        format!("{}/{}", self.kind, object_key(&self.name, &self.namespace))
    }
}

/// Raw value of a configuration entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "encoding", content = "data")]
pub enum ConfigValue {
    Text(String),
    Base64(String),
    Bytes(Vec<u8>),
}

impl ConfigValue {
    /// Text form of the value, or `None` if it is not decodable text
    pub fn decode(&self) -> Option<Cow<'_, str>> {
        match self {
            ConfigValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            ConfigValue::Base64(encoded) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .ok()?;
                String::from_utf8(bytes).ok().map(Cow::Owned)
            }
            ConfigValue::Bytes(bytes) => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
        }
    }
}

/// One key of a ConfigMap or Secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub source: ConfigSource,
    pub key: String,
    pub value: ConfigValue,
}

impl ConfigEntry {
    pub fn new(source: ConfigSource, key: impl Into<String>, value: ConfigValue) -> Self {
        Self {
            source,
            key: key.into(),
            value,
        }
    }
}

/// Something that can produce an inventory snapshot
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Take a snapshot of the current state
    async fn snapshot(&self) -> anyhow::Result<Inventory>;

    /// Human-readable description of where snapshots come from
    fn describe(&self) -> String;
}
