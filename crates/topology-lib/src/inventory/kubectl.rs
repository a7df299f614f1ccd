//! Parsing of saved `kubectl get ... -o json` documents

use super::convert::{config_map_entries, name_and_namespace, service_from_api, workload_from_pod};
use super::{ConfigEntry, ConfigKind, ConfigSource, ConfigValue, Inventory};
use crate::error::InventoryError;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_item<T: DeserializeOwned>(item: &Value, kind: &str) -> Option<T> {
    match serde_json::from_value::<T>(item.clone()) {
        Ok(obj) => Some(obj),
        Err(e) => {
            let name = item
                .pointer("/metadata/name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>");
            warn!(kind = %kind, name = %name, error = %e, "Skipping malformed inventory item");
            None
        }
    }
}

/// Secret values stay base64-encoded so each one is decoded (or rejected) on its own
fn raw_secret_entries(item: &Value) -> Vec<ConfigEntry> {
    let meta = item
        .get("metadata")
        .cloned()
        .and_then(|m| serde_json::from_value::<ObjectMeta>(m).ok())
        .unwrap_or_default();
    let (name, namespace) = name_and_namespace(&meta);
    let source = ConfigSource::new(ConfigKind::Secret, name, namespace);

    let mut entries = Vec::new();
    if let Some(data) = item.get("data").and_then(Value::as_object) {
        for (key, value) in data {
            if let Some(encoded) = value.as_str() {
                entries.push(ConfigEntry::new(
                    source.clone(),
                    key.clone(),
                    ConfigValue::Base64(encoded.to_string()),
                ));
            }
        }
    }
    if let Some(data) = item.get("stringData").and_then(Value::as_object) {
        for (key, value) in data {
            if let Some(text) = value.as_str() {
                entries.push(ConfigEntry::new(
                    source.clone(),
                    key.clone(),
                    ConfigValue::Text(text.to_string()),
                ));
            }
        }
    }
    entries
}

impl Inventory {
    /// Build a snapshot from a `kubectl ... -o json` document
    ///
    /// Accepts a `List` of mixed kinds or a single object. Items of other
    /// kinds are ignored and malformed items are skipped; only a document
    /// that is not a JSON object is an error.
    pub fn from_kubectl_json(text: &str) -> Result<Self, InventoryError> {
        let doc: Value = serde_json::from_str(text)?;
        if !doc.is_object() {
            return Err(InventoryError::NotAnObject(json_type_name(&doc)));
        }

        let items: Vec<&Value> = match doc.get("items").and_then(Value::as_array) {
            Some(items) => items.iter().collect(),
            None => vec![&doc],
        };

        let mut inventory = Inventory::captured_now();
        for item in items {
            let kind = item.get("kind").and_then(Value::as_str).unwrap_or("");
            match kind {
                "Pod" => {
                    if let Some(pod) = parse_item::<core::Pod>(item, kind) {
                        inventory.workloads.push(workload_from_pod(&pod));
                    }
                }
                "Service" => {
                    if let Some(svc) = parse_item::<core::Service>(item, kind) {
                        inventory.services.push(service_from_api(&svc));
                    }
                }
                "ConfigMap" => {
                    if let Some(cm) = parse_item::<core::ConfigMap>(item, kind) {
                        inventory.config_entries.extend(config_map_entries(&cm));
                    }
                }
                "Secret" => inventory.config_entries.extend(raw_secret_entries(item)),
                other => debug!(kind = %other, "Ignoring inventory item of unsupported kind"),
            }
        }

        Ok(inventory)
    }
}
