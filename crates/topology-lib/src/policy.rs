//! Classification and inference policy
//!
//! Keyword lists and port defaults are injected here instead of being
//! fixed in the engine, so deployments can extend them from configuration.

use serde::{Deserialize, Serialize};

/// Port assumed for a workload whose containers declare none
pub const DEFAULT_SOURCE_PORT: u16 = 8080;

/// Port assumed for an address that carries none
pub const DEFAULT_DESTINATION_PORT: u16 = 80;

/// Name substrings that mark a service as authentication-related
pub const DEFAULT_SENSITIVE_KEYWORDS: &[&str] = &["keycloak", "auth"];

/// Name-based classification of sensitive services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityPolicy {
    #[serde(default = "default_keywords", deserialize_with = "lowercase_keywords")]
    keywords: Vec<String>,
}

fn default_keywords() -> Vec<String> {
    DEFAULT_SENSITIVE_KEYWORDS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn lowercase_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(normalize(raw))
}

fn normalize<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

impl Default for SensitivityPolicy {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
        }
    }
}

impl SensitivityPolicy {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: normalize(keywords),
        }
    }

    /// Policy that never marks anything sensitive
    pub fn none() -> Self {
        Self {
            keywords: Vec::new(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_sensitive(&self, service_name: &str) -> bool {
        let name = service_name.to_lowercase();
        self.keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

/// Knobs for the dependency inference engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferencePolicy {
    #[serde(default)]
    pub sensitivity: SensitivityPolicy,
    #[serde(default = "default_source_port")]
    pub default_source_port: u16,
    #[serde(default = "default_destination_port")]
    pub default_destination_port: u16,
    /// Also scan ConfigMap/Secret values
    #[serde(default = "default_true")]
    pub scan_config_stores: bool,
    /// Keep unresolved addresses in the graph instead of dropping them
    #[serde(default)]
    pub report_unresolved: bool,
}

fn default_source_port() -> u16 {
    DEFAULT_SOURCE_PORT
}

fn default_destination_port() -> u16 {
    DEFAULT_DESTINATION_PORT
}

fn default_true() -> bool {
    true
}

impl Default for InferencePolicy {
    fn default() -> Self {
        Self {
            sensitivity: SensitivityPolicy::default(),
            default_source_port: DEFAULT_SOURCE_PORT,
            default_destination_port: DEFAULT_DESTINATION_PORT,
            scan_config_stores: true,
            report_unresolved: false,
        }
    }
}
