//! Configuration management for the CLI
//!
//! Layers, lowest first: built-in defaults, `~/.config/kubetopo/config.json`,
//! an explicit `--config` file, then `KUBETOPO_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use topology_lib::InferencePolicy;

use crate::output::OutputFormat;

const ENV_PREFIX: &str = "KUBETOPO";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default namespace filter
    #[serde(default)]
    pub default_namespace: Option<String>,
    /// Default output format
    #[serde(default)]
    pub default_format: Option<OutputFormat>,
    /// Inference policy
    #[serde(default)]
    pub policy: InferencePolicy,
}

impl Config {
    /// Load configuration from the default file, an optional override and the environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let default_path = Self::config_path().ok();
        Self::load_from(default_path.as_deref(), override_path, Self::environment())
    }

    /// `KUBETOPO_*` variables, `__` for nesting, comma separated keyword list
    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("policy.sensitivity.keywords")
            .try_parsing(true)
    }

    fn load_from(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = default_path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        if let Some(path) = override_path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(environment);

        builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("kubetopo").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::environment().source(Some(map))
    }

    #[test]
    fn test_missing_default_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(Some(&dir.path().join("absent.json")), None, env(&[])).unwrap();
        assert!(config.default_namespace.is_none());
        assert_eq!(config.policy, InferencePolicy::default());
    }

    #[test]
    fn test_override_file_sets_policy() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "default_namespace": "prod",
                "default_format": "json",
                "policy": {{
                    "default_source_port": 9090,
                    "report_unresolved": true,
                    "sensitivity": {{"keywords": ["SSO"]}}
                }}
            }}"#
        )
        .unwrap();

        let config = Config::load_from(None, Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.default_namespace.as_deref(), Some("prod"));
        assert!(matches!(config.default_format, Some(OutputFormat::Json)));
        assert_eq!(config.policy.default_source_port, 9090);
        assert_eq!(config.policy.default_destination_port, 80);
        assert!(config.policy.report_unresolved);
        assert!(config.policy.sensitivity.is_sensitive("corp-sso"));
        assert!(!config.policy.sensitivity.is_sensitive("keycloak"));
    }

    #[test]
    fn test_missing_override_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(Config::load_from(None, Some(&missing), env(&[])).is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "default_namespace": "staging",
                "policy": {{"default_source_port": 7000, "report_unresolved": true}}
            }}"#
        )
        .unwrap();

        let config = Config::load_from(
            None,
            Some(file.path()),
            env(&[
                ("KUBETOPO_DEFAULT_NAMESPACE", "prod"),
                ("KUBETOPO_POLICY__DEFAULT_SOURCE_PORT", "9090"),
                ("KUBETOPO_POLICY__SENSITIVITY__KEYWORDS", "SSO,vault"),
            ]),
        )
        .unwrap();

        assert_eq!(config.default_namespace.as_deref(), Some("prod"));
        assert_eq!(config.policy.default_source_port, 9090);
        assert!(config.policy.report_unresolved);
        assert_eq!(
            config.policy.sensitivity.keywords(),
            &["sso".to_string(), "vault".to_string()]
        );
        assert!(!config.policy.sensitivity.is_sensitive("keycloak"));
    }
}
