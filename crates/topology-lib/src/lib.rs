//! Cluster topology inference
//!
//! This crate provides the core functionality for:
//! - Extracting in-cluster service addresses from configuration text
//! - Classifying workload health
//! - Inferring a service dependency graph from an inventory snapshot
//! - Converting cluster API objects and `kubectl` JSON into snapshots

pub mod error;
pub mod extractor;
pub mod health;
pub mod inference;
pub mod inventory;
pub mod models;
pub mod observability;
pub mod policy;

pub use error::InventoryError;
pub use extractor::UrlExtractor;
pub use health::HealthClassifier;
pub use inference::InferenceEngine;
pub use inventory::{
    ConfigEntry, ConfigKind, ConfigSource, ConfigValue, Inventory, InventorySource,
};
pub use models::*;
pub use observability::TopologyLogger;
pub use policy::{InferencePolicy, SensitivityPolicy};
