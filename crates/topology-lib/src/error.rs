//! Error types for snapshot ingestion
//!
//! The inference core itself has no failure modes; only reading a
//! snapshot document can fail outright.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot document must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}
