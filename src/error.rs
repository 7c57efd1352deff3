//! Error types and result aliases

use thiserror::Error;

/// Errors surfaced by the harvester, its browser driver and the schema layer.
///
/// Per-tile problems during a harvest (a failed extraction, an extraction with
/// no rows) never show up here: the harvest loop absorbs them and moves on.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("No browsing session named '{0}'")]
    SessionNotFound(String),

    /// The schema cannot produce every field the harvester maps into a product.
    #[error("Extraction schema is missing fields: {}", .missing.join(", "))]
    SchemaIncomplete { missing: Vec<String> },

    #[error("Invalid extraction schema: {0}")]
    InvalidSchema(String),

    #[error("Schema generation failed: {0}")]
    SchemaGenerationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
