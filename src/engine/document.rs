//! YAML rendering of the cluster document
//!
//! Key order is the struct declaration order. Replica bounds stay quoted
//! strings and nothing is a float, so output is stable byte for byte.

use thiserror::Error;

use super::model::ClusterConfig;

#[derive(Error, Debug)]
#[error("Invalid cluster document: {0}")]
pub struct DocumentError(String);

/// Render a document as YAML text
pub fn to_document(config: &ClusterConfig) -> Result<String, DocumentError> {
    serde_yaml::to_string(config).map_err(|e| DocumentError(e.to_string()))
}

/// Parse YAML text back into a document
pub fn from_document(text: &str) -> Result<ClusterConfig, DocumentError> {
    serde_yaml::from_str(text).map_err(|e| DocumentError(e.to_string()))
}
