use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Broad category of a generation failure, used by transports to pick a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Well-formed input the engine cannot honour (caller's fault)
    DomainValidation,
    /// Registry has no data for a valid version (deployment defect)
    DataAvailability,
    /// An invariant upstream validation should have guaranteed was broken
    AssemblyInvariant,
}

/// Errors raised while assembling a cluster document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Invalid vendor: {vendor}. Valid vendors: {}", valid.join(", "))]
    UnsupportedVendor { vendor: String, valid: Vec<String> },

    #[error("Unsupported version '{version}'. Supported versions: {}", supported.join(", "))]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    #[error("Image content sources not found for version {version} ({location})")]
    MissingVersionData { version: String, location: String },

    #[error("Invalid replica count {replicas} for vendor '{vendor}': at least 1 is required")]
    InvalidReplicaCount { vendor: String, replicas: u32 },

    #[error("Failed to render cluster document: {0}")]
    Serialization(String),
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::UnsupportedVendor { .. } | GenerationError::UnsupportedVersion { .. } => {
                ErrorKind::DomainValidation
            }
            GenerationError::MissingVersionData { .. } => ErrorKind::DataAvailability,
            GenerationError::InvalidReplicaCount { .. } | GenerationError::Serialization(_) => {
                ErrorKind::AssemblyInvariant
            }
        }
    }

    /// Structured detail for error responses
    pub fn details(&self) -> Value {
        match self {
            GenerationError::UnsupportedVendor { vendor, valid } => json!({
                "vendor": vendor,
                "valid_vendors": valid,
            }),
            GenerationError::UnsupportedVersion { version, supported } => json!({
                "version": version,
                "supported_versions": supported,
            }),
            GenerationError::MissingVersionData { version, location } => json!({
                "version": version,
                "location": location,
            }),
            GenerationError::InvalidReplicaCount { vendor, replicas } => json!({
                "vendor": vendor,
                "replicas": replicas,
            }),
            GenerationError::Serialization(message) => json!({ "message": message }),
        }
    }
}
