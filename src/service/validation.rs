//! Input-shape validation for incoming requests
//!
//! SBIO pattern: pure checks over request data. Vendor membership is left to
//! the engine so the unsupported-vendor error keeps its own category.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;

use super::models::{ClusterRequest, VendorConfigRequest};
use crate::engine::{MaxPods, OcpVersion};

pub const CLUSTER_NAME_MAX_LEN: usize = 63;
pub const MIN_NODES: u32 = 1;
pub const MAX_NODES: u32 = 100;

/// Errors in the shape of a request, before any generation happens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Invalid cluster name '{name}': {reason}")]
    InvalidClusterName { name: String, reason: String },

    #[error("Invalid site '{0}': use only letters, digits, '_' or '-'")]
    InvalidSite(String),

    #[error("At least one vendor configuration is required")]
    NoVendors,

    #[error("Invalid node count {nodes} for vendor '{vendor}': must be between {MIN_NODES} and {MAX_NODES}")]
    InvalidNodeCount { vendor: String, nodes: u32 },

    #[error("Infrastructure environment name for vendor '{0}' must not be empty")]
    EmptyInfraEnv(String),

    #[error("Unsupported OCP version '{version}'. Supported versions: {}", supported.join(", "))]
    InvalidVersion {
        version: String,
        supported: Vec<String>,
    },

    #[error("Unsupported max_pods {0}. Supported values: 250, 500")]
    InvalidMaxPods(u32),

    #[error("DNS domain must not be empty")]
    EmptyDnsDomain,

    #[error("Malformed request body: {0}")]
    Malformed(String),
}

impl InputError {
    /// Structured detail for error responses
    pub fn details(&self) -> Value {
        match self {
            InputError::InvalidClusterName { name, reason } => {
                json!({ "field": "cluster_name", "value": name, "reason": reason })
            }
            InputError::InvalidSite(site) => json!({ "field": "site", "value": site }),
            InputError::NoVendors => json!({ "field": "vendor_configs" }),
            InputError::InvalidNodeCount { vendor, nodes } => json!({
                "field": "number_of_nodes",
                "vendor": vendor,
                "value": nodes,
                "min": MIN_NODES,
                "max": MAX_NODES,
            }),
            InputError::EmptyInfraEnv(vendor) => {
                json!({ "field": "infra_env_name", "vendor": vendor })
            }
            InputError::InvalidVersion { version, supported } => json!({
                "field": "ocp_version",
                "value": version,
                "supported_versions": supported,
            }),
            InputError::InvalidMaxPods(value) => json!({
                "field": "max_pods",
                "value": value,
                "supported_values": MaxPods::ALL.iter().map(|m| m.value()).collect::<Vec<_>>(),
            }),
            InputError::EmptyDnsDomain => json!({ "field": "dns_domain" }),
            InputError::Malformed(message) => json!({ "message": message }),
        }
    }
}

fn cluster_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("cluster name pattern is valid")
    })
}

fn site_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]+$").expect("site pattern is valid")
    })
}

// ============================================================================
// Field checks
// ============================================================================

/// Kubernetes-style DNS label: lowercase alphanumerics and inner hyphens
pub fn validate_cluster_name(name: &str) -> Result<(), InputError> {
    let invalid = |reason: &str| InputError::InvalidClusterName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > CLUSTER_NAME_MAX_LEN {
        return Err(invalid("must be 63 characters or less"));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("cannot start or end with a hyphen"));
    }
    if !cluster_name_pattern().is_match(name) {
        return Err(invalid(
            "must contain only lowercase letters, digits and hyphens",
        ));
    }
    Ok(())
}

/// Letters, digits, `_` and `-`; sites become branch names and path segments
pub fn validate_site(site: &str) -> Result<(), InputError> {
    if !site_pattern().is_match(site) {
        return Err(InputError::InvalidSite(site.to_string()));
    }
    Ok(())
}

pub fn validate_vendor_config(vc: &VendorConfigRequest) -> Result<(), InputError> {
    if !(MIN_NODES..=MAX_NODES).contains(&vc.number_of_nodes) {
        return Err(InputError::InvalidNodeCount {
            vendor: vc.vendor.clone(),
            nodes: vc.number_of_nodes,
        });
    }
    if vc.infra_env_name.trim().is_empty() {
        return Err(InputError::EmptyInfraEnv(vc.vendor.clone()));
    }
    Ok(())
}

pub fn parse_version(version: &str) -> Result<OcpVersion, InputError> {
    OcpVersion::parse(version).map_err(|_| InputError::InvalidVersion {
        version: version.to_string(),
        supported: OcpVersion::ALL.iter().map(|v| v.to_string()).collect(),
    })
}

pub fn parse_max_pods(value: u32) -> Result<MaxPods, InputError> {
    MaxPods::try_from(value).map_err(|_| InputError::InvalidMaxPods(value))
}

/// Check every shape rule on a request, first failure wins
pub fn validate_request(request: &ClusterRequest) -> Result<(), InputError> {
    validate_cluster_name(&request.cluster_name)?;
    validate_site(&request.site)?;

    if request.vendor_configs.is_empty() {
        return Err(InputError::NoVendors);
    }
    for vc in &request.vendor_configs {
        validate_vendor_config(vc)?;
    }

    if let Some(version) = &request.ocp_version {
        parse_version(version)?;
    }
    if let Some(max_pods) = request.max_pods {
        parse_max_pods(max_pods)?;
    }
    if let Some(domain) = &request.dns_domain {
        if domain.trim().is_empty() {
            return Err(InputError::EmptyDnsDomain);
        }
    }
    Ok(())
}
