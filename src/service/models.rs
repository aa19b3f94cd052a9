//! Request and response records shared by the HTTP and CLI layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gitops::PublishOutcome;

// ============================================================================
// Requests
// ============================================================================

/// One vendor entry as supplied by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConfigRequest {
    pub vendor: String,
    pub number_of_nodes: u32,
    pub infra_env_name: String,
}

impl VendorConfigRequest {
    pub fn new(
        vendor: impl Into<String>,
        number_of_nodes: u32,
        infra_env_name: impl Into<String>,
    ) -> Self {
        Self {
            vendor: vendor.into(),
            number_of_nodes,
            infra_env_name: infra_env_name.into(),
        }
    }
}

/// Fields common to generate and preview requests.
/// Unset optional fields take the configured defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub cluster_name: String,
    pub site: String,
    pub vendor_configs: Vec<VendorConfigRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocp_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pods: Option<u32>,
    #[serde(default)]
    pub include_var_lib_containers: bool,
    #[serde(default)]
    pub include_ringsize: bool,
    #[serde(default)]
    pub custom_configs: Vec<String>,
}

impl ClusterRequest {
    pub fn new(
        cluster_name: impl Into<String>,
        site: impl Into<String>,
        vendor_configs: Vec<VendorConfigRequest>,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            site: site.into(),
            vendor_configs,
            ocp_version: None,
            dns_domain: None,
            max_pods: None,
            include_var_lib_containers: false,
            include_ringsize: false,
            custom_configs: Vec::new(),
        }
    }
}

/// Generate request: the cluster fields plus an opt-in GitOps commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateClusterRequest {
    #[serde(flatten)]
    pub cluster: ClusterRequest,
    #[serde(default)]
    pub commit: bool,
}

/// Body of `POST /flavors/{name}/generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorGenerateRequest {
    pub cluster_name: String,
    pub site: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_domain: Option<String>,
    #[serde(default)]
    pub commit: bool,
}

// ============================================================================
// Catalogue responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorInfo {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub is_default: bool,
}

/// A machine config a caller may switch on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigInfo {
    pub key: String,
    pub name: String,
    pub description: String,
    pub is_optional: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsResponse {
    pub vendors: Vec<VendorInfo>,
    pub versions: Vec<VersionInfo>,
    pub default_configs: Vec<String>,
    pub optional_configs: Vec<ConfigInfo>,
    pub max_pods_options: Vec<u32>,
    pub default_dns_domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorsResponse {
    pub vendors: Vec<VendorInfo>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionsResponse {
    pub versions: Vec<String>,
    pub default: String,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitesResponse {
    pub sites: Vec<String>,
    pub total: usize,
}

// ============================================================================
// Generation responses
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateClusterResponse {
    pub cluster_name: String,
    pub yaml_content: String,
    pub vendors_used: Vec<String>,
    pub ocp_version: String,
    pub nodepool_count: usize,
    pub generated_at: DateTime<Utc>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<PublishOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewClusterResponse {
    pub cluster_name: String,
    pub yaml_content: String,
    pub vendors_used: Vec<String>,
    pub ocp_version: String,
    pub nodepool_count: usize,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Misc
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<Value>) -> Self {
        Self {
            error: error.into(),
            details,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let json = r#"{
            "cluster_name": "c1",
            "site": "dc1",
            "vendor_configs": [
                {"vendor": "dell", "number_of_nodes": 3, "infra_env_name": "dell-env"}
            ]
        }"#;
        let req: GenerateClusterRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.cluster.cluster_name, "c1");
        assert_eq!(req.cluster.vendor_configs.len(), 1);
        assert!(req.cluster.ocp_version.is_none());
        assert!(req.cluster.max_pods.is_none());
        assert!(!req.cluster.include_ringsize);
        assert!(req.cluster.custom_configs.is_empty());
        assert!(!req.commit);
    }

    #[test]
    fn test_generate_request_flattens_cluster_fields() {
        let json = r#"{
            "cluster_name": "c1",
            "site": "dc1",
            "vendor_configs": [],
            "max_pods": 500,
            "commit": true
        }"#;
        let req: GenerateClusterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.cluster.max_pods, Some(500));
        assert!(req.commit);
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let json = r#"{"cluster_name": "c1", "vendor_configs": []}"#;
        assert!(serde_json::from_str::<ClusterRequest>(json).is_err());
    }

    #[test]
    fn test_error_response_omits_empty_details() {
        let body = serde_json::to_value(ErrorResponse::new("boom", None)).unwrap();
        assert_eq!(body["error"], "boom");
        assert!(body.get("details").is_none());
        assert!(body.get("timestamp").is_some());
    }
}
