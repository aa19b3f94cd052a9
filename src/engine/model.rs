//! Input record and the generated cluster document
//!
//! The document types serialize in declaration order, which is the order the
//! downstream GitOps tooling diffs against. Do not reorder fields.

use serde::{Deserialize, Serialize};

use super::registry::{ImageContentSource, MaxPods, OcpVersion};

/// Default zone written to `dns.zone` when the caller supplies none
pub const DEFAULT_DNS_DOMAIN: &str = "example.company.com";

/// Fixed platform for every generated cluster
pub const PLATFORM: &str = "agent";

/// Fixed host inventory name
pub const HOST_INVENTORY: &str = "inventory";

/// Label key used to select agents for a nodepool
pub const AGENT_LABEL_KEY: &str = "infraenv";

/// One requested hardware vendor and its node count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConfig {
    pub vendor: String,
    pub number_of_nodes: u32,
    pub infra_env_name: String,
}

impl VendorConfig {
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

/// Validated input for a single generation
///
/// Shape validation (name pattern, ranges) happens before this record is
/// built; the engine only re-checks vendor membership and replica bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterGenerationInput {
    pub cluster_name: String,
    pub site: String,
    /// Order is significant: nodepools and nm-conf entries follow it.
    pub vendor_configs: Vec<VendorConfig>,
    pub ocp_version: OcpVersion,
    pub dns_domain: String,
    pub max_pods: MaxPods,
    pub include_var_lib_containers: bool,
    pub include_ringsize: bool,
    pub custom_configs: Vec<String>,
}

impl ClusterGenerationInput {
    /// Create an input with every optional field at its default
    pub fn new(
        cluster_name: impl Into<String>,
        site: impl Into<String>,
        vendor_configs: Vec<VendorConfig>,
        ocp_version: OcpVersion,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            site: site.into(),
            vendor_configs,
            ocp_version,
            dns_domain: DEFAULT_DNS_DOMAIN.to_string(),
            max_pods: MaxPods::default(),
            include_var_lib_containers: false,
            include_ringsize: false,
            custom_configs: Vec::new(),
        }
    }

    pub fn with_max_pods(mut self, max_pods: MaxPods) -> Self {
        self.max_pods = max_pods;
        self
    }

    pub fn with_dns_domain(mut self, dns_domain: impl Into<String>) -> Self {
        self.dns_domain = dns_domain.into();
        self
    }

    pub fn with_var_lib_containers(mut self, include: bool) -> Self {
        self.include_var_lib_containers = include;
        self
    }

    pub fn with_ringsize(mut self, include: bool) -> Self {
        self.include_ringsize = include;
        self
    }

    pub fn with_custom_configs(mut self, configs: Vec<String>) -> Self {
        self.custom_configs = configs;
        self
    }

    /// Vendor ids in input order (duplicates kept)
    pub fn vendors(&self) -> Vec<&str> {
        self.vendor_configs.iter().map(|vc| vc.vendor.as_str()).collect()
    }
}

/// Replica bounds, emitted as strings as the nodepool schema requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePoolLabels {
    #[serde(rename = "minReplicas")]
    pub min_replicas: String,
    #[serde(rename = "maxReplicas")]
    pub max_replicas: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentLabelSelector {
    #[serde(rename = "nodeLabelKey")]
    pub node_label_key: String,
    #[serde(rename = "nodeLabelValue")]
    pub node_label_value: String,
}

/// Reference to a machine config by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRef {
    pub name: String,
}

impl ConfigRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePool {
    pub name: String,
    pub replicas: u32,
    pub labels: NodePoolLabels,
    #[serde(rename = "agentLabelSelector")]
    pub agent_label_selector: AgentLabelSelector,
    pub config: Vec<ConfigRef>,
}

impl NodePool {
    /// Names of the attached machine configs, in order
    pub fn config_names(&self) -> Vec<&str> {
        self.config.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfig {
    pub site: String,
    pub zone: String,
}

/// The complete generated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(rename = "clusterName")]
    pub cluster_name: String,
    pub platform: String,
    #[serde(rename = "hostInventory")]
    pub host_inventory: String,
    pub nodepool: Vec<NodePool>,
    #[serde(rename = "mcFiles")]
    pub mc_files: Vec<String>,
    pub dns: DnsConfig,
    #[serde(rename = "imageContentSources")]
    pub image_content_sources: Vec<ImageContentSource>,
}

impl ClusterConfig {
    /// Vendor-agnostic count used in API responses
    pub fn nodepool_count(&self) -> usize {
        self.nodepool.len()
    }
}
