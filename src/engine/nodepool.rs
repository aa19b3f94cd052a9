//! Nodepool assembly: one agent nodepool per vendor entry

use tracing::debug;

use super::error::GenerationError;
use super::model::{AgentLabelSelector, ConfigRef, NodePool, NodePoolLabels, VendorConfig, AGENT_LABEL_KEY};
use super::names::{per_nodepool_configs, ConfigOptions};

pub fn nodepool_name(cluster_name: &str, vendor: &str) -> String {
    format!("{cluster_name}-{vendor}-nodepool")
}

/// Replica bounds as `(min, max)`: min is one below max, floored at 1
pub fn replica_bounds(replicas: u32) -> (u32, u32) {
    (replicas.saturating_sub(1).max(1), replicas)
}

/// Build the nodepool for one vendor entry
pub fn build(
    cluster_name: &str,
    vendor_config: &VendorConfig,
    options: &ConfigOptions<'_>,
) -> Result<NodePool, GenerationError> {
    let replicas = vendor_config.number_of_nodes;
    if replicas < 1 {
        return Err(GenerationError::InvalidReplicaCount {
            vendor: vendor_config.vendor.clone(),
            replicas,
        });
    }

    let (min, max) = replica_bounds(replicas);
    let config = per_nodepool_configs(cluster_name, &vendor_config.vendor, options)
        .into_iter()
        .map(ConfigRef::new)
        .collect();

    let nodepool = NodePool {
        name: nodepool_name(cluster_name, &vendor_config.vendor),
        replicas,
        labels: NodePoolLabels {
            min_replicas: min.to_string(),
            max_replicas: max.to_string(),
        },
        agent_label_selector: AgentLabelSelector {
            node_label_key: AGENT_LABEL_KEY.to_string(),
            node_label_value: vendor_config.infra_env_name.clone(),
        },
        config,
    };

    debug!(
        "Built nodepool {} with {} replicas and {} configs",
        nodepool.name,
        replicas,
        nodepool.config.len()
    );
    Ok(nodepool)
}
