//! Cluster assembly
//!
//! Single-pass transform from a validated input to a complete document.
//! Nothing is returned unless every step succeeds.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::document::to_document;
use super::error::GenerationError;
use super::model::{ClusterConfig, ClusterGenerationInput, DnsConfig, HOST_INVENTORY, PLATFORM};
use super::names::{mc_files, ConfigOptions};
use super::nodepool;
use super::registry::VersionRegistry;

/// Structured document plus its YAML rendering
#[derive(Debug, Clone)]
pub struct GeneratedCluster {
    pub config: ClusterConfig,
    pub yaml: String,
}

/// Ties the registry, name builder, and nodepool assembler together
#[derive(Clone)]
pub struct ClusterAssembler {
    registry: Arc<VersionRegistry>,
}

impl ClusterAssembler {
    pub fn new(registry: Arc<VersionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<VersionRegistry> {
        &self.registry
    }

    /// Check every vendor against the supported set before any other work
    pub fn validate_vendors(&self, input: &ClusterGenerationInput) -> Result<(), GenerationError> {
        for vc in &input.vendor_configs {
            if !self.registry.is_supported_vendor(&vc.vendor) {
                let mut valid = self.registry.vendor_ids();
                valid.sort();
                return Err(GenerationError::UnsupportedVendor {
                    vendor: vc.vendor.clone(),
                    valid,
                });
            }
        }
        Ok(())
    }

    pub fn generate(&self, input: &ClusterGenerationInput) -> Result<ClusterConfig, GenerationError> {
        self.validate_vendors(input)?;

        let mut seen = HashSet::new();
        for vendor in input.vendors() {
            if !seen.insert(vendor) {
                warn!(
                    "Vendor '{}' listed more than once for cluster {}; nm-conf names will collide",
                    vendor, input.cluster_name
                );
            }
        }

        let options = ConfigOptions {
            max_pods: input.max_pods,
            include_var_lib_containers: input.include_var_lib_containers,
            include_ringsize: input.include_ringsize,
            custom_configs: &input.custom_configs,
        };

        let nodepools = input
            .vendor_configs
            .iter()
            .map(|vc| nodepool::build(&input.cluster_name, vc, &options))
            .collect::<Result<Vec<_>, _>>()?;

        let vendors = input.vendors();
        let mc_files = mc_files(&input.cluster_name, vendors.as_slice(), &options);
        let image_content_sources = self.registry.sources_for(input.ocp_version)?;

        let config = ClusterConfig {
            cluster_name: input.cluster_name.clone(),
            platform: PLATFORM.to_string(),
            host_inventory: HOST_INVENTORY.to_string(),
            nodepool: nodepools,
            mc_files,
            dns: DnsConfig {
                site: input.site.clone(),
                zone: input.dns_domain.clone(),
            },
            image_content_sources,
        };

        info!(
            "Generated cluster config for {} with {} nodepool(s)",
            config.cluster_name,
            config.nodepool_count()
        );
        Ok(config)
    }

    /// Generate and render in one call
    pub fn generate_yaml(
        &self,
        input: &ClusterGenerationInput,
    ) -> Result<GeneratedCluster, GenerationError> {
        let config = self.generate(input)?;
        let yaml = to_document(&config)
            .map_err(|e| GenerationError::Serialization(e.to_string()))?;
        Ok(GeneratedCluster { config, yaml })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::model::VendorConfig;
    use crate::engine::names::{KUBELET_CONFIG_HIGH_DENSITY, VAR_LIB_CONTAINERS};
    use crate::engine::registry::{MaxPods, OcpVersion};

    fn assembler() -> ClusterAssembler {
        ClusterAssembler::new(Arc::new(VersionRegistry::builtin().unwrap()))
    }

    fn dell_input() -> ClusterGenerationInput {
        ClusterGenerationInput::new(
            "c1",
            "dc1",
            vec![VendorConfig::new("dell", 3, "dell-env")],
            OcpVersion::V4_16,
        )
    }

    #[test]
    fn test_single_vendor_example() {
        let config = assembler().generate(&dell_input()).unwrap();

        assert_eq!(config.cluster_name, "c1");
        assert_eq!(config.platform, "agent");
        assert_eq!(config.host_inventory, "inventory");
        assert_eq!(config.nodepool.len(), 1);

        let pool = &config.nodepool[0];
        assert_eq!(pool.name, "c1-dell-nodepool");
        assert_eq!(pool.labels.min_replicas, "2");
        assert_eq!(pool.labels.max_replicas, "3");

        let expected = vec![
            "nm-conf-c1-dell",
            "workers-chrony-configuration",
            "worker-kubeletconfig",
        ];
        assert_eq!(pool.config_names(), expected);
        assert_eq!(config.mc_files, expected);
        assert_eq!(config.dns.site, "dc1");
        assert_eq!(config.dns.zone, "example.company.com");
    }

    #[test]
    fn test_high_density_example() {
        let input = dell_input().with_max_pods(MaxPods::HighDensity);
        let config = assembler().generate(&input).unwrap();

        let expected = vec![
            "nm-conf-c1-dell",
            "workers-chrony-configuration",
            KUBELET_CONFIG_HIGH_DENSITY,
            VAR_LIB_CONTAINERS,
        ];
        assert_eq!(config.nodepool[0].config_names(), expected);
        assert_eq!(config.mc_files, expected);
    }

    #[test]
    fn test_high_density_forces_var_lib_in_every_nodepool() {
        let input = ClusterGenerationInput::new(
            "c3",
            "dc1",
            vec![
                VendorConfig::new("dell", 3, "dell-env"),
                VendorConfig::new("cisco", 2, "cisco-env"),
                VendorConfig::new("h100-gpu", 1, "gpu-env"),
            ],
            OcpVersion::V4_16,
        )
        .with_max_pods(MaxPods::HighDensity)
        .with_var_lib_containers(false);
        let config = assembler().generate(&input).unwrap();

        assert_eq!(config.nodepool.len(), 3);
        for nodepool in &config.nodepool {
            let names = nodepool.config_names();
            assert_eq!(
                names.iter().filter(|n| **n == VAR_LIB_CONTAINERS).count(),
                1,
                "{} lacks {}",
                nodepool.name,
                VAR_LIB_CONTAINERS
            );
            assert!(names.contains(&KUBELET_CONFIG_HIGH_DENSITY));
        }
        assert_eq!(
            config
                .mc_files
                .iter()
                .filter(|n| n.as_str() == VAR_LIB_CONTAINERS)
                .count(),
            1
        );
    }

    #[test]
    fn test_standard_density_never_mentions_var_lib() {
        let input = dell_input();
        let generated = assembler().generate_yaml(&input).unwrap();
        assert!(!generated.yaml.contains(VAR_LIB_CONTAINERS));
    }

    #[test]
    fn test_nodepool_order_follows_input() {
        let input = ClusterGenerationInput::new(
            "c2",
            "dc1",
            vec![
                VendorConfig::new("h200-gpu", 2, "gpu"),
                VendorConfig::new("cisco", 4, "cisco-env"),
                VendorConfig::new("dell", 1, "dell-env"),
            ],
            OcpVersion::V4_15,
        );
        let config = assembler().generate(&input).unwrap();

        let names: Vec<_> = config.nodepool.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["c2-h200-gpu-nodepool", "c2-cisco-nodepool", "c2-dell-nodepool"]
        );
        assert_eq!(
            &config.mc_files[..3],
            &["nm-conf-c2-h200-gpu", "nm-conf-c2-cisco", "nm-conf-c2-dell"]
        );
    }

    #[test]
    fn test_unsupported_vendor_lists_all_five() {
        let input = ClusterGenerationInput::new(
            "c1",
            "dc1",
            vec![
                VendorConfig::new("dell", 3, "dell-env"),
                VendorConfig::new("acme", 2, "acme-env"),
            ],
            OcpVersion::V4_16,
        );
        match assembler().generate(&input) {
            Err(GenerationError::UnsupportedVendor { vendor, valid }) => {
                assert_eq!(vendor, "acme");
                assert_eq!(
                    valid,
                    vec!["cisco", "dell", "dell-data", "h100-gpu", "h200-gpu"]
                );
            }
            other => panic!("Expected UnsupportedVendor, got {:?}", other),
        }
    }

    #[test]
    fn test_vendor_check_precedes_replica_check() {
        let input = ClusterGenerationInput::new(
            "c1",
            "dc1",
            vec![
                VendorConfig::new("dell", 0, "dell-env"),
                VendorConfig::new("acme", 2, "acme-env"),
            ],
            OcpVersion::V4_16,
        );
        let err = assembler().generate(&input).unwrap_err();
        assert!(matches!(err, GenerationError::UnsupportedVendor { .. }));
    }

    #[test]
    fn test_image_sources_follow_version() {
        let registry = VersionRegistry::builtin().unwrap();
        let expected = registry.sources_for(OcpVersion::V4_15).unwrap();

        let mut input = dell_input();
        input.ocp_version = OcpVersion::V4_15;
        let config = assembler().generate(&input).unwrap();
        assert_eq!(config.image_content_sources, expected);
    }

    #[test]
    fn test_duplicate_vendors_are_kept() {
        let input = ClusterGenerationInput::new(
            "c1",
            "dc1",
            vec![
                VendorConfig::new("dell", 3, "a"),
                VendorConfig::new("dell", 2, "b"),
            ],
            OcpVersion::V4_16,
        );
        let config = assembler().generate(&input).unwrap();
        assert_eq!(config.nodepool.len(), 2);
        assert_eq!(config.mc_files[0], config.mc_files[1]);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let input = dell_input()
            .with_ringsize(true)
            .with_custom_configs(vec!["extra".to_string()]);
        let a = assembler().generate_yaml(&input).unwrap();
        let b = assembler().generate_yaml(&input).unwrap();
        assert_eq!(a.yaml, b.yaml);
    }
}
