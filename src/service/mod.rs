//! Cluster service
//!
//! The one place the HTTP handlers and CLI commands go through: validates
//! request shape, fills in configured defaults, runs the engine, and shapes
//! responses. Handlers stay thin.

pub mod models;
pub mod validation;

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{DefaultSettings, Settings};
use crate::engine::names::{base_configs, RINGSIZE, VAR_LIB_CONTAINERS};
use crate::engine::{
    ClusterAssembler, ClusterGenerationInput, GeneratedCluster, GenerationError,
    ImageContentSource, MaxPods, RegistryError, VendorConfig, VersionRegistry,
};
use crate::flavors::{FlavorCatalog, FlavorDetails, FlavorError, FlavorSummary};
use crate::gitops::{ClusterChange, CommitAuthor, GitOpsError, GitOpsSink, PublishOutcome};

pub use models::*;
pub use validation::{validate_request, InputError};

/// Errors surfaced by the service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Flavor(#[from] FlavorError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    GitOps(#[from] GitOpsError),

    #[error("GitOps publishing is not configured: set gitops.repo_path or GITOPS_REPO_PATH")]
    GitOpsDisabled,
}

/// A generated document together with the input that produced it
#[derive(Debug, Clone)]
pub struct Generation {
    pub input: ClusterGenerationInput,
    pub cluster: GeneratedCluster,
}

impl Generation {
    /// Vendor ids in input order
    pub fn vendors_used(&self) -> Vec<String> {
        self.input.vendors().into_iter().map(str::to_string).collect()
    }

    pub fn nodepool_count(&self) -> usize {
        self.cluster.config.nodepool_count()
    }

    pub fn yaml(&self) -> &str {
        &self.cluster.yaml
    }

    pub fn generate_response(
        &self,
        message: impl Into<String>,
        git: Option<PublishOutcome>,
    ) -> GenerateClusterResponse {
        GenerateClusterResponse {
            cluster_name: self.input.cluster_name.clone(),
            yaml_content: self.cluster.yaml.clone(),
            vendors_used: self.vendors_used(),
            ocp_version: self.input.ocp_version.to_string(),
            nodepool_count: self.nodepool_count(),
            generated_at: Utc::now(),
            message: message.into(),
            git,
        }
    }

    pub fn preview_response(&self) -> PreviewClusterResponse {
        PreviewClusterResponse {
            cluster_name: self.input.cluster_name.clone(),
            yaml_content: self.cluster.yaml.clone(),
            vendors_used: self.vendors_used(),
            ocp_version: self.input.ocp_version.to_string(),
            nodepool_count: self.nodepool_count(),
            generated_at: Utc::now(),
        }
    }

    pub fn success_message(&self) -> String {
        format!(
            "Cluster configuration generated successfully with {} nodepool(s)",
            self.nodepool_count()
        )
    }
}

pub struct ClusterService {
    assembler: ClusterAssembler,
    flavors: Arc<FlavorCatalog>,
    defaults: DefaultSettings,
    sites: Vec<String>,
}

impl ClusterService {
    pub fn new(
        registry: Arc<VersionRegistry>,
        flavors: Arc<FlavorCatalog>,
        defaults: DefaultSettings,
        sites: Vec<String>,
    ) -> Self {
        Self {
            assembler: ClusterAssembler::new(registry),
            flavors,
            defaults,
            sites,
        }
    }

    /// Build from settings: bundled data unless `data_dir` is set
    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let registry = match settings.image_sources_dir() {
            Some(dir) => VersionRegistry::from_dir(dir)?,
            None => VersionRegistry::builtin()?,
        };
        let flavors = match settings.flavors_dir() {
            Some(dir) => FlavorCatalog::from_dir(dir)?,
            None => FlavorCatalog::builtin(),
        };
        Ok(Self::new(
            Arc::new(registry),
            Arc::new(flavors),
            settings.defaults.clone(),
            settings.site_list(),
        ))
    }

    /// Built-in data and default settings
    pub fn builtin() -> Result<Self, ServiceError> {
        Self::from_settings(&Settings::default())
    }

    pub fn registry(&self) -> &Arc<VersionRegistry> {
        self.assembler.registry()
    }

    pub fn flavor_catalog(&self) -> &Arc<FlavorCatalog> {
        &self.flavors
    }

    // ========================================================================
    // Catalogue
    // ========================================================================

    pub fn vendors(&self) -> VendorsResponse {
        let vendors: Vec<VendorInfo> = self
            .registry()
            .supported_vendors()
            .iter()
            .map(|v| VendorInfo {
                name: v.as_str().to_string(),
                display_name: v.display_name().to_string(),
            })
            .collect();
        VendorsResponse {
            total: vendors.len(),
            vendors,
        }
    }

    pub fn versions(&self) -> VersionsResponse {
        let versions: Vec<String> = self
            .registry()
            .supported_versions()
            .iter()
            .map(|v| v.to_string())
            .collect();
        VersionsResponse {
            total: versions.len(),
            versions,
            default: self.defaults.ocp_version.to_string(),
        }
    }

    pub fn sites(&self) -> SitesResponse {
        SitesResponse {
            sites: self.sites.clone(),
            total: self.sites.len(),
        }
    }

    pub fn defaults(&self) -> DefaultsResponse {
        let versions = self
            .registry()
            .supported_versions()
            .iter()
            .map(|v| VersionInfo {
                version: v.to_string(),
                is_default: *v == self.defaults.ocp_version,
            })
            .collect();

        let optional_configs = vec![
            ConfigInfo {
                key: "var_lib_containers".to_string(),
                name: VAR_LIB_CONTAINERS.to_string(),
                description: "Configure /var/lib/containers storage (required for 500 pods)"
                    .to_string(),
                is_optional: true,
            },
            ConfigInfo {
                key: "ringsize".to_string(),
                name: RINGSIZE.to_string(),
                description: "Network ring buffer size configuration".to_string(),
                is_optional: true,
            },
        ];

        DefaultsResponse {
            vendors: self.vendors().vendors,
            versions,
            default_configs: base_configs(MaxPods::Standard),
            optional_configs,
            max_pods_options: MaxPods::ALL.iter().map(|m| m.value()).collect(),
            default_dns_domain: self.defaults.dns_domain.clone(),
        }
    }

    pub fn image_content_sources(
        &self,
        version: &str,
    ) -> Result<Vec<ImageContentSource>, ServiceError> {
        Ok(self.registry().image_content_sources(version)?)
    }

    pub fn reload_registry(&self) -> Result<usize, ServiceError> {
        Ok(self.registry().reload()?)
    }

    // ========================================================================
    // Flavors
    // ========================================================================

    pub fn list_flavors(&self) -> Vec<FlavorSummary> {
        self.flavors.list()
    }

    pub fn flavor_details(&self, name: &str) -> Result<FlavorDetails, ServiceError> {
        Ok(self.flavors.details(name)?)
    }

    pub fn reload_flavors(&self) -> Result<usize, ServiceError> {
        Ok(self.flavors.reload()?)
    }

    /// Expand a flavor into a request for the given cluster
    pub fn flavor_request(
        &self,
        name: &str,
        cluster_name: &str,
        site: &str,
        dns_domain: Option<String>,
    ) -> Result<ClusterRequest, ServiceError> {
        let flavor = self.flavors.get(name)?;
        Ok(flavor.to_request(cluster_name, site, dns_domain))
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Validate request shape and fill in defaults
    pub fn to_input(&self, request: &ClusterRequest) -> Result<ClusterGenerationInput, ServiceError> {
        validate_request(request)?;

        let ocp_version = match &request.ocp_version {
            Some(version) => validation::parse_version(version)?,
            None => self.defaults.ocp_version,
        };
        let max_pods = match request.max_pods {
            Some(value) => validation::parse_max_pods(value)?,
            None => MaxPods::default(),
        };
        let dns_domain = request
            .dns_domain
            .clone()
            .unwrap_or_else(|| self.defaults.dns_domain.clone());

        let vendor_configs = request
            .vendor_configs
            .iter()
            .map(|vc| VendorConfig::new(&vc.vendor, vc.number_of_nodes, &vc.infra_env_name))
            .collect();

        Ok(
            ClusterGenerationInput::new(&request.cluster_name, &request.site, vendor_configs, ocp_version)
                .with_dns_domain(dns_domain)
                .with_max_pods(max_pods)
                .with_var_lib_containers(request.include_var_lib_containers)
                .with_ringsize(request.include_ringsize)
                .with_custom_configs(request.custom_configs.clone()),
        )
    }

    pub fn generate(&self, request: &ClusterRequest) -> Result<Generation, ServiceError> {
        let input = self.to_input(request)?;
        debug!(
            "Generating cluster {} at {} with vendors {:?}",
            input.cluster_name,
            input.site,
            input.vendors()
        );
        let cluster = self.assembler.generate_yaml(&input)?;
        Ok(Generation { input, cluster })
    }

    pub fn preview(&self, request: &ClusterRequest) -> Result<PreviewClusterResponse, ServiceError> {
        Ok(self.generate(request)?.preview_response())
    }

    /// Send a generation through a GitOps sink
    pub fn publish(
        &self,
        sink: &dyn GitOpsSink,
        generation: &Generation,
        author: CommitAuthor,
    ) -> Result<PublishOutcome, ServiceError> {
        let change = ClusterChange::for_cluster(&generation.input, generation.yaml(), author);
        let outcome = sink.publish(&change)?;
        info!(
            "Published {} to branch {} (commit {}, pushed: {})",
            outcome.file_path, outcome.branch, outcome.commit_id, outcome.pushed
        );
        Ok(outcome)
    }
}
