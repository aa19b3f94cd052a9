//! Flavor catalog
//!
//! A flavor is a named preset (vendors, node counts, density, optional
//! configs) kept as one YAML file per flavor:
//!
//! ```yaml
//! name: Mixed Compute
//! description: Dell and Cisco worker pools
//! vendors:
//!   - vendor: dell
//!     nodes: 5
//!     infra_env: dell-infra
//!   - vendor: cisco          # infra_env defaults to "cisco-infra"
//!     nodes: 3
//! ocp_version: "4.16"
//! max_pods: 250
//! include_ringsize: true
//! ```
//!
//! Flavors are keyed by file stem. The catalog is an immutable snapshot that
//! `reload` replaces wholesale, same as the version registry.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::{MaxPods, OcpVersion};
use crate::service::models::{ClusterRequest, VendorConfigRequest};

const BUILTIN_FLAVORS: [(&str, &str); 3] = [
    ("default", include_str!("../../data/flavors/default.yaml")),
    (
        "gpu-high-density",
        include_str!("../../data/flavors/gpu-high-density.yaml"),
    ),
    (
        "mixed-compute",
        include_str!("../../data/flavors/mixed-compute.yaml"),
    ),
];

/// Errors from the flavor catalog
#[derive(Error, Debug)]
pub enum FlavorError {
    #[error("Flavor '{name}' not found. Available flavors: {}", available.join(", "))]
    NotFound {
        name: String,
        available: Vec<String>,
    },

    #[error("Invalid flavor file {location}: {message}")]
    Invalid { location: String, message: String },

    #[error("Failed to read flavors directory {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One vendor pool inside a flavor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorVendor {
    pub vendor: String,
    pub nodes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra_env: Option<String>,
}

impl FlavorVendor {
    pub fn infra_env_name(&self) -> String {
        self.infra_env
            .clone()
            .unwrap_or_else(|| format!("{}-infra", self.vendor))
    }
}

fn default_flavor_version() -> String {
    OcpVersion::default().to_string()
}

fn default_flavor_max_pods() -> u32 {
    MaxPods::default().value()
}

/// A named preset loaded from a flavor file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub vendors: Vec<FlavorVendor>,
    #[serde(default = "default_flavor_version")]
    pub ocp_version: String,
    #[serde(default = "default_flavor_max_pods")]
    pub max_pods: u32,
    #[serde(default)]
    pub include_var_lib_containers: bool,
    #[serde(default)]
    pub include_ringsize: bool,
    #[serde(default)]
    pub custom_configs: Vec<String>,
}

/// Per-vendor node count in a flavor summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorVendorNodes {
    pub vendor: String,
    pub nodes: u32,
}

/// Summary of a flavor for listings and `flavors show`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorDetails {
    pub key: String,
    pub name: String,
    pub description: String,
    pub total_nodes: u32,
    pub vendors: Vec<FlavorVendorNodes>,
    pub ocp_version: String,
    pub max_pods: u32,
    pub high_density: bool,
    pub includes_var_lib_containers: bool,
    pub includes_ringsize: bool,
    pub custom_configs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorSummary {
    pub key: String,
    pub name: String,
    pub description: String,
}

impl Flavor {
    /// Saturates rather than overflowing on hand-edited files
    pub fn total_nodes(&self) -> u32 {
        self.vendors
            .iter()
            .fold(0u32, |total, v| total.saturating_add(v.nodes))
    }

    pub fn details(&self, key: &str) -> FlavorDetails {
        FlavorDetails {
            key: key.to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            total_nodes: self.total_nodes(),
            vendors: self
                .vendors
                .iter()
                .map(|v| FlavorVendorNodes {
                    vendor: v.vendor.clone(),
                    nodes: v.nodes,
                })
                .collect(),
            ocp_version: self.ocp_version.clone(),
            max_pods: self.max_pods,
            high_density: self.max_pods == MaxPods::HighDensity.value(),
            includes_var_lib_containers: self.include_var_lib_containers,
            includes_ringsize: self.include_ringsize,
            custom_configs: self.custom_configs.clone(),
        }
    }

    /// Expand the preset into an ordinary cluster request
    pub fn to_request(
        &self,
        cluster_name: &str,
        site: &str,
        dns_domain: Option<String>,
    ) -> ClusterRequest {
        ClusterRequest {
            cluster_name: cluster_name.to_string(),
            site: site.to_string(),
            vendor_configs: self
                .vendors
                .iter()
                .map(|v| VendorConfigRequest::new(&v.vendor, v.nodes, v.infra_env_name()))
                .collect(),
            ocp_version: Some(self.ocp_version.clone()),
            dns_domain,
            max_pods: Some(self.max_pods),
            include_var_lib_containers: self.include_var_lib_containers,
            include_ringsize: self.include_ringsize,
            custom_configs: self.custom_configs.clone(),
        }
    }
}

// ============================================================================
// SBIO: Pure parsing
// ============================================================================

/// Parse one flavor file. Pure function - no I/O.
pub fn parse_flavor(content: &str, location: &str) -> Result<Flavor, FlavorError> {
    let flavor: Flavor = serde_yaml::from_str(content).map_err(|e| FlavorError::Invalid {
        location: location.to_string(),
        message: e.to_string(),
    })?;

    if flavor.name.trim().is_empty() || flavor.vendors.is_empty() {
        return Err(FlavorError::Invalid {
            location: location.to_string(),
            message: "missing name or vendors".to_string(),
        });
    }
    Ok(flavor)
}

/// Where flavor files come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlavorSource {
    /// Files bundled into the binary
    Builtin,
    /// `<dir>/*.yaml`
    Directory(PathBuf),
}

impl fmt::Display for FlavorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlavorSource::Builtin => f.write_str("built-in"),
            FlavorSource::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

type FlavorMap = BTreeMap<String, Flavor>;

fn insert_parsed(flavors: &mut FlavorMap, key: &str, content: &str, location: &str) {
    match parse_flavor(content, location) {
        Ok(flavor) => {
            debug!("Loaded flavor: {} ({})", key, flavor.name);
            flavors.insert(key.to_string(), flavor);
        }
        Err(e) => warn!("Skipping flavor: {}", e),
    }
}

fn builtin_flavors() -> FlavorMap {
    let mut flavors = FlavorMap::new();
    for (key, content) in BUILTIN_FLAVORS {
        insert_parsed(&mut flavors, key, content, &format!("built-in {key}.yaml"));
    }
    flavors
}

fn directory_flavors(dir: &Path) -> Result<FlavorMap, FlavorError> {
    let mut flavors = FlavorMap::new();
    if !dir.is_dir() {
        warn!("Flavors directory not found: {}", dir.display());
        return Ok(flavors);
    }

    let entries = std::fs::read_dir(dir).map_err(|source| FlavorError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("yaml"))
        .collect();
    paths.sort();

    for path in paths {
        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => insert_parsed(&mut flavors, key, &content, &path.display().to_string()),
            Err(e) => warn!("Skipping flavor {}: {}", path.display(), e),
        }
    }
    Ok(flavors)
}

fn load_flavors(source: &FlavorSource) -> Result<FlavorMap, FlavorError> {
    match source {
        FlavorSource::Builtin => Ok(builtin_flavors()),
        FlavorSource::Directory(dir) => directory_flavors(dir),
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Reloadable set of flavors keyed by file stem
pub struct FlavorCatalog {
    source: FlavorSource,
    flavors: ArcSwap<FlavorMap>,
}

impl FlavorCatalog {
    pub fn load(source: FlavorSource) -> Result<Self, FlavorError> {
        let flavors = load_flavors(&source)?;
        info!("Loaded {} flavor(s) from {}", flavors.len(), source);
        Ok(Self {
            source,
            flavors: ArcSwap::from_pointee(flavors),
        })
    }

    pub fn builtin() -> Self {
        Self {
            source: FlavorSource::Builtin,
            flavors: ArcSwap::from_pointee(builtin_flavors()),
        }
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Result<Self, FlavorError> {
        Self::load(FlavorSource::Directory(dir.into()))
    }

    pub fn source(&self) -> &FlavorSource {
        &self.source
    }

    /// Keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.flavors.load().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.flavors.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list(&self) -> Vec<FlavorSummary> {
        self.flavors
            .load()
            .iter()
            .map(|(key, flavor)| FlavorSummary {
                key: key.clone(),
                name: flavor.name.clone(),
                description: flavor.description.clone(),
            })
            .collect()
    }

    pub fn get(&self, key: &str) -> Result<Flavor, FlavorError> {
        let flavors = self.flavors.load();
        flavors
            .get(key)
            .cloned()
            .ok_or_else(|| FlavorError::NotFound {
                name: key.to_string(),
                available: flavors.keys().cloned().collect(),
            })
    }

    pub fn details(&self, key: &str) -> Result<FlavorDetails, FlavorError> {
        Ok(self.get(key)?.details(key))
    }

    /// Re-read the source and swap the set in one step.
    /// On failure the current set stays in place.
    pub fn reload(&self) -> Result<usize, FlavorError> {
        let flavors = load_flavors(&self.source)?;
        let count = flavors.len();
        self.flavors.store(Arc::new(flavors));
        info!("Reloaded {} flavor(s) from {}", count, self.source);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SMALL: &str = r#"
name: Small
description: One dell pool
vendors:
  - vendor: dell
    nodes: 2
"#;

    #[test]
    fn test_builtin_flavors() {
        let catalog = FlavorCatalog::builtin();
        assert_eq!(
            catalog.keys(),
            vec!["default", "gpu-high-density", "mixed-compute"]
        );

        let gpu = catalog.details("gpu-high-density").unwrap();
        assert_eq!(gpu.total_nodes, 6);
        assert!(gpu.high_density);
        assert_eq!(gpu.custom_configs, vec!["nvidia-gpu-operator-config"]);
    }

    #[test]
    fn test_parse_defaults() {
        let flavor = parse_flavor(SMALL, "small.yaml").unwrap();
        assert_eq!(flavor.ocp_version, "4.16");
        assert_eq!(flavor.max_pods, 250);
        assert!(!flavor.include_ringsize);
        assert_eq!(flavor.vendors[0].infra_env_name(), "dell-infra");
    }

    #[test]
    fn test_total_nodes_saturates() {
        let content = "name: Huge\nvendors:\n  - vendor: dell\n    nodes: 4294967295\n  - vendor: cisco\n    nodes: 3\n";
        let flavor = parse_flavor(content, "huge.yaml").unwrap();
        assert_eq!(flavor.total_nodes(), u32::MAX);
        assert_eq!(flavor.details("huge").total_nodes, u32::MAX);
    }

    #[test]
    fn test_parse_rejects_missing_vendors() {
        let result = parse_flavor("name: Empty\nvendors: []\n", "empty.yaml");
        assert!(matches!(result, Err(FlavorError::Invalid { .. })));

        let result = parse_flavor("description: no name\n", "nameless.yaml");
        assert!(matches!(result, Err(FlavorError::Invalid { .. })));
    }

    #[test]
    fn test_to_request() {
        let flavor = FlavorCatalog::builtin().get("mixed-compute").unwrap();
        let request = flavor.to_request("c9", "dc2", None);

        assert_eq!(request.cluster_name, "c9");
        assert_eq!(request.site, "dc2");
        assert_eq!(
            request.vendor_configs,
            vec![
                VendorConfigRequest::new("dell", 5, "dell-infra"),
                VendorConfigRequest::new("cisco", 3, "cisco-infra"),
            ]
        );
        assert_eq!(request.max_pods, Some(250));
        assert!(request.include_ringsize);
        assert!(request.dns_domain.is_none());
    }

    #[test]
    fn test_not_found_lists_available() {
        let catalog = FlavorCatalog::builtin();
        match catalog.get("huge") {
            Err(FlavorError::NotFound { name, available }) => {
                assert_eq!(name, "huge");
                assert_eq!(available.len(), 3);
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_directory_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("small.yaml"), SMALL).unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "name: [").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = FlavorCatalog::from_dir(dir.path()).unwrap();
        assert_eq!(catalog.keys(), vec!["small"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = FlavorCatalog::from_dir(dir.path().join("absent")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_reload_picks_up_new_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("small.yaml"), SMALL).unwrap();
        let catalog = FlavorCatalog::from_dir(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);

        std::fs::write(dir.path().join("another.yaml"), SMALL).unwrap();
        assert_eq!(catalog.reload().unwrap(), 2);
        assert_eq!(catalog.keys(), vec!["another", "small"]);
    }
}
