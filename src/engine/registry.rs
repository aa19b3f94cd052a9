//! Vendor and version registry
//!
//! Static enumerations of supported hardware vendors and OpenShift versions,
//! plus the per-version image mirror tables. Mirror data is read once into an
//! immutable snapshot; `reload` builds a complete replacement and swaps it in
//! atomically, so readers see either the old table or the new one.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::error::GenerationError;

const BUILTIN_4_15: &str = include_str!("../../data/image_content_sources/4.15.yaml");
const BUILTIN_4_16: &str = include_str!("../../data/image_content_sources/4.16.yaml");

// ============================================================================
// Vendors
// ============================================================================

/// Supported hardware vendors, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Vendor {
    Cisco,
    Dell,
    DellData,
    H100Gpu,
    H200Gpu,
}

impl Vendor {
    pub const ALL: [Vendor; 5] = [
        Vendor::Cisco,
        Vendor::Dell,
        Vendor::DellData,
        Vendor::H100Gpu,
        Vendor::H200Gpu,
    ];

    /// Technical id used in config names and nodepool names
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Cisco => "cisco",
            Vendor::Dell => "dell",
            Vendor::DellData => "dell-data",
            Vendor::H100Gpu => "h100-gpu",
            Vendor::H200Gpu => "h200-gpu",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Vendor::Cisco => "Cisco UCS",
            Vendor::Dell => "Dell PowerEdge",
            Vendor::DellData => "Dell Data Services",
            Vendor::H100Gpu => "NVIDIA H100 GPU",
            Vendor::H200Gpu => "NVIDIA H200 GPU",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == id)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Versions and densities
// ============================================================================

/// Supported OpenShift versions
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum OcpVersion {
    #[serde(rename = "4.15")]
    V4_15,
    #[default]
    #[serde(rename = "4.16")]
    V4_16,
}

impl OcpVersion {
    pub const ALL: [OcpVersion; 2] = [OcpVersion::V4_15, OcpVersion::V4_16];

    pub fn as_str(&self) -> &'static str {
        match self {
            OcpVersion::V4_15 => "4.15",
            OcpVersion::V4_16 => "4.16",
        }
    }

    /// Parse a version id, failing with the supported set
    pub fn parse(id: &str) -> Result<Self, GenerationError> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == id)
            .ok_or_else(|| GenerationError::UnsupportedVersion {
                version: id.to_string(),
                supported: Self::ALL.iter().map(|v| v.as_str().to_string()).collect(),
            })
    }
}

impl fmt::Display for OcpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum pods per node. Only two densities are supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum MaxPods {
    #[default]
    Standard,
    HighDensity,
}

impl MaxPods {
    pub const ALL: [MaxPods; 2] = [MaxPods::Standard, MaxPods::HighDensity];

    pub fn value(&self) -> u32 {
        match self {
            MaxPods::Standard => 250,
            MaxPods::HighDensity => 500,
        }
    }

    pub fn is_high_density(&self) -> bool {
        matches!(self, MaxPods::HighDensity)
    }
}

impl TryFrom<u32> for MaxPods {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            250 => Ok(MaxPods::Standard),
            500 => Ok(MaxPods::HighDensity),
            other => Err(format!("unsupported max_pods {other}, expected 250 or 500")),
        }
    }
}

impl From<MaxPods> for u32 {
    fn from(value: MaxPods) -> Self {
        value.value()
    }
}

impl fmt::Display for MaxPods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

// ============================================================================
// Mirror data
// ============================================================================

/// A registry mirror mapping for disconnected image pulls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContentSource {
    pub source: String,
    pub mirrors: Vec<String>,
}

/// On-disk layout of a `<version>.yaml` data file
#[derive(Debug, Deserialize)]
struct ImageSourceFile {
    #[serde(rename = "imageContentSources", default)]
    image_content_sources: Vec<ImageContentSource>,
}

/// Errors while reading registry data
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse image content sources in {location}: {message}")]
    Parse { location: String, message: String },
}

/// Where mirror tables come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// Tables compiled into the binary
    Builtin,
    /// One `<version>.yaml` file per version in a directory
    Directory(PathBuf),
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrySource::Builtin => f.write_str("built-in"),
            RegistrySource::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Immutable mirror table for every version that has data
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    tables: BTreeMap<OcpVersion, Vec<ImageContentSource>>,
}

impl RegistrySnapshot {
    pub fn get(&self, version: OcpVersion) -> Option<&[ImageContentSource]> {
        self.tables.get(&version).map(Vec::as_slice)
    }

    pub fn versions(&self) -> Vec<OcpVersion> {
        self.tables.keys().copied().collect()
    }
}

/// Parse one data file. Pure function - no I/O.
pub fn parse_image_sources(
    content: &str,
    location: &str,
) -> Result<Vec<ImageContentSource>, RegistryError> {
    let file: ImageSourceFile =
        serde_yaml::from_str(content).map_err(|e| RegistryError::Parse {
            location: location.to_string(),
            message: e.to_string(),
        })?;
    Ok(file.image_content_sources)
}

fn builtin_snapshot() -> Result<RegistrySnapshot, RegistryError> {
    let mut tables = BTreeMap::new();
    for (version, content) in [
        (OcpVersion::V4_15, BUILTIN_4_15),
        (OcpVersion::V4_16, BUILTIN_4_16),
    ] {
        let location = format!("built-in {version}.yaml");
        tables.insert(version, parse_image_sources(content, &location)?);
    }
    Ok(RegistrySnapshot { tables })
}

fn directory_snapshot(dir: &Path) -> Result<RegistrySnapshot, RegistryError> {
    if !dir.is_dir() {
        warn!("Image content sources directory not found: {}", dir.display());
    }

    let mut tables = BTreeMap::new();
    for version in OcpVersion::ALL {
        let path = dir.join(format!("{version}.yaml"));
        if !path.exists() {
            debug!("No image content sources for {} at {}", version, path.display());
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|source| RegistryError::Io {
            path: path.clone(),
            source,
        })?;
        let sources = parse_image_sources(&content, &path.display().to_string())?;
        debug!("Loaded {} image content sources for {}", sources.len(), version);
        tables.insert(version, sources);
    }
    Ok(RegistrySnapshot { tables })
}

fn load_snapshot(source: &RegistrySource) -> Result<RegistrySnapshot, RegistryError> {
    match source {
        RegistrySource::Builtin => builtin_snapshot(),
        RegistrySource::Directory(dir) => directory_snapshot(dir),
    }
}

/// Process-wide, read-mostly registry of vendors, versions, and mirrors
pub struct VersionRegistry {
    source: RegistrySource,
    snapshot: ArcSwap<RegistrySnapshot>,
}

impl VersionRegistry {
    /// Load from the given source
    pub fn load(source: RegistrySource) -> Result<Self, RegistryError> {
        let snapshot = load_snapshot(&source)?;
        info!(
            "Loaded image content sources for {} version(s) from {}",
            snapshot.tables.len(),
            source
        );
        Ok(Self {
            source,
            snapshot: ArcSwap::from_pointee(snapshot),
        })
    }

    pub fn builtin() -> Result<Self, RegistryError> {
        Self::load(RegistrySource::Builtin)
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        Self::load(RegistrySource::Directory(dir.into()))
    }

    pub fn source(&self) -> &RegistrySource {
        &self.source
    }

    /// Re-read the source and swap the table in one step.
    /// On failure the current table stays in place.
    pub fn reload(&self) -> Result<usize, RegistryError> {
        let snapshot = load_snapshot(&self.source)?;
        let count = snapshot.tables.len();
        self.snapshot.store(Arc::new(snapshot));
        info!("Reloaded image content sources for {} version(s)", count);
        Ok(count)
    }

    /// Consistent view of the current table
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    pub fn supported_vendors(&self) -> &'static [Vendor] {
        &Vendor::ALL
    }

    pub fn supported_versions(&self) -> &'static [OcpVersion] {
        &OcpVersion::ALL
    }

    pub fn vendor_ids(&self) -> Vec<String> {
        Vendor::ALL.iter().map(|v| v.as_str().to_string()).collect()
    }

    pub fn is_supported_vendor(&self, id: &str) -> bool {
        Vendor::parse(id).is_some()
    }

    /// Mirror table for a version id given as text
    pub fn image_content_sources(
        &self,
        version: &str,
    ) -> Result<Vec<ImageContentSource>, GenerationError> {
        let version = OcpVersion::parse(version)?;
        self.sources_for(version)
    }

    /// Mirror table for a typed version
    pub fn sources_for(
        &self,
        version: OcpVersion,
    ) -> Result<Vec<ImageContentSource>, GenerationError> {
        let snapshot = self.snapshot.load();
        snapshot
            .get(version)
            .map(<[ImageContentSource]>::to_vec)
            .ok_or_else(|| GenerationError::MissingVersionData {
                version: version.to_string(),
                location: self.source.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
imageContentSources:
  - source: quay.io/openshift-release-dev/ocp-release
    mirrors:
      - mirror.test/ocp/release
"#;

    #[test]
    fn test_vendor_ids_in_declaration_order() {
        let ids: Vec<_> = Vendor::ALL.iter().map(|v| v.as_str()).collect();
        assert_eq!(ids, vec!["cisco", "dell", "dell-data", "h100-gpu", "h200-gpu"]);
        assert_eq!(Vendor::parse("dell-data"), Some(Vendor::DellData));
        assert_eq!(Vendor::parse("acme"), None);
        assert_eq!(Vendor::H200Gpu.display_name(), "NVIDIA H200 GPU");
    }

    #[test]
    fn test_version_parse() {
        assert_eq!(OcpVersion::parse("4.15").unwrap(), OcpVersion::V4_15);
        let err = OcpVersion::parse("4.99").unwrap_err();
        assert!(matches!(err, GenerationError::UnsupportedVersion { .. }));
        assert!(err.to_string().contains("4.15, 4.16"));
    }

    #[test]
    fn test_max_pods_conversion() {
        assert_eq!(MaxPods::try_from(500).unwrap(), MaxPods::HighDensity);
        assert!(MaxPods::try_from(300).is_err());
        assert_eq!(u32::from(MaxPods::Standard), 250);
        let parsed: MaxPods = serde_json::from_str("500").unwrap();
        assert!(parsed.is_high_density());
    }

    #[test]
    fn test_builtin_has_every_version() {
        let registry = VersionRegistry::builtin().unwrap();
        for version in OcpVersion::ALL {
            let sources = registry.sources_for(version).unwrap();
            assert!(!sources.is_empty());
        }
    }

    #[test]
    fn test_unsupported_version_text() {
        let registry = VersionRegistry::builtin().unwrap();
        let err = registry.image_content_sources("5.0").unwrap_err();
        assert!(matches!(err, GenerationError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_missing_version_data_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("4.16.yaml"), SAMPLE).unwrap();

        let registry = VersionRegistry::from_dir(dir.path()).unwrap();
        assert_eq!(registry.sources_for(OcpVersion::V4_16).unwrap().len(), 1);

        let err = registry.sources_for(OcpVersion::V4_15).unwrap_err();
        assert!(matches!(err, GenerationError::MissingVersionData { .. }));
    }

    #[test]
    fn test_reload_swaps_table() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("4.16.yaml"), SAMPLE).unwrap();
        let registry = VersionRegistry::from_dir(dir.path()).unwrap();
        let before = registry.snapshot();

        std::fs::write(dir.path().join("4.15.yaml"), SAMPLE).unwrap();
        assert_eq!(registry.reload().unwrap(), 2);

        assert_eq!(before.versions(), vec![OcpVersion::V4_16]);
        assert!(registry.sources_for(OcpVersion::V4_15).is_ok());
    }

    #[test]
    fn test_failed_reload_keeps_current_table() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("4.16.yaml"), SAMPLE).unwrap();
        let registry = VersionRegistry::from_dir(dir.path()).unwrap();

        std::fs::write(dir.path().join("4.16.yaml"), "imageContentSources: [oops").unwrap();
        assert!(matches!(registry.reload(), Err(RegistryError::Parse { .. })));
        assert_eq!(registry.sources_for(OcpVersion::V4_16).unwrap().len(), 1);
    }
}
