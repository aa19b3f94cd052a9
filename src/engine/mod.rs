//! # Configuration assembly engine
//!
//! Derives a complete nodepool/machine-config document from a small input
//! record. Leaves first:
//!
//! - [`registry`]: supported vendors and versions, per-version mirror tables
//! - [`names`]: machine-config name derivation
//! - [`nodepool`]: one nodepool per vendor entry
//! - [`cluster`]: the orchestrator tying the above into one document
//! - [`document`]: deterministic YAML rendering and parsing
//!
//! The engine is synchronous and holds no mutable state apart from the
//! registry's swappable snapshot, so one [`ClusterAssembler`] can serve any
//! number of concurrent callers.

pub mod cluster;
pub mod document;
pub mod error;
pub mod model;
pub mod names;
pub mod nodepool;
pub mod registry;

pub use cluster::{ClusterAssembler, GeneratedCluster};
pub use document::{from_document, to_document, DocumentError};
pub use error::{ErrorKind, GenerationError};
pub use model::{
    AgentLabelSelector, ClusterConfig, ClusterGenerationInput, ConfigRef, DnsConfig, NodePool,
    NodePoolLabels, VendorConfig, DEFAULT_DNS_DOMAIN,
};
pub use names::ConfigOptions;
pub use registry::{
    ImageContentSource, MaxPods, OcpVersion, RegistryError, RegistrySource, Vendor,
    VersionRegistry,
};
