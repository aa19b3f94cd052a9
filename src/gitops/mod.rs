//! GitOps sink
//!
//! Publishes a generated document to a GitOps checkout: one branch per
//! cluster/site pair, one file per cluster, one commit per change.
//!
//! SBIO pattern: naming and path rules are pure functions here; all git I/O
//! lives in [`repository`].

pub mod repository;

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::ClusterGenerationInput;

pub use repository::{GitCredentials, GitRepository, RepositoryConfig};

pub const DEFAULT_AUTHOR_NAME: &str = "MCE Cluster Generator";
pub const DEFAULT_AUTHOR_EMAIL: &str = "mce-gen@company.com";

/// Errors from GitOps operations
#[derive(Error, Debug)]
pub enum GitOpsError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid repository path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Repository at {0} has no working directory")]
    BareRepository(PathBuf),

    #[error("Push rejected for {reference}: {message}")]
    PushRejected { reference: String, message: String },
}

/// Commit author identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

impl Default for CommitAuthor {
    fn default() -> Self {
        Self {
            name: DEFAULT_AUTHOR_NAME.to_string(),
            email: DEFAULT_AUTHOR_EMAIL.to_string(),
        }
    }
}

/// Everything needed to publish one file change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterChange {
    pub branch: String,
    pub relative_path: PathBuf,
    pub content: String,
    pub message: String,
    pub author: CommitAuthor,
}

impl ClusterChange {
    /// Change that adds or updates a generated cluster document
    pub fn for_cluster(input: &ClusterGenerationInput, yaml: &str, author: CommitAuthor) -> Self {
        Self {
            branch: branch_name(&input.cluster_name, &input.site),
            relative_path: cluster_file_path(&input.site, &input.cluster_name),
            content: yaml.to_string(),
            message: commit_message(input),
            author,
        }
    }
}

/// What a publish did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub branch: String,
    pub file_path: String,
    pub commit_id: String,
    pub pushed: bool,
}

/// Destination for generated documents
pub trait GitOpsSink: Send + Sync {
    fn publish(&self, change: &ClusterChange) -> Result<PublishOutcome, GitOpsError>;
}

// ============================================================================
// Naming rules
// ============================================================================

pub fn branch_name(cluster_name: &str, site: &str) -> String {
    format!("add-cluster-{cluster_name}-{site}")
}

pub fn cluster_file_path(site: &str, cluster_name: &str) -> PathBuf {
    Path::new("sites")
        .join(site)
        .join("mce-tenant-cluster")
        .join(format!("ocp4-{cluster_name}.yaml"))
}

pub fn commit_message(input: &ClusterGenerationInput) -> String {
    let vendors = input
        .vendor_configs
        .iter()
        .map(|vc| format!("{} ({} nodes)", vc.vendor, vc.number_of_nodes))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Add cluster configuration for {cluster} in {site}\n\n\
         Cluster: {cluster}\n\
         Site: {site}\n\
         Vendors: {vendors}\n\
         OCP Version: {version}\n\
         Max Pods: {max_pods}\n",
        cluster = input.cluster_name,
        site = input.site,
        version = input.ocp_version,
        max_pods = input.max_pods,
    )
}

/// Reject paths that would escape the working tree; returns the path
/// with `.` components dropped
pub fn validate_relative_path(path: &Path) -> Result<PathBuf, GitOpsError> {
    let invalid = |reason: &str| GitOpsError::InvalidPath {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(invalid("'..' is not allowed")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative"))
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(clean)
}
