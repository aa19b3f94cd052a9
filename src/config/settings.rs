use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{OcpVersion, DEFAULT_DNS_DOMAIN};
use crate::gitops::{
    CommitAuthor, GitCredentials, RepositoryConfig, DEFAULT_AUTHOR_EMAIL, DEFAULT_AUTHOR_NAME,
};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default bind address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

/// Errors while loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(String),
}

/// Complete settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,

    /// Overrides the bundled image-content-source and flavor data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub defaults: DefaultSettings,

    /// Known deployment sites, for listing only
    #[serde(default)]
    pub sites: Vec<String>,

    #[serde(default)]
    pub gitops: GitOpsSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: DEFAULT_PORT,
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSettings {
    #[serde(default = "default_dns_domain")]
    pub dns_domain: String,
    #[serde(default)]
    pub ocp_version: OcpVersion,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            dns_domain: default_dns_domain(),
            ocp_version: OcpVersion::default(),
        }
    }
}

/// GitOps checkout and credentials. Publishing is disabled without `repo_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitOpsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for GitOpsSettings {
    fn default() -> Self {
        Self {
            repo_path: None,
            remote_url: None,
            base_branch: default_base_branch(),
            remote: default_remote(),
            author_name: default_author_name(),
            author_email: default_author_email(),
            ssh_key_path: None,
            username: None,
            password: None,
        }
    }
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_dns_domain() -> String {
    DEFAULT_DNS_DOMAIN.to_string()
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_author_name() -> String {
    DEFAULT_AUTHOR_NAME.to_string()
}

fn default_author_email() -> String {
    DEFAULT_AUTHOR_EMAIL.to_string()
}

/// Values from CLI flags or their environment fallbacks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub bind_addr: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub repo_path: Option<PathBuf>,
    pub remote_url: Option<String>,
    pub ssh_key_path: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
}

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Parse settings from YAML. Empty input yields defaults.
pub fn parse_settings(content: &str) -> Result<Settings, SettingsError> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))
}

/// Expand `~` and `$VAR` in a configured path; unknown variables are left as is
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(&raw).into_owned()),
    }
}

impl Settings {
    /// Layer overrides on top of file values
    pub fn apply(&mut self, overrides: SettingsOverrides) {
        if let Some(bind_addr) = overrides.bind_addr {
            self.server.bind_addr = bind_addr;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if overrides.data_dir.is_some() {
            self.data_dir = overrides.data_dir;
        }
        if overrides.repo_path.is_some() {
            self.gitops.repo_path = overrides.repo_path;
        }
        if overrides.remote_url.is_some() {
            self.gitops.remote_url = overrides.remote_url;
        }
        if overrides.ssh_key_path.is_some() {
            self.gitops.ssh_key_path = overrides.ssh_key_path;
        }
        if overrides.username.is_some() {
            self.gitops.username = overrides.username;
        }
        if overrides.password.is_some() {
            self.gitops.password = overrides.password;
        }
    }

    /// Expand every configured path in place
    pub fn expand_paths(&mut self) {
        self.data_dir = self.data_dir.as_deref().map(expand_path);
        self.gitops.repo_path = self.gitops.repo_path.as_deref().map(expand_path);
        self.gitops.ssh_key_path = self.gitops.ssh_key_path.as_deref().map(expand_path);
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }

    pub fn image_sources_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join("image_content_sources"))
    }

    pub fn flavors_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("flavors"))
    }

    /// Sites with blank entries dropped
    pub fn site_list(&self) -> Vec<String> {
        self.sites
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn commit_author(&self) -> CommitAuthor {
        CommitAuthor {
            name: self.gitops.author_name.clone(),
            email: self.gitops.author_email.clone(),
        }
    }

    /// Checkout settings, or `None` when no repository is configured
    pub fn repository_config(&self) -> Option<RepositoryConfig> {
        let repo_path = self.gitops.repo_path.clone()?;
        Some(RepositoryConfig {
            repo_path,
            remote_url: self.gitops.remote_url.clone(),
            base_branch: self.gitops.base_branch.clone(),
            remote: self.gitops.remote.clone(),
            credentials: GitCredentials {
                ssh_key_path: self.gitops.ssh_key_path.clone(),
                username: self.gitops.username.clone(),
                password: self.gitops.password.clone(),
            },
        })
    }
}
