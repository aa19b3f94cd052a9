//! CLI module for mcegen
//!
//! Subcommands:
//! - `mcegen serve` - Run the HTTP API
//! - `mcegen generate` - Generate a cluster document, optionally committing it
//! - `mcegen preview` - Print a summary and the generated document
//! - `mcegen vendors|versions|defaults|sites` - Show the catalogue
//! - `mcegen flavors` - List, inspect and generate from flavors

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

use crate::config::SettingsOverrides;
use crate::service::{ClusterRequest, VendorConfigRequest};

#[derive(Parser, Debug)]
#[command(name = "mcegen")]
#[command(about = "Generate MCE nodepool cluster configurations")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to settings file (default: ~/.mcegen/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a .env file loaded before anything else
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),

    /// Generate a cluster configuration
    Generate(GenerateArgs),

    /// Show a summary and the generated document without writing anything
    Preview(ClusterArgs),

    /// List supported vendors
    Vendors,

    /// List supported OCP versions
    Versions,

    /// Show default and optional configs
    Defaults,

    /// List configured sites
    Sites,

    /// Work with cluster flavors
    Flavors(FlavorsArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Bind address for the server
    #[arg(long, env = "MCEGEN_BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Port to listen on (default: 8000)
    #[arg(short, long, env = "MCEGEN_PORT")]
    pub port: Option<u16>,

    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub gitops: GitOpsArgs,
}

impl ServeArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            bind_addr: self.bind_addr.clone(),
            port: self.port,
            data_dir: self.data.data_dir.clone(),
            ..self.gitops.overrides()
        }
    }
}

/// Data directory override shared by commands that read registry data
#[derive(Args, Debug, Default)]
pub struct DataArgs {
    /// Directory holding image_content_sources/ and flavors/
    #[arg(long, value_name = "DIR", env = "MCEGEN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// GitOps repository overrides
#[derive(Args, Debug, Default)]
pub struct GitOpsArgs {
    /// Local checkout of the GitOps repository
    #[arg(long, value_name = "DIR", env = "GITOPS_REPO_PATH")]
    pub repo_path: Option<PathBuf>,

    /// Remote URL, cloned into --repo-path when it is absent
    #[arg(long, value_name = "URL", env = "GITOPS_REPO_URL")]
    pub remote_url: Option<String>,

    #[arg(long, value_name = "FILE", env = "GIT_SSH_KEY_PATH", hide = true)]
    pub ssh_key_path: Option<PathBuf>,

    #[arg(long, env = "GIT_USERNAME", hide = true)]
    pub git_username: Option<String>,

    #[arg(long, env = "GIT_PASSWORD", hide = true, hide_env_values = true)]
    pub git_password: Option<String>,
}

impl GitOpsArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            repo_path: self.repo_path.clone(),
            remote_url: self.remote_url.clone(),
            ssh_key_path: self.ssh_key_path.clone(),
            username: self.git_username.clone(),
            password: self.git_password.clone(),
            ..SettingsOverrides::default()
        }
    }
}

/// Cluster inputs shared by generate and preview
#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// Cluster name (DNS label)
    #[arg(long)]
    pub cluster_name: String,

    /// Deployment site
    #[arg(long)]
    pub site: String,

    /// Vendor entry as VENDOR:NODES[:INFRA_ENV], repeatable
    #[arg(long = "vendor", value_name = "VENDOR:NODES[:INFRA_ENV]", required = true, value_parser = parse_vendor_spec)]
    pub vendors: Vec<VendorConfigRequest>,

    /// OCP version (default from settings)
    #[arg(long)]
    pub ocp_version: Option<String>,

    /// Base DNS domain (default from settings)
    #[arg(long)]
    pub dns_domain: Option<String>,

    /// Max pods per node: 250 or 500
    #[arg(long)]
    pub max_pods: Option<u32>,

    /// Include the 98-var-lib-containers config
    #[arg(long)]
    pub var_lib_containers: bool,

    /// Include the ringsize config
    #[arg(long)]
    pub ringsize: bool,

    /// Extra machine config name, repeatable
    #[arg(long = "custom-config", value_name = "NAME")]
    pub custom_configs: Vec<String>,

    #[command(flatten)]
    pub data: DataArgs,
}

impl ClusterArgs {
    pub fn to_request(&self) -> ClusterRequest {
        let mut request =
            ClusterRequest::new(&self.cluster_name, &self.site, self.vendors.clone());
        request.ocp_version = self.ocp_version.clone();
        request.dns_domain = self.dns_domain.clone();
        request.max_pods = self.max_pods;
        request.include_var_lib_containers = self.var_lib_containers;
        request.include_ringsize = self.ringsize;
        request.custom_configs = self.custom_configs.clone();
        request
    }
}

/// Output options shared by the generating commands
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Write the document to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Commit the document to the GitOps repository
    #[arg(long, conflicts_with = "dry_run")]
    pub commit: bool,

    /// Show where the document would be committed without writing anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub gitops: GitOpsArgs,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl GenerateArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            data_dir: self.cluster.data.data_dir.clone(),
            ..self.output.gitops.overrides()
        }
    }
}

/// Arguments for the flavors command
#[derive(Parser, Debug)]
pub struct FlavorsArgs {
    #[command(subcommand)]
    pub action: FlavorsAction,

    #[command(flatten)]
    pub data: DataArgs,
}

#[derive(Subcommand, Debug)]
pub enum FlavorsAction {
    /// List available flavors
    #[command(visible_alias = "ls")]
    List,

    /// Show a flavor's vendors and flags
    Show {
        /// Flavor name
        name: String,
    },

    /// Generate a cluster from a flavor
    Generate {
        /// Flavor name
        name: String,

        #[arg(long)]
        cluster_name: String,

        #[arg(long)]
        site: String,

        #[arg(long)]
        dns_domain: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

impl FlavorsArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        let base = match &self.action {
            FlavorsAction::Generate { output, .. } => output.gitops.overrides(),
            _ => SettingsOverrides::default(),
        };
        SettingsOverrides {
            data_dir: self.data.data_dir.clone(),
            ..base
        }
    }
}

/// Parse `VENDOR:NODES[:INFRA_ENV]`; the infra env defaults to `{vendor}-infra`
pub fn parse_vendor_spec(value: &str) -> Result<VendorConfigRequest, String> {
    let mut parts = value.splitn(3, ':');
    let vendor = parts.next().unwrap_or_default().trim();
    if vendor.is_empty() {
        return Err(format!("missing vendor in '{value}'"));
    }
    let nodes = parts
        .next()
        .ok_or_else(|| format!("expected VENDOR:NODES[:INFRA_ENV], got '{value}'"))?
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid node count in '{value}': {e}"))?;
    let infra_env = match parts.next().map(str::trim) {
        Some(env) if !env.is_empty() => env.to_string(),
        _ => format!("{vendor}-infra"),
    };
    Ok(VendorConfigRequest::new(vendor, nodes, infra_env))
}
