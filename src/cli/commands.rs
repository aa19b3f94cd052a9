//! Command implementations for the CLI
//!
//! SBIO pattern: Commands return Results, printing is handled by the caller

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::{ClusterArgs, OutputArgs};
use crate::config::{Settings, SettingsError};
use crate::gitops::{ClusterChange, GitRepository, PublishOutcome};
use crate::service::{ClusterService, Generation, ServiceError};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Generation (pure business logic)
// ============================================================================

pub fn generate_cluster(service: &ClusterService, args: &ClusterArgs) -> CommandResult<Generation> {
    Ok(service.generate(&args.to_request())?)
}

pub fn generate_from_flavor(
    service: &ClusterService,
    flavor: &str,
    cluster_name: &str,
    site: &str,
    dns_domain: Option<String>,
) -> CommandResult<Generation> {
    let request = service.flavor_request(flavor, cluster_name, site, dns_domain)?;
    Ok(service.generate(&request)?)
}

/// The change a commit would make, without touching the repository
pub fn planned_change(settings: &Settings, generation: &Generation) -> ClusterChange {
    ClusterChange::for_cluster(
        &generation.input,
        generation.yaml(),
        settings.commit_author(),
    )
}

// ============================================================================
// I/O
// ============================================================================

pub fn write_document(path: &Path, yaml: &str) -> CommandResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CommandError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, yaml).map_err(|source| CommandError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Commit through the repository configured in `settings`
pub fn publish_generation(
    service: &ClusterService,
    settings: &Settings,
    generation: &Generation,
) -> CommandResult<PublishOutcome> {
    let config = settings
        .repository_config()
        .ok_or(ServiceError::GitOpsDisabled)?;
    let sink = GitRepository::new(config);
    Ok(service.publish(&sink, generation, settings.commit_author())?)
}

/// Route a generated document per the output flags; returns text for stdout
pub fn deliver(
    service: &ClusterService,
    settings: &Settings,
    generation: &Generation,
    output: &OutputArgs,
) -> CommandResult<String> {
    if output.dry_run {
        let change = planned_change(settings, generation);
        let mut text = super::format_publish_plan(&change);
        text.push('\n');
        text.push_str(generation.yaml());
        return Ok(text);
    }

    let mut text = match &output.output {
        Some(path) => {
            write_document(path, generation.yaml())?;
            info!("Wrote {}", path.display());
            format!("Wrote {}\n", path.display())
        }
        None => generation.yaml().to_string(),
    };

    if output.commit {
        let outcome = publish_generation(service, settings, generation)?;
        text.push_str(&super::format_publish_outcome(&outcome));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{DataArgs, GitOpsArgs};
    use crate::service::VendorConfigRequest;
    use tempfile::TempDir;

    fn cluster_args() -> ClusterArgs {
        ClusterArgs {
            cluster_name: "c1".to_string(),
            site: "dc1".to_string(),
            vendors: vec![VendorConfigRequest::new("dell", 3, "dell-env")],
            ocp_version: None,
            dns_domain: None,
            max_pods: None,
            var_lib_containers: false,
            ringsize: false,
            custom_configs: Vec::new(),
            data: DataArgs::default(),
        }
    }

    fn output_args() -> OutputArgs {
        OutputArgs {
            output: None,
            commit: false,
            dry_run: false,
            gitops: GitOpsArgs::default(),
        }
    }

    #[test]
    fn test_generate_cluster() {
        let service = ClusterService::builtin().unwrap();
        let generation = generate_cluster(&service, &cluster_args()).unwrap();
        assert_eq!(generation.nodepool_count(), 1);
        assert!(generation.yaml().contains("nm-conf-c1-dell"));
    }

    #[test]
    fn test_generate_from_unknown_flavor() {
        let service = ClusterService::builtin().unwrap();
        let err = generate_from_flavor(&service, "nope", "c1", "dc1", None).unwrap_err();
        assert!(matches!(err, CommandError::Service(ServiceError::Flavor(_))));
    }

    #[test]
    fn test_deliver_to_stdout_and_file() {
        let service = ClusterService::builtin().unwrap();
        let settings = Settings::default();
        let generation = generate_cluster(&service, &cluster_args()).unwrap();

        let text = deliver(&service, &settings, &generation, &output_args()).unwrap();
        assert_eq!(text, generation.yaml());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/c1.yaml");
        let mut output = output_args();
        output.output = Some(path.clone());
        let text = deliver(&service, &settings, &generation, &output).unwrap();
        assert!(text.starts_with("Wrote "));
        assert_eq!(std::fs::read_to_string(path).unwrap(), generation.yaml());
    }

    #[test]
    fn test_deliver_dry_run() {
        let service = ClusterService::builtin().unwrap();
        let settings = Settings::default();
        let generation = generate_cluster(&service, &cluster_args()).unwrap();

        let mut output = output_args();
        output.dry_run = true;
        let text = deliver(&service, &settings, &generation, &output).unwrap();
        assert!(text.contains("add-cluster-c1-dc1"));
        assert!(text.contains("sites/dc1/mce-tenant-cluster/ocp4-c1.yaml"));
        assert!(text.ends_with(generation.yaml()));
    }

    #[test]
    fn test_commit_requires_repository() {
        let service = ClusterService::builtin().unwrap();
        let generation = generate_cluster(&service, &cluster_args()).unwrap();
        let mut output = output_args();
        output.commit = true;

        let err = deliver(&service, &Settings::default(), &generation, &output).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Service(ServiceError::GitOpsDisabled)
        ));
    }

    #[test]
    fn test_commit_into_repository() {
        let dir = TempDir::new().unwrap();
        let service = ClusterService::builtin().unwrap();
        let mut settings = Settings::default();
        settings.gitops.repo_path = Some(dir.path().to_path_buf());
        let generation = generate_cluster(&service, &cluster_args()).unwrap();

        let outcome = publish_generation(&service, &settings, &generation).unwrap();
        assert_eq!(outcome.branch, "add-cluster-c1-dc1");
        assert!(!outcome.pushed);
        assert!(dir
            .path()
            .join("sites/dc1/mce-tenant-cluster/ocp4-c1.yaml")
            .exists());
    }
}
