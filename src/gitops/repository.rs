//! libgit2-backed GitOps checkout
//!
//! The repository is opened per publish, so a `GitRepository` is just its
//! settings and is safe to share across threads. Callers serialise publishes
//! to the same path themselves.

use std::path::{Path, PathBuf};

use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    BranchType, Commit, Cred, CredentialType, FetchOptions, PushOptions,
    RemoteCallbacks, Repository, Signature,
};
use tracing::{debug, info, warn};

use super::{validate_relative_path, ClusterChange, GitOpsError, GitOpsSink, PublishOutcome};

/// Authentication for clone and push
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitCredentials {
    pub ssh_key_path: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl GitCredentials {
    fn callbacks(&self) -> RemoteCallbacks<'static> {
        let creds = self.clone();
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            let user = creds
                .username
                .as_deref()
                .or(username_from_url)
                .unwrap_or("git");

            if allowed_types.contains(CredentialType::SSH_KEY) {
                if let Some(key) = &creds.ssh_key_path {
                    return Cred::ssh_key(user, None, key, None);
                }
                return Cred::ssh_key_from_agent(user);
            }

            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let (Some(username), Some(password)) = (&creds.username, &creds.password) {
                    return Cred::userpass_plaintext(username, password);
                }
            }

            Cred::default()
        });
        callbacks
    }
}

/// Where the checkout lives and how to reach its remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub repo_path: PathBuf,
    pub remote_url: Option<String>,
    pub base_branch: String,
    pub remote: String,
    pub credentials: GitCredentials,
}

impl RepositoryConfig {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            remote_url: None,
            base_branch: "main".to_string(),
            remote: "origin".to_string(),
            credentials: GitCredentials::default(),
        }
    }

    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    pub fn with_base_branch(mut self, branch: impl Into<String>) -> Self {
        self.base_branch = branch.into();
        self
    }
}

/// GitOps sink writing into a local checkout
#[derive(Debug, Clone)]
pub struct GitRepository {
    config: RepositoryConfig,
}

impl GitRepository {
    pub fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Open the checkout, cloning or initialising it when absent
    pub fn open(&self) -> Result<Repository, GitOpsError> {
        let path = &self.config.repo_path;

        if path.join(".git").exists() {
            debug!("Opening existing repository at {}", path.display());
            return Ok(Repository::open(path)?);
        }

        if let Some(url) = &self.config.remote_url {
            info!("Cloning {} into {}", url, path.display());
            let mut fetch_options = FetchOptions::new();
            fetch_options.remote_callbacks(self.config.credentials.callbacks());
            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch_options);
            return Ok(builder.clone(url, path)?);
        }

        info!("Initialising new repository at {}", path.display());
        std::fs::create_dir_all(path).map_err(|source| GitOpsError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Repository::init(path)?)
    }

    /// Check out `branch`, creating it from the base branch when needed
    pub fn checkout_branch(&self, repo: &Repository, branch: &str) -> Result<(), GitOpsError> {
        let refname = format!("refs/heads/{branch}");

        let Some(head) = head_commit(repo) else {
            // Unborn repository: the first commit creates the branch.
            debug!("Repository has no commits; {} becomes the first branch", branch);
            repo.set_head(&refname)?;
            return Ok(());
        };

        if repo.find_branch(branch, BranchType::Local).is_ok() {
            warn!("Branch '{}' already exists, checking it out", branch);
        } else {
            let base = self.base_commit(repo).unwrap_or(head);
            repo.branch(branch, &base, false)?;
            info!("Created branch {} from {}", branch, base.id());
        }

        let target = repo.revparse_single(&refname)?;
        repo.checkout_tree(&target, Some(CheckoutBuilder::new().safe()))?;
        repo.set_head(&refname)?;
        Ok(())
    }

    /// Base branch, then `main`, then `master`, local or remote-tracking
    fn base_commit<'r>(&self, repo: &'r Repository) -> Option<Commit<'r>> {
        let candidates = [self.config.base_branch.as_str(), "main", "master"];
        for name in candidates {
            if let Ok(branch) = repo.find_branch(name, BranchType::Local) {
                if let Ok(commit) = branch.get().peel_to_commit() {
                    return Some(commit);
                }
            }
            let remote_name = format!("{}/{}", self.config.remote, name);
            if let Ok(branch) = repo.find_branch(&remote_name, BranchType::Remote) {
                if let Ok(commit) = branch.get().peel_to_commit() {
                    return Some(commit);
                }
            }
        }
        warn!("No main or master branch found, branching from current HEAD");
        None
    }

    /// Write the file and stage it
    fn write_file(
        &self,
        repo: &Repository,
        relative_path: &Path,
        content: &str,
    ) -> Result<(), GitOpsError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitOpsError::BareRepository(self.config.repo_path.clone()))?;
        let full_path = workdir.join(relative_path);

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| GitOpsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&full_path, content).map_err(|source| GitOpsError::Io {
            path: full_path.clone(),
            source,
        })?;

        let mut index = repo.index()?;
        index.add_path(relative_path)?;
        index.write()?;
        debug!("Staged {}", relative_path.display());
        Ok(())
    }

    /// Commit the index; returns the HEAD id unchanged when nothing differs
    fn commit(&self, repo: &Repository, change: &ClusterChange) -> Result<String, GitOpsError> {
        let mut index = repo.index()?;
        let tree_id = index.write_tree()?;
        let parent = head_commit(repo);

        if let Some(parent) = &parent {
            if parent.tree_id() == tree_id {
                warn!("No changes to commit on {}", change.branch);
                return Ok(parent.id().to_string());
            }
        }

        let tree = repo.find_tree(tree_id)?;
        let signature = Signature::now(&change.author.name, &change.author.email)?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let id = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &change.message,
            &tree,
            &parents,
        )?;

        info!("Committed {} on {}", id, change.branch);
        Ok(id.to_string())
    }

    /// Push `branch` to the configured remote
    pub fn push(&self, repo: &Repository, branch: &str) -> Result<(), GitOpsError> {
        let mut remote = repo.find_remote(&self.config.remote)?;

        let mut callbacks = self.config.credentials.callbacks();
        callbacks.push_update_reference(|reference, status| match status {
            Some(message) => Err(git2::Error::from_str(&format!(
                "{reference} rejected: {message}"
            ))),
            None => Ok(()),
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        remote
            .push(&[refspec.as_str()], Some(&mut options))
            .map_err(|e| GitOpsError::PushRejected {
                reference: branch.to_string(),
                message: e.message().to_string(),
            })?;

        info!("Pushed {} to {}", branch, self.config.remote);
        Ok(())
    }
}

impl GitOpsSink for GitRepository {
    fn publish(&self, change: &ClusterChange) -> Result<PublishOutcome, GitOpsError> {
        let relative_path = validate_relative_path(&change.relative_path)?;
        let repo = self.open()?;

        self.checkout_branch(&repo, &change.branch)?;
        self.write_file(&repo, &relative_path, &change.content)?;
        let commit_id = self.commit(&repo, change)?;

        let pushed = if repo.find_remote(&self.config.remote).is_ok() {
            match self.push(&repo, &change.branch) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Push of {} failed: {}", change.branch, e);
                    false
                }
            }
        } else {
            debug!("No remote '{}' configured, skipping push", self.config.remote);
            false
        };

        Ok(PublishOutcome {
            branch: change.branch.clone(),
            file_path: relative_path.display().to_string(),
            commit_id,
            pushed,
        })
    }
}

fn head_commit(repo: &Repository) -> Option<Commit<'_>> {
    repo.head().ok().and_then(|head| head.peel_to_commit().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitops::CommitAuthor;
    use tempfile::TempDir;

    fn change(content: &str) -> ClusterChange {
        ClusterChange {
            branch: "add-cluster-c1-dc1".to_string(),
            relative_path: PathBuf::from("sites/dc1/mce-tenant-cluster/ocp4-c1.yaml"),
            content: content.to_string(),
            message: "Add cluster configuration for c1 in dc1\n".to_string(),
            author: CommitAuthor::default(),
        }
    }

    /// Repository with one commit on `branch`
    fn seeded_repo(dir: &Path, branch: &str) -> git2::Oid {
        let repo = Repository::init(dir).unwrap();
        std::fs::write(dir.join("README.md"), "gitops\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("seed", "seed@example.com").unwrap();
        let refname = format!("refs/heads/{branch}");
        let id = repo
            .commit(Some(&refname), &sig, &sig, "seed", &tree, &[])
            .unwrap();
        repo.set_head(&refname).unwrap();
        id
    }

    #[test]
    fn test_publish_into_new_repository() {
        let dir = TempDir::new().unwrap();
        let sink = GitRepository::new(RepositoryConfig::new(dir.path().join("gitops")));

        let outcome = sink.publish(&change("clusterName: c1\n")).unwrap();
        assert_eq!(outcome.branch, "add-cluster-c1-dc1");
        assert_eq!(outcome.file_path, "sites/dc1/mce-tenant-cluster/ocp4-c1.yaml");
        assert!(!outcome.pushed);

        let repo = Repository::open(dir.path().join("gitops")).unwrap();
        let head = repo.head().unwrap();
        assert_eq!(head.shorthand(), Some("add-cluster-c1-dc1"));
        let commit = head.peel_to_commit().unwrap();
        assert_eq!(commit.id().to_string(), outcome.commit_id);
        assert_eq!(commit.author().name(), Some("MCE Cluster Generator"));
        assert!(commit
            .tree()
            .unwrap()
            .get_path(Path::new("sites/dc1/mce-tenant-cluster/ocp4-c1.yaml"))
            .is_ok());
    }

    #[test]
    fn test_unchanged_content_skips_commit() {
        let dir = TempDir::new().unwrap();
        let sink = GitRepository::new(RepositoryConfig::new(dir.path()));

        let first = sink.publish(&change("clusterName: c1\n")).unwrap();
        let second = sink.publish(&change("clusterName: c1\n")).unwrap();
        assert_eq!(first.commit_id, second.commit_id);

        let third = sink.publish(&change("clusterName: c1\nplatform: agent\n")).unwrap();
        assert_ne!(third.commit_id, second.commit_id);
    }

    #[test]
    fn test_branch_created_from_base() {
        let dir = TempDir::new().unwrap();
        let base = seeded_repo(dir.path(), "main");
        let sink = GitRepository::new(RepositoryConfig::new(dir.path()));

        let outcome = sink.publish(&change("clusterName: c1\n")).unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let commit = repo
            .find_commit(git2::Oid::from_str(&outcome.commit_id).unwrap())
            .unwrap();
        assert_eq!(commit.parent_id(0).unwrap(), base);
        assert!(dir.path().join("README.md").exists());
    }

    #[test]
    fn test_master_fallback_when_base_missing() {
        let dir = TempDir::new().unwrap();
        let base = seeded_repo(dir.path(), "master");
        let sink = GitRepository::new(
            RepositoryConfig::new(dir.path()).with_base_branch("release"),
        );

        let outcome = sink.publish(&change("clusterName: c1\n")).unwrap();
        let repo = Repository::open(dir.path()).unwrap();
        let commit = repo
            .find_commit(git2::Oid::from_str(&outcome.commit_id).unwrap())
            .unwrap();
        assert_eq!(commit.parent_id(0).unwrap(), base);
    }

    #[test]
    fn test_existing_branch_is_reused() {
        let dir = TempDir::new().unwrap();
        seeded_repo(dir.path(), "main");
        let sink = GitRepository::new(RepositoryConfig::new(dir.path()));

        let first = sink.publish(&change("v1\n")).unwrap();
        let second = sink.publish(&change("v2\n")).unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let commit = repo
            .find_commit(git2::Oid::from_str(&second.commit_id).unwrap())
            .unwrap();
        assert_eq!(commit.parent_id(0).unwrap().to_string(), first.commit_id);
    }

    #[test]
    fn test_rejects_escaping_path() {
        let dir = TempDir::new().unwrap();
        let sink = GitRepository::new(RepositoryConfig::new(dir.path()));
        let mut bad = change("x");
        bad.relative_path = PathBuf::from("../outside.yaml");

        assert!(matches!(
            sink.publish(&bad),
            Err(GitOpsError::InvalidPath { .. })
        ));
    }
}
