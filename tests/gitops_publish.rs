//! GitOps publishing against real repositories
//!
//! A seeded bare repository stands in for the remote; the checkout is
//! cloned from it on first publish and pushed back.

use std::path::Path;

use git2::{build::RepoBuilder, Repository, RepositoryInitOptions, Signature};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use mcegen::gitops::{CommitAuthor, GitRepository, RepositoryConfig};
use mcegen::service::{ClusterRequest, ClusterService, VendorConfigRequest};

/// Bare remote whose `main` holds one commit with a README
fn seeded_remote(root: &Path) -> (std::path::PathBuf, git2::Oid) {
    let seed_path = root.join("seed");
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    let seed = Repository::init_opts(&seed_path, &options).unwrap();

    std::fs::write(seed_path.join("README.md"), "# gitops\n").unwrap();
    let mut index = seed.index().unwrap();
    index.add_path(Path::new("README.md")).unwrap();
    index.write().unwrap();
    let tree = seed.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("seed", "seed@example.com").unwrap();
    let seed_commit = seed
        .commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .unwrap();

    let bare_path = root.join("remote.git");
    RepoBuilder::new()
        .bare(true)
        .clone(seed_path.to_str().unwrap(), &bare_path)
        .unwrap();
    (bare_path, seed_commit)
}

fn request(nodes: u32) -> ClusterRequest {
    ClusterRequest::new(
        "c1",
        "dc1",
        vec![VendorConfigRequest::new("cisco", nodes, "cisco-env")],
    )
}

#[test]
fn test_publish_clones_commits_and_pushes() {
    let dir = TempDir::new().unwrap();
    let (remote_path, seed_commit) = seeded_remote(dir.path());

    let config = RepositoryConfig::new(dir.path().join("checkout"))
        .with_remote_url(remote_path.to_str().unwrap());
    let sink = GitRepository::new(config);

    let service = ClusterService::builtin().unwrap();
    let generation = service.generate(&request(3)).unwrap();
    let outcome = service
        .publish(&sink, &generation, CommitAuthor::default())
        .unwrap();

    assert!(outcome.pushed);
    assert_eq!(outcome.branch, "add-cluster-c1-dc1");

    let remote = Repository::open_bare(&remote_path).unwrap();
    let pushed = remote
        .find_reference("refs/heads/add-cluster-c1-dc1")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(pushed.id().to_string(), outcome.commit_id);
    assert_eq!(pushed.parent_id(0).unwrap(), seed_commit);
    assert_eq!(pushed.author().name(), Some("MCE Cluster Generator"));
    assert!(pushed
        .message()
        .unwrap()
        .starts_with("Add cluster configuration for c1 in dc1"));

    let entry = pushed
        .tree()
        .unwrap()
        .get_path(Path::new("sites/dc1/mce-tenant-cluster/ocp4-c1.yaml"))
        .unwrap();
    let blob = remote.find_blob(entry.id()).unwrap();
    assert_eq!(std::str::from_utf8(blob.content()).unwrap(), generation.yaml());

    // The README from main is still on the branch
    assert!(pushed.tree().unwrap().get_path(Path::new("README.md")).is_ok());
}

#[test]
fn test_republish_updates_branch() {
    let dir = TempDir::new().unwrap();
    let (remote_path, _) = seeded_remote(dir.path());

    let config = RepositoryConfig::new(dir.path().join("checkout"))
        .with_remote_url(remote_path.to_str().unwrap());
    let service = ClusterService::builtin().unwrap();

    let first = service.generate(&request(3)).unwrap();
    let first_outcome = service
        .publish(&GitRepository::new(config.clone()), &first, CommitAuthor::default())
        .unwrap();

    // Second publish reuses the existing checkout and branch
    let second = service.generate(&request(5)).unwrap();
    let second_outcome = service
        .publish(&GitRepository::new(config), &second, CommitAuthor::default())
        .unwrap();

    assert_ne!(first_outcome.commit_id, second_outcome.commit_id);
    assert!(second_outcome.pushed);

    let remote = Repository::open_bare(&remote_path).unwrap();
    let tip = remote
        .find_reference("refs/heads/add-cluster-c1-dc1")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(tip.id().to_string(), second_outcome.commit_id);
    assert_eq!(tip.parent_id(0).unwrap().to_string(), first_outcome.commit_id);
}

#[test]
fn test_unreachable_remote_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let checkout = dir.path().join("checkout");

    // Local checkout whose origin points nowhere
    let repo = Repository::init(&checkout).unwrap();
    repo.remote("origin", dir.path().join("missing.git").to_str().unwrap())
        .unwrap();

    let service = ClusterService::builtin().unwrap();
    let generation = service.generate(&request(2)).unwrap();
    let outcome = service
        .publish(
            &GitRepository::new(RepositoryConfig::new(&checkout)),
            &generation,
            CommitAuthor::default(),
        )
        .unwrap();

    assert!(!outcome.pushed);
    assert!(checkout
        .join("sites/dc1/mce-tenant-cluster/ocp4-c1.yaml")
        .exists());
}
