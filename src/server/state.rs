use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::config::Settings;
use crate::service::{ClusterService, ServiceError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ClusterService>,
    pub settings: Arc<Settings>,
    /// One lock per GitOps checkout; the engine itself needs none
    repo_locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl AppState {
    pub fn new(service: ClusterService, settings: Settings) -> Self {
        Self {
            service: Arc::new(service),
            settings: Arc::new(settings),
            repo_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn from_settings(settings: Settings) -> Result<Self, ServiceError> {
        let service = ClusterService::from_settings(&settings)?;
        Ok(Self::new(service, settings))
    }

    /// Lock guarding publishes into `repo_path`
    pub fn repo_lock(&self, repo_path: &Path) -> Arc<Mutex<()>> {
        self.repo_locks
            .entry(repo_path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn repo_lock_count(&self) -> usize {
        self.repo_locks.len()
    }
}
