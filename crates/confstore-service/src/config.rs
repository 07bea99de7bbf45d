use std::sync::Arc;

use confstore_store::{ConfigRepository, StoreResult};
use confstore_types::Config;
use tracing::debug;

/// Pass-through service over a [`ConfigRepository`].
#[derive(Clone)]
pub struct ConfigService {
    repo: Arc<dyn ConfigRepository>,
}

impl ConfigService {
    pub fn new(repo: Arc<dyn ConfigRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_config(&self, config: Config) -> StoreResult<()> {
        debug!(name = %config.name, version = config.version, "create config");
        self.repo.create(config).await
    }

    pub async fn get_config(&self, name: &str, version: i64) -> StoreResult<Config> {
        debug!(name, version, "get config");
        self.repo.get(name, version).await
    }

    pub async fn update_config(
        &self,
        name: &str,
        version: i64,
        config: Config,
    ) -> StoreResult<()> {
        debug!(name, version, to = %config.key(), "update config");
        self.repo.update(name, version, config).await
    }

    pub async fn delete_config(&self, name: &str, version: i64) -> StoreResult<()> {
        debug!(name, version, "delete config");
        self.repo.delete(name, version).await
    }
}

impl std::fmt::Debug for ConfigService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigService").finish_non_exhaustive()
    }
}
