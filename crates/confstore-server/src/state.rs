use std::sync::Arc;

use confstore_service::{ConfigGroupService, ConfigService};
use confstore_store::{
    ConsulClient, ConsulConfigGroupStore, ConsulConfigStore, InMemoryConfigGroupStore,
    InMemoryConfigStore, StoreError,
};
use confstore_types::{Config, ConfigGroup, GroupedConfig};
use tracing::info;

use crate::config::BackendConfig;
use crate::error::ServerResult;

/// Shared handler state: one service per entity kind over the configured
/// backend.
#[derive(Clone, Debug)]
pub struct AppState {
    pub configs: ConfigService,
    pub groups: ConfigGroupService,
}

impl AppState {
    pub fn new(configs: ConfigService, groups: ConfigGroupService) -> Self {
        Self { configs, groups }
    }

    /// State over fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(
            ConfigService::new(Arc::new(InMemoryConfigStore::new())),
            ConfigGroupService::new(Arc::new(InMemoryConfigGroupStore::new())),
        )
    }

    pub fn from_backend(backend: &BackendConfig) -> ServerResult<Self> {
        match backend {
            BackendConfig::Memory => {
                info!("using in-memory backend");
                Ok(Self::in_memory())
            }
            BackendConfig::Consul(consul) => {
                let client = ConsulClient::new(consul.clone())?;
                info!(address = %client.base_url(), "using consul backend");
                Ok(Self::new(
                    ConfigService::new(Arc::new(ConsulConfigStore::new(client.clone()))),
                    ConfigGroupService::new(Arc::new(ConsulConfigGroupStore::new(client))),
                ))
            }
        }
    }

    /// Preload two example configs and a group holding both.
    ///
    /// Entries that already exist are left as they are, so seeding a
    /// persistent backend twice is harmless.
    pub async fn seed_demo_data(&self) -> ServerResult<()> {
        let db_config = Config::new("db_config", 2)
            .with_parameter("username", "pera")
            .with_parameter("port", "5432");
        let second = Config {
            name: "konfiguracija2".into(),
            ..db_config.clone()
        };
        let group = [&db_config, &second].into_iter().fold(
            ConfigGroup::new("db_configGroup", 2),
            |group, config| {
                group.with_member(GroupedConfig {
                    name: config.name.clone(),
                    parameters: config.parameters.clone(),
                    labels: Default::default(),
                })
            },
        );

        for config in [db_config, second] {
            ignore_existing(self.configs.create_config(config).await)?;
        }
        ignore_existing(self.groups.create_group(group).await)?;
        info!("demo data seeded");
        Ok(())
    }
}

fn ignore_existing(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(StoreError::AlreadyExists { .. }) => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_is_repeatable() {
        let state = AppState::in_memory();
        state.seed_demo_data().await.unwrap();
        state.seed_demo_data().await.unwrap();

        let config = state.configs.get_config("konfiguracija2", 2).await.unwrap();
        assert_eq!(config.parameters["username"], "pera");

        let group = state.groups.get_group("db_configGroup", 2).await.unwrap();
        let names: Vec<&str> = group.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["db_config", "konfiguracija2"]);
    }

    #[test]
    fn consul_backend_builds_without_connecting() {
        let backend = BackendConfig::Consul(Default::default());
        assert!(AppState::from_backend(&backend).is_ok());
    }
}
