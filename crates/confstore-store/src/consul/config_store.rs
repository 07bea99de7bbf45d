use async_trait::async_trait;
use confstore_types::{Config, ConfigKey};
use tracing::debug;

use super::client::{ConsulClient, KvTxnOp};
use super::{decode, encode, name_segment};
use crate::error::{Entity, StoreError, StoreResult};
use crate::traits::ConfigRepository;

const PREFIX: &str = "configs";

fn kv_key(key: &ConfigKey) -> String {
    format!("{PREFIX}/{}/{}", name_segment(&key.name), key.version)
}

/// [`ConfigRepository`] stored in Consul KV under `configs/{name}/{version}`.
#[derive(Clone, Debug)]
pub struct ConsulConfigStore {
    client: ConsulClient,
}

impl ConsulConfigStore {
    pub fn new(client: ConsulClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigRepository for ConsulConfigStore {
    async fn create(&self, config: Config) -> StoreResult<()> {
        let key = config.key();
        let data = encode(&config)?;
        if !self.client.put_cas(&kv_key(&key), data, 0).await? {
            return Err(StoreError::already_exists(Entity::Config, key));
        }
        debug!(%key, "config created");
        Ok(())
    }

    async fn get(&self, name: &str, version: i64) -> StoreResult<Config> {
        let key = ConfigKey::new(name, version);
        match self.client.get(&kv_key(&key)).await? {
            Some(pair) => decode(&pair),
            None => Err(StoreError::not_found(Entity::Config, key)),
        }
    }

    async fn update(&self, name: &str, version: i64, config: Config) -> StoreResult<()> {
        let old_key = ConfigKey::new(name, version);
        let new_key = config.key();
        let old_kv = kv_key(&old_key);
        let new_kv = kv_key(&new_key);

        let Some(current) = self.client.get(&old_kv).await? else {
            return Err(StoreError::not_found(Entity::Config, old_key));
        };
        let data = encode(&config)?;

        let ops = if new_key == old_key {
            vec![
                KvTxnOp::check_index(&old_kv, current.modify_index),
                KvTxnOp::set(&old_kv, &data),
            ]
        } else {
            vec![
                KvTxnOp::check_index(&old_kv, current.modify_index),
                KvTxnOp::check_not_exists(&new_kv),
                KvTxnOp::delete(&old_kv),
                KvTxnOp::set(&new_kv, &data),
            ]
        };

        if self.client.txn(&ops).await? {
            debug!(from = %old_key, to = %new_key, "config updated");
            return Ok(());
        }

        // Rolled back: work out which check failed.
        if self.client.get(&old_kv).await?.is_none() {
            return Err(StoreError::not_found(Entity::Config, old_key));
        }
        if new_key != old_key && self.client.get(&new_kv).await?.is_some() {
            return Err(StoreError::already_exists(Entity::Config, new_key));
        }
        Err(StoreError::Conflict(old_kv))
    }

    async fn delete(&self, name: &str, version: i64) -> StoreResult<()> {
        let key = ConfigKey::new(name, version);
        let kv = kv_key(&key);
        let Some(current) = self.client.get(&kv).await? else {
            return Err(StoreError::not_found(Entity::Config, key));
        };
        if !self.client.delete_cas(&kv, current.modify_index).await? {
            return Err(StoreError::Conflict(kv));
        }
        debug!(%key, "config deleted");
        Ok(())
    }
}
