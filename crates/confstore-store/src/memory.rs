use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use confstore_types::{Config, ConfigGroup, ConfigKey, GroupedConfig, LabelFilter};
use tracing::debug;

use crate::error::{Entity, StoreError, StoreResult};
use crate::traits::{ConfigGroupRepository, ConfigRepository};

fn poisoned<T>(e: PoisonError<T>) -> StoreError {
    StoreError::Backend(format!("lock poisoned: {e}"))
}

/// In-memory, HashMap-based config store.
///
/// Entries are keyed by [`ConfigKey`] behind a `RwLock`: reads share the lock,
/// every mutation holds it exclusively for its whole check-then-write. Data is
/// lost when the store is dropped.
pub struct InMemoryConfigStore {
    configs: RwLock<HashMap<ConfigKey, Config>>,
}

impl InMemoryConfigStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of configs currently stored.
    pub fn len(&self) -> usize {
        self.configs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of all stored identities.
    pub fn keys(&self) -> StoreResult<Vec<ConfigKey>> {
        let map = self.configs.read().map_err(poisoned)?;
        let mut keys: Vec<ConfigKey> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

impl Default for InMemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigRepository for InMemoryConfigStore {
    async fn create(&self, config: Config) -> StoreResult<()> {
        let key = config.key();
        let mut map = self.configs.write().map_err(poisoned)?;
        if map.contains_key(&key) {
            return Err(StoreError::already_exists(Entity::Config, key));
        }
        debug!(%key, "config created");
        map.insert(key, config);
        Ok(())
    }

    async fn get(&self, name: &str, version: i64) -> StoreResult<Config> {
        let key = ConfigKey::new(name, version);
        let map = self.configs.read().map_err(poisoned)?;
        map.get(&key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::Config, key))
    }

    async fn update(&self, name: &str, version: i64, config: Config) -> StoreResult<()> {
        let old_key = ConfigKey::new(name, version);
        let new_key = config.key();
        let mut map = self.configs.write().map_err(poisoned)?;
        if !map.contains_key(&old_key) {
            return Err(StoreError::not_found(Entity::Config, old_key));
        }
        if new_key != old_key && map.contains_key(&new_key) {
            return Err(StoreError::already_exists(Entity::Config, new_key));
        }
        map.remove(&old_key);
        debug!(from = %old_key, to = %new_key, "config updated");
        map.insert(new_key, config);
        Ok(())
    }

    async fn delete(&self, name: &str, version: i64) -> StoreResult<()> {
        let key = ConfigKey::new(name, version);
        let mut map = self.configs.write().map_err(poisoned)?;
        match map.remove(&key) {
            Some(_) => {
                debug!(%key, "config deleted");
                Ok(())
            }
            None => Err(StoreError::not_found(Entity::Config, key)),
        }
    }
}

impl std::fmt::Debug for InMemoryConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryConfigStore")
            .field("config_count", &self.len())
            .finish()
    }
}

/// In-memory, HashMap-based config-group store.
///
/// Same locking discipline as [`InMemoryConfigStore`]. A group and its member
/// list are one map entry, so member mutations are single writes.
pub struct InMemoryConfigGroupStore {
    groups: RwLock<HashMap<ConfigKey, ConfigGroup>>,
}

impl InMemoryConfigGroupStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Number of groups currently stored.
    pub fn len(&self) -> usize {
        self.groups.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn not_found(key: ConfigKey) -> StoreError {
        StoreError::not_found(Entity::ConfigGroup, key)
    }
}

impl Default for InMemoryConfigGroupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigGroupRepository for InMemoryConfigGroupStore {
    async fn create_group(&self, group: ConfigGroup) -> StoreResult<()> {
        let key = group.key();
        if let Some(member) = group.duplicate_member_name() {
            return Err(StoreError::DuplicateMember {
                group: key,
                member: member.to_string(),
            });
        }
        let mut map = self.groups.write().map_err(poisoned)?;
        if map.contains_key(&key) {
            return Err(StoreError::already_exists(Entity::ConfigGroup, key));
        }
        debug!(%key, members = group.members.len(), "config group created");
        map.insert(key, group);
        Ok(())
    }

    async fn get_group(&self, name: &str, version: i64) -> StoreResult<ConfigGroup> {
        let key = ConfigKey::new(name, version);
        let map = self.groups.read().map_err(poisoned)?;
        map.get(&key).cloned().ok_or_else(|| Self::not_found(key))
    }

    async fn add_member(
        &self,
        name: &str,
        version: i64,
        member: GroupedConfig,
    ) -> StoreResult<()> {
        let key = ConfigKey::new(name, version);
        let mut map = self.groups.write().map_err(poisoned)?;
        let Some(group) = map.get_mut(&key) else {
            return Err(Self::not_found(key));
        };
        if group.has_member(&member.name) {
            return Err(StoreError::DuplicateMember {
                group: key,
                member: member.name,
            });
        }
        debug!(group = %key, member = %member.name, "member added");
        group.members.push(member);
        Ok(())
    }

    async fn remove_members_by_filter(
        &self,
        name: &str,
        version: i64,
        filter: &LabelFilter,
    ) -> StoreResult<usize> {
        let key = ConfigKey::new(name, version);
        let mut map = self.groups.write().map_err(poisoned)?;
        let Some(group) = map.get_mut(&key) else {
            return Err(Self::not_found(key));
        };
        let removed = group.remove_matching(filter);
        if removed == 0 {
            return Err(StoreError::NoMatch {
                group: key,
                filter: filter.clone(),
            });
        }
        debug!(group = %key, %filter, removed, "members removed");
        Ok(removed)
    }

    async fn query_members_by_filter(
        &self,
        name: &str,
        version: i64,
        filter: &LabelFilter,
    ) -> StoreResult<Vec<GroupedConfig>> {
        let key = ConfigKey::new(name, version);
        let map = self.groups.read().map_err(poisoned)?;
        let group = map.get(&key).ok_or_else(|| Self::not_found(key.clone()))?;
        let matched: Vec<GroupedConfig> = group.matching(filter).cloned().collect();
        if matched.is_empty() {
            return Err(StoreError::NoMatch {
                group: key,
                filter: filter.clone(),
            });
        }
        Ok(matched)
    }

    async fn delete_group(&self, name: &str, version: i64) -> StoreResult<()> {
        let key = ConfigKey::new(name, version);
        let mut map = self.groups.write().map_err(poisoned)?;
        match map.remove(&key) {
            Some(_) => {
                debug!(%key, "config group deleted");
                Ok(())
            }
            None => Err(Self::not_found(key)),
        }
    }
}

impl std::fmt::Debug for InMemoryConfigGroupStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryConfigGroupStore")
            .field("group_count", &self.len())
            .finish()
    }
}
