use std::sync::Arc;

use confstore_store::{ConfigGroupRepository, StoreResult};
use confstore_types::{ConfigGroup, GroupedConfig, LabelFilter};
use tracing::debug;

/// Pass-through service over a [`ConfigGroupRepository`].
#[derive(Clone)]
pub struct ConfigGroupService {
    repo: Arc<dyn ConfigGroupRepository>,
}

impl ConfigGroupService {
    pub fn new(repo: Arc<dyn ConfigGroupRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_group(&self, group: ConfigGroup) -> StoreResult<()> {
        debug!(name = %group.name, version = group.version, "create group");
        self.repo.create_group(group).await
    }

    pub async fn get_group(&self, name: &str, version: i64) -> StoreResult<ConfigGroup> {
        debug!(name, version, "get group");
        self.repo.get_group(name, version).await
    }

    pub async fn add_member(
        &self,
        name: &str,
        version: i64,
        member: GroupedConfig,
    ) -> StoreResult<()> {
        debug!(name, version, member = %member.name, "add member");
        self.repo.add_member(name, version, member).await
    }

    pub async fn remove_members(
        &self,
        name: &str,
        version: i64,
        filter: &LabelFilter,
    ) -> StoreResult<usize> {
        debug!(name, version, %filter, "remove members");
        self.repo.remove_members_by_filter(name, version, filter).await
    }

    pub async fn query_members(
        &self,
        name: &str,
        version: i64,
        filter: &LabelFilter,
    ) -> StoreResult<Vec<GroupedConfig>> {
        debug!(name, version, %filter, "query members");
        self.repo.query_members_by_filter(name, version, filter).await
    }

    pub async fn delete_group(&self, name: &str, version: i64) -> StoreResult<()> {
        debug!(name, version, "delete group");
        self.repo.delete_group(name, version).await
    }
}

impl std::fmt::Debug for ConfigGroupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigGroupService").finish_non_exhaustive()
    }
}
