use async_trait::async_trait;
use confstore_types::{Config, ConfigGroup, GroupedConfig, LabelFilter};

use crate::error::StoreResult;

/// Versioned config storage.
///
/// All implementations must satisfy these invariants:
/// - No two stored configs share `(name, version)`.
/// - `get` returns an owned copy; later mutations of the store never affect it.
/// - Each operation is atomic with respect to concurrent callers.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Insert a new config.
    ///
    /// Fails with `AlreadyExists` if `(config.name, config.version)` is taken.
    async fn create(&self, config: Config) -> StoreResult<()>;

    /// Fetch a config by identity. Fails with `NotFound` if absent.
    async fn get(&self, name: &str, version: i64) -> StoreResult<Config>;

    /// Replace the config at `(name, version)` with `config`.
    ///
    /// `config` may carry a different name and/or version, in which case the
    /// old key is removed and the entry moves to the new key. Fails with
    /// `NotFound` if the old key is absent, and with `AlreadyExists` if the
    /// new key differs from the old one and is already occupied.
    async fn update(&self, name: &str, version: i64, config: Config) -> StoreResult<()>;

    /// Remove a config. Fails with `NotFound` if absent.
    async fn delete(&self, name: &str, version: i64) -> StoreResult<()>;
}

/// Versioned config-group storage.
///
/// All implementations must satisfy these invariants:
/// - No two stored groups share `(name, version)`.
/// - No two members of one group share a name.
/// - Member order is insertion order.
/// - A filter matches a member iff `labels[key] == value`.
#[async_trait]
pub trait ConfigGroupRepository: Send + Sync {
    /// Insert a new group.
    ///
    /// Fails with `AlreadyExists` if the identity is taken, or with
    /// `DuplicateMember` if the initial member list repeats a name.
    async fn create_group(&self, group: ConfigGroup) -> StoreResult<()>;

    /// Fetch a group by identity. Fails with `NotFound` if absent.
    async fn get_group(&self, name: &str, version: i64) -> StoreResult<ConfigGroup>;

    /// Append a member to a group.
    ///
    /// Fails with `NotFound` if the group is absent and with `DuplicateMember`
    /// if a member with the same name exists; the group is unchanged then.
    async fn add_member(&self, name: &str, version: i64, member: GroupedConfig)
        -> StoreResult<()>;

    /// Remove every member matching `filter` and return how many were removed.
    ///
    /// Fails with `NotFound` if the group is absent and with `NoMatch` if no
    /// member matched; the group is unchanged then.
    async fn remove_members_by_filter(
        &self,
        name: &str,
        version: i64,
        filter: &LabelFilter,
    ) -> StoreResult<usize>;

    /// Members matching `filter`, in insertion order. Never mutates.
    ///
    /// Fails with `NotFound` if the group is absent and with `NoMatch` if no
    /// member matched.
    async fn query_members_by_filter(
        &self,
        name: &str,
        version: i64,
        filter: &LabelFilter,
    ) -> StoreResult<Vec<GroupedConfig>>;

    /// Remove a group and all its members. Fails with `NotFound` if absent.
    async fn delete_group(&self, name: &str, version: i64) -> StoreResult<()>;
}
