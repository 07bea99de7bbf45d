//! Service layer for confstore.
//!
//! [`ConfigService`] and [`ConfigGroupService`] forward every call verbatim to
//! the repository they were built with. They add no validation, caching, or
//! transformation; their job is to let a transport hold a handle without
//! knowing which backend sits behind it.

pub mod config;
pub mod group;

pub use config::ConfigService;
pub use group::ConfigGroupService;

// Re-export key types
pub use confstore_store::{StoreError, StoreResult};
pub use confstore_types::{Config, ConfigGroup, ConfigKey, GroupedConfig, LabelFilter};
