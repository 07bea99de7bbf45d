//! Repository contracts and storage backends for confstore.
//!
//! This crate owns the versioning data model's invariants: unique
//! `(name, version)` per config and per group, unique member names within a
//! group, and exact-match label filtering. The transport layer only ever talks
//! to the [`ConfigRepository`] and [`ConfigGroupRepository`] traits.
//!
//! # Storage Backends
//!
//! - [`InMemoryConfigStore`] / [`InMemoryConfigGroupStore`] -- `HashMap`
//!   keyed by [`ConfigKey`](confstore_types::ConfigKey) behind a `RwLock`
//! - [`ConsulConfigStore`] / [`ConsulConfigGroupStore`] -- Consul KV over HTTP,
//!   with check-and-set writes
//!
//! # Design Rules
//!
//! 1. Every mutation touches exactly one logical entry and is atomic.
//! 2. Failures are typed ([`StoreError`]) and never fatal to the process.
//! 3. No retries, caching, or background expiry inside a store.
//! 4. Group members are embedded; deleting a group touches nothing else.

pub mod consul;
pub mod error;
pub mod memory;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use consul::{ConsulClient, ConsulConfig, ConsulConfigGroupStore, ConsulConfigStore};
pub use error::{Entity, StoreError, StoreResult};
pub use memory::{InMemoryConfigGroupStore, InMemoryConfigStore};
pub use traits::{ConfigGroupRepository, ConfigRepository};
