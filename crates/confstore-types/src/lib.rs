//! Foundation types for confstore.
//!
//! This crate provides the entities stored by the configuration service and
//! the small value types used to address and filter them. Every other
//! confstore crate depends on `confstore-types`.
//!
//! # Key Types
//!
//! - [`Config`] -- a named, versioned set of key-value parameters
//! - [`ConfigGroup`] -- a named, versioned collection of [`GroupedConfig`] members
//! - [`GroupedConfig`] -- a group member carrying labels for filtering
//! - [`ConfigKey`] -- the `(name, version)` composite identity of both entities
//! - [`LabelFilter`] -- an exact `key:value` label match

pub mod config;
pub mod error;
pub mod filter;
pub mod group;

pub use config::{Config, ConfigKey, Parameters};
pub use error::TypeError;
pub use filter::LabelFilter;
pub use group::{ConfigGroup, GroupedConfig, Labels};
