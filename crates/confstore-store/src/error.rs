use std::fmt;

use confstore_types::{ConfigKey, LabelFilter};

/// The kind of entity a lookup or insert was about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    Config,
    ConfigGroup,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::ConfigGroup => write!(f, "config group"),
        }
    }
}

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Lookup by `(name, version)` found nothing.
    #[error("{entity} {key} not found")]
    NotFound { entity: Entity, key: ConfigKey },

    /// Insert or rename collided with an existing `(name, version)`.
    #[error("{entity} {key} already exists")]
    AlreadyExists { entity: Entity, key: ConfigKey },

    /// A member with this name is already part of the group.
    #[error("config {member:?} already exists in group {group}")]
    DuplicateMember { group: ConfigKey, member: String },

    /// The label filter selected zero members.
    #[error("no configs matching {filter} in group {group}")]
    NoMatch { group: ConfigKey, filter: LabelFilter },

    /// A check-and-set write lost against a concurrent writer.
    #[error("concurrent modification of {0}")]
    Conflict(String),

    /// The backing store failed or is unreachable.
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(entity: Entity, key: ConfigKey) -> Self {
        Self::NotFound { entity, key }
    }

    pub fn already_exists(entity: Entity, key: ConfigKey) -> Self {
        Self::AlreadyExists { entity, key }
    }

    pub(crate) fn backend(err: impl fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
