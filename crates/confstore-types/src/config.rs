use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key-value parameters carried by configs and group members.
pub type Parameters = BTreeMap<String, String>;

/// Composite `(name, version)` identity shared by [`Config`] and
/// [`ConfigGroup`](crate::ConfigGroup).
///
/// Stores key their maps directly by `ConfigKey`, so uniqueness of a
/// name/version pair is a single lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigKey {
    pub name: String,
    pub version: i64,
}

impl ConfigKey {
    pub fn new(name: impl Into<String>, version: i64) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// A single named, versioned set of parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    pub version: i64,
    #[serde(default)]
    pub parameters: Parameters,
}

impl Config {
    pub fn new(name: impl Into<String>, version: i64) -> Self {
        Self {
            name: name.into(),
            version,
            parameters: Parameters::new(),
        }
    }

    /// Builder-style helper to add a parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// The `(name, version)` identity of this config.
    pub fn key(&self) -> ConfigKey {
        ConfigKey::new(self.name.clone(), self.version)
    }
}
