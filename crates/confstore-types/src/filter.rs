use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::group::GroupedConfig;

/// Exact-match label filter used to select group members.
///
/// A member matches iff its label map contains `key` with a value equal to
/// `value`. A missing key is a non-match, never an error.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelFilter {
    pub key: String,
    pub value: String,
}

impl LabelFilter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns `true` if the member carries this label.
    pub fn matches(&self, member: &GroupedConfig) -> bool {
        member
            .labels
            .get(&self.key)
            .is_some_and(|v| *v == self.value)
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// Parses the textual `key:value` form, splitting on the first `:`.
///
/// The value may itself contain `:`. Either side may be empty.
impl FromStr for LabelFilter {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once(':')
            .ok_or_else(|| TypeError::InvalidFilter(s.to_string()))?;
        Ok(Self::new(key, value))
    }
}
