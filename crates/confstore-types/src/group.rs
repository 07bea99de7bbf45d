use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigKey, Parameters};
use crate::filter::LabelFilter;

/// Labels attached to a group member.
pub type Labels = BTreeMap<String, String>;

/// A member of a [`ConfigGroup`].
///
/// Members are embedded in their group and are not addressable outside it.
/// `name` is unique within one group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedConfig {
    pub name: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub labels: Labels,
}

impl GroupedConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
            labels: Labels::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// A named, versioned, ordered collection of [`GroupedConfig`] members.
///
/// The member list is never null: a missing or `null` list on the wire
/// deserializes to an empty one. Members serialize under `configs`; `members`
/// is accepted on input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigGroup {
    pub name: String,
    pub version: i64,
    #[serde(
        rename = "configs",
        alias = "members",
        default,
        deserialize_with = "deserialize_members"
    )]
    pub members: Vec<GroupedConfig>,
}

fn deserialize_members<'de, D>(deserializer: D) -> Result<Vec<GroupedConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let members: Option<Vec<GroupedConfig>> = Option::deserialize(deserializer)?;
    Ok(members.unwrap_or_default())
}

impl ConfigGroup {
    /// An empty group.
    pub fn new(name: impl Into<String>, version: i64) -> Self {
        Self {
            name: name.into(),
            version,
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: GroupedConfig) -> Self {
        self.members.push(member);
        self
    }

    /// The `(name, version)` identity of this group.
    pub fn key(&self) -> ConfigKey {
        ConfigKey::new(self.name.clone(), self.version)
    }

    /// Look up a member by name.
    pub fn member(&self, name: &str) -> Option<&GroupedConfig> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Returns `true` if a member with this name exists.
    pub fn has_member(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    /// The first member name that appears more than once, if any.
    pub fn duplicate_member_name(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.members.len());
        self.members
            .iter()
            .map(|m| m.name.as_str())
            .find(|name| !seen.insert(*name))
    }

    /// Members matching `filter`, in insertion order.
    pub fn matching<'a>(
        &'a self,
        filter: &'a LabelFilter,
    ) -> impl Iterator<Item = &'a GroupedConfig> + 'a {
        self.members.iter().filter(move |m| filter.matches(m))
    }

    /// Remove every member matching `filter` and return how many were removed.
    ///
    /// The relative order of the remaining members is preserved.
    pub fn remove_matching(&mut self, filter: &LabelFilter) -> usize {
        let before = self.members.len();
        self.members.retain(|m| !filter.matches(m));
        before - self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labelled(name: &str, env: &str) -> GroupedConfig {
        GroupedConfig::new(name).with_label("env", env)
    }

    fn three_member_group() -> ConfigGroup {
        ConfigGroup::new("G", 1)
            .with_member(labelled("a", "prod"))
            .with_member(labelled("b", "dev"))
            .with_member(labelled("c", "prod"))
    }

    #[test]
    fn serializes_members_as_configs() {
        let group = ConfigGroup::new("db_configGroup", 2).with_member(labelled("a", "prod"));
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["name"], "db_configGroup");
        assert_eq!(value["version"], 2);
        assert_eq!(value["configs"][0]["name"], "a");
        assert_eq!(value["configs"][0]["labels"]["env"], "prod");
        assert!(value.get("members").is_none());
    }

    #[test]
    fn accepts_members_alias() {
        let json = r#"{"name":"G","version":1,"members":[{"name":"a"}]}"#;
        let group: ConfigGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.members.len(), 1);
        assert!(group.members[0].labels.is_empty());
    }

    #[test]
    fn null_or_missing_members_become_empty() {
        let missing: ConfigGroup = serde_json::from_str(r#"{"name":"G","version":1}"#).unwrap();
        assert!(missing.members.is_empty());

        let null: ConfigGroup =
            serde_json::from_str(r#"{"name":"G","version":1,"configs":null}"#).unwrap();
        assert!(null.members.is_empty());
    }

    #[test]
    fn member_lookup() {
        let group = three_member_group();
        assert!(group.has_member("b"));
        assert!(!group.has_member("z"));
        assert_eq!(group.member("c").unwrap().labels["env"], "prod");
    }

    #[test]
    fn duplicate_member_detection() {
        assert_eq!(three_member_group().duplicate_member_name(), None);

        let dup = three_member_group().with_member(labelled("b", "prod"));
        assert_eq!(dup.duplicate_member_name(), Some("b"));
    }

    #[test]
    fn matching_preserves_insertion_order() {
        let group = three_member_group();
        let filter = LabelFilter::new("env", "prod");
        let names: Vec<&str> = group.matching(&filter).map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn remove_matching_removes_all_matches() {
        let mut group = three_member_group();
        let filter = LabelFilter::new("env", "prod");
        assert_eq!(group.remove_matching(&filter), 2);
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].name, "b");
        assert_eq!(group.remove_matching(&filter), 0);
    }

    fn arb_member() -> impl Strategy<Value = GroupedConfig> {
        ("[a-e]{1,3}", prop::option::of(prop::sample::select(vec!["prod", "dev", "qa"])))
            .prop_map(|(name, env)| {
                let member = GroupedConfig::new(name);
                match env {
                    Some(env) => member.with_label("env", env),
                    None => member,
                }
            })
    }

    proptest! {
        #[test]
        fn remove_matching_partitions_members(members in prop::collection::vec(arb_member(), 0..12)) {
            let original = ConfigGroup { name: "G".into(), version: 1, members };
            let filter = LabelFilter::new("env", "prod");
            let expected_kept: Vec<GroupedConfig> = original
                .members
                .iter()
                .filter(|m| !filter.matches(m))
                .cloned()
                .collect();
            let matched = original.matching(&filter).count();

            let mut group = original.clone();
            let removed = group.remove_matching(&filter);

            prop_assert_eq!(removed, matched);
            prop_assert_eq!(removed + group.members.len(), original.members.len());
            prop_assert_eq!(group.members, expected_kept);
        }
    }
}
