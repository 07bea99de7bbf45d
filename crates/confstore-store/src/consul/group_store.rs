use async_trait::async_trait;
use confstore_types::{ConfigGroup, ConfigKey, GroupedConfig, LabelFilter};
use tracing::debug;

use super::client::ConsulClient;
use super::{decode, encode, name_segment};
use crate::error::{Entity, StoreError, StoreResult};
use crate::traits::ConfigGroupRepository;

const PREFIX: &str = "configGroup";

fn kv_key(key: &ConfigKey) -> String {
    format!("{PREFIX}/{}/{}", name_segment(&key.name), key.version)
}

/// [`ConfigGroupRepository`] stored in Consul KV under
/// `configGroup/{name}/{version}`.
///
/// A group and its members are one KV value. Member mutations are
/// read-modify-write guarded by the value's `ModifyIndex`.
#[derive(Clone, Debug)]
pub struct ConsulConfigGroupStore {
    client: ConsulClient,
}

impl ConsulConfigGroupStore {
    pub fn new(client: ConsulClient) -> Self {
        Self { client }
    }

    /// Read a group together with the index its next write must match.
    async fn read(&self, key: &ConfigKey) -> StoreResult<(ConfigGroup, u64)> {
        match self.client.get(&kv_key(key)).await? {
            Some(pair) => Ok((decode(&pair)?, pair.modify_index)),
            None => Err(StoreError::not_found(Entity::ConfigGroup, key.clone())),
        }
    }

    async fn write(&self, key: &ConfigKey, group: &ConfigGroup, index: u64) -> StoreResult<()> {
        let kv = kv_key(key);
        if !self.client.put_cas(&kv, encode(group)?, index).await? {
            return Err(StoreError::Conflict(kv));
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigGroupRepository for ConsulConfigGroupStore {
    async fn create_group(&self, group: ConfigGroup) -> StoreResult<()> {
        let key = group.key();
        if let Some(member) = group.duplicate_member_name() {
            return Err(StoreError::DuplicateMember {
                group: key,
                member: member.to_string(),
            });
        }
        if !self.client.put_cas(&kv_key(&key), encode(&group)?, 0).await? {
            return Err(StoreError::already_exists(Entity::ConfigGroup, key));
        }
        debug!(%key, members = group.members.len(), "config group created");
        Ok(())
    }

    async fn get_group(&self, name: &str, version: i64) -> StoreResult<ConfigGroup> {
        let (group, _) = self.read(&ConfigKey::new(name, version)).await?;
        Ok(group)
    }

    async fn add_member(
        &self,
        name: &str,
        version: i64,
        member: GroupedConfig,
    ) -> StoreResult<()> {
        let key = ConfigKey::new(name, version);
        let (mut group, index) = self.read(&key).await?;
        if group.has_member(&member.name) {
            return Err(StoreError::DuplicateMember {
                group: key,
                member: member.name,
            });
        }
        let member_name = member.name.clone();
        group.members.push(member);
        self.write(&key, &group, index).await?;
        debug!(group = %key, member = %member_name, "member added");
        Ok(())
    }

    async fn remove_members_by_filter(
        &self,
        name: &str,
        version: i64,
        filter: &LabelFilter,
    ) -> StoreResult<usize> {
        let key = ConfigKey::new(name, version);
        let (mut group, index) = self.read(&key).await?;
        let removed = group.remove_matching(filter);
        if removed == 0 {
            return Err(StoreError::NoMatch {
                group: key,
                filter: filter.clone(),
            });
        }
        self.write(&key, &group, index).await?;
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
        let (group, _) = self.read(&key).await?;
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
        let (_, index) = self.read(&key).await?;
        let kv = kv_key(&key);
        if !self.client.delete_cas(&kv, index).await? {
            return Err(StoreError::Conflict(kv));
        }
        debug!(%key, "config group deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consul::test_support::{client_for, kv_body};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const GROUP_PATH: &str = "/v1/kv/configGroup/G/1";

    fn member(name: &str, env: &str) -> GroupedConfig {
        GroupedConfig::new(name).with_label("env", env)
    }

    fn stored_group() -> ConfigGroup {
        ConfigGroup::new("G", 1)
            .with_member(member("a", "prod"))
            .with_member(member("b", "dev"))
            .with_member(member("c", "prod"))
    }

    async fn serve_group(server: &MockServer, group: &ConfigGroup, modify_index: u64) {
        Mock::given(method("GET"))
            .and(path(GROUP_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(kv_body("configGroup/G/1", modify_index, group)),
            )
            .mount(server)
            .await;
    }

    fn written_group(request: &Request) -> ConfigGroup {
        serde_json::from_slice(&request.body).expect("body is a group")
    }

    #[tokio::test]
    async fn create_group_with_repeated_member_never_writes() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .expect(0)
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        let group = ConfigGroup::new("G", 1)
            .with_member(member("a", "prod"))
            .with_member(member("a", "dev"));
        assert!(matches!(
            store.create_group(group).await.unwrap_err(),
            StoreError::DuplicateMember { .. }
        ));
    }

    #[tokio::test]
    async fn create_existing_group_is_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(GROUP_PATH))
            .and(query_param("cas", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("false"))
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        assert!(matches!(
            store.create_group(ConfigGroup::new("G", 1)).await.unwrap_err(),
            StoreError::AlreadyExists { .. }
        ));
    }

    #[tokio::test]
    async fn get_missing_group_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        assert!(matches!(
            store.get_group("G", 1).await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn add_duplicate_member_never_writes() {
        let server = MockServer::start().await;
        serve_group(&server, &stored_group(), 4).await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .expect(0)
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        assert!(matches!(
            store.add_member("G", 1, member("a", "qa")).await.unwrap_err(),
            StoreError::DuplicateMember { .. }
        ));
    }

    #[tokio::test]
    async fn add_member_appends_with_cas() {
        let server = MockServer::start().await;
        serve_group(&server, &stored_group(), 4).await;
        Mock::given(method("PUT"))
            .and(path(GROUP_PATH))
            .and(query_param("cas", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .expect(1)
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        store.add_member("G", 1, member("d", "qa")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let put = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT")
            .expect("one write");
        let written = written_group(put);
        assert_eq!(written.members.len(), 4);
        assert_eq!(written.members[3].name, "d");
    }

    #[tokio::test]
    async fn add_member_lost_race_is_conflict() {
        let server = MockServer::start().await;
        serve_group(&server, &stored_group(), 4).await;
        Mock::given(method("PUT"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("false"))
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        assert!(matches!(
            store.add_member("G", 1, member("d", "qa")).await.unwrap_err(),
            StoreError::Conflict(_)
        ));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn lost_race_does_not_log_member_added() {
        let server = MockServer::start().await;
        serve_group(&server, &stored_group(), 4).await;
        Mock::given(method("PUT"))
            .and(path(GROUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("false"))
            .mount(&server)
            .await;

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let store = ConsulConfigGroupStore::new(client_for(&server));
        let err = store.add_member("G", 1, member("d", "qa")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(!output.contains("member added"), "unexpected log: {output}");
    }

    #[test]
    fn group_names_are_escaped_into_one_segment() {
        assert_eq!(kv_key(&ConfigKey::new("G", 1)), "configGroup/G/1");
        assert_eq!(kv_key(&ConfigKey::new("x/..", 1)), "configGroup/x%2F../1");
        assert_eq!(kv_key(&ConfigKey::new("..", 2)), "configGroup/%2E%2E/2");
    }

    #[tokio::test]
    async fn remove_by_filter_writes_remaining_members() {
        let server = MockServer::start().await;
        serve_group(&server, &stored_group(), 4).await;
        Mock::given(method("PUT"))
            .and(path(GROUP_PATH))
            .and(query_param("cas", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .expect(1)
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        let removed = store
            .remove_members_by_filter("G", 1, &LabelFilter::new("env", "prod"))
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let requests = server.received_requests().await.unwrap();
        let put = requests
            .iter()
            .find(|r| r.method.as_str() == "PUT")
            .expect("one write");
        let body: Value = serde_json::from_slice(&put.body).unwrap();
        assert_eq!(body["configs"].as_array().unwrap().len(), 1);
        assert_eq!(body["configs"][0]["name"], "b");
    }

    #[tokio::test]
    async fn remove_without_match_never_writes() {
        let server = MockServer::start().await;
        serve_group(&server, &stored_group(), 4).await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .expect(0)
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        assert!(matches!(
            store
                .remove_members_by_filter("G", 1, &LabelFilter::new("env", "staging"))
                .await
                .unwrap_err(),
            StoreError::NoMatch { .. }
        ));
    }

    #[tokio::test]
    async fn query_returns_matches_in_order() {
        let server = MockServer::start().await;
        serve_group(&server, &stored_group(), 4).await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        let found = store
            .query_members_by_filter("G", 1, &LabelFilter::new("env", "prod"))
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn delete_group_uses_modify_index() {
        let server = MockServer::start().await;
        serve_group(&server, &stored_group(), 4).await;
        Mock::given(method("DELETE"))
            .and(path(GROUP_PATH))
            .and(query_param("cas", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .expect(1)
            .mount(&server)
            .await;

        let store = ConsulConfigGroupStore::new(client_for(&server));
        store.delete_group("G", 1).await.unwrap();
    }
}
