use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Connection settings for a Consul agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsulConfig {
    /// Agent address, `host:port` or a full `http(s)://` URL.
    pub address: String,
    /// ACL token sent as `X-Consul-Token`.
    pub token: Option<String>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8500".into(),
            token: None,
            timeout_ms: 5_000,
        }
    }
}

impl ConsulConfig {
    fn base_url(&self) -> StoreResult<Url> {
        let raw = if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("http://{}", self.address)
        };
        Url::parse(&raw)
            .map_err(|e| StoreError::Backend(format!("invalid consul address {raw:?}: {e}")))
    }
}

/// A KV entry as returned by `GET /v1/kv/{key}`.
#[derive(Clone, Debug, Deserialize)]
pub struct KvPair {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "ModifyIndex")]
    pub modify_index: u64,

    #[serde(rename = "Value", default)]
    pub value: Option<String>, // Base64 encoded
}

impl KvPair {
    /// Raw bytes of the value. A key stored without a value decodes as empty.
    pub fn decoded_value(&self) -> StoreResult<Vec<u8>> {
        match &self.value {
            Some(v) => BASE64.decode(v).map_err(|e| {
                StoreError::Serialization(format!("bad base64 in {}: {e}", self.key))
            }),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Serialize)]
struct TxnOp<'a> {
    #[serde(rename = "KV")]
    kv: &'a KvTxnOp,
}

/// One KV operation inside a `/v1/txn` transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KvTxnOp {
    #[serde(rename = "Verb")]
    pub verb: &'static str,

    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "Value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>, // Base64 encoded

    #[serde(rename = "Index", skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
}

impl KvTxnOp {
    fn new(verb: &'static str, key: impl Into<String>) -> Self {
        Self {
            verb,
            key: key.into(),
            value: None,
            index: None,
        }
    }

    /// Abort unless `key` exists with this `ModifyIndex`.
    pub fn check_index(key: impl Into<String>, index: u64) -> Self {
        Self {
            index: Some(index),
            ..Self::new("check-index", key)
        }
    }

    /// Abort if `key` exists.
    pub fn check_not_exists(key: impl Into<String>) -> Self {
        Self::new("check-not-exists", key)
    }

    pub fn set(key: impl Into<String>, value: &[u8]) -> Self {
        Self {
            value: Some(BASE64.encode(value)),
            ..Self::new("set", key)
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::new("delete", key)
    }
}

/// Thin client for the Consul KV and transaction endpoints.
///
/// The client performs exactly one HTTP request per call and never retries.
#[derive(Clone, Debug)]
pub struct ConsulClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ConsulClient {
    pub fn new(config: ConsulConfig) -> StoreResult<Self> {
        let base = config.base_url()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(StoreError::backend)?;
        Ok(Self {
            http,
            base,
            token: config.token,
        })
    }

    /// The agent base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(super) fn url(&self, prefix: &[&str], key: &str) -> StoreResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Backend(format!("{} cannot be a base url", self.base)))?
            .pop_if_empty()
            .extend(prefix)
            .extend(key.split('/'));
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.header("X-Consul-Token", token),
            None => builder,
        }
    }

    /// Read a key. Returns `Ok(None)` if it does not exist.
    pub async fn get(&self, key: &str) -> StoreResult<Option<KvPair>> {
        let url = self.url(&["v1", "kv"], key)?;
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(StoreError::backend)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let pairs: Vec<KvPair> = response
            .error_for_status()
            .map_err(StoreError::backend)?
            .json()
            .await
            .map_err(StoreError::backend)?;
        Ok(pairs.into_iter().find(|p| p.key == key))
    }

    /// Write `value` at `key` only if its `ModifyIndex` equals `cas`.
    ///
    /// `cas == 0` means "only if the key does not exist". Returns whether the
    /// write was applied.
    pub async fn put_cas(&self, key: &str, value: Vec<u8>, cas: u64) -> StoreResult<bool> {
        let url = self.url(&["v1", "kv"], key)?;
        let applied: bool = self
            .request(reqwest::Method::PUT, url)
            .query(&[("cas", cas)])
            .body(value)
            .send()
            .await
            .map_err(StoreError::backend)?
            .error_for_status()
            .map_err(StoreError::backend)?
            .json()
            .await
            .map_err(StoreError::backend)?;
        debug!(key, cas, applied, "consul put");
        Ok(applied)
    }

    /// Delete `key` only if its `ModifyIndex` equals `cas`.
    pub async fn delete_cas(&self, key: &str, cas: u64) -> StoreResult<bool> {
        let url = self.url(&["v1", "kv"], key)?;
        let applied: bool = self
            .request(reqwest::Method::DELETE, url)
            .query(&[("cas", cas)])
            .send()
            .await
            .map_err(StoreError::backend)?
            .error_for_status()
            .map_err(StoreError::backend)?
            .json()
            .await
            .map_err(StoreError::backend)?;
        debug!(key, cas, applied, "consul delete");
        Ok(applied)
    }

    /// Run `ops` as one atomic transaction.
    ///
    /// Returns `Ok(false)` when Consul rolled the transaction back because a
    /// check failed.
    pub async fn txn(&self, ops: &[KvTxnOp]) -> StoreResult<bool> {
        let url = self.url(&["v1"], "txn")?;
        let body: Vec<TxnOp<'_>> = ops.iter().map(|kv| TxnOp { kv }).collect();
        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await
            .map_err(StoreError::backend)?;
        if response.status() == StatusCode::CONFLICT {
            debug!(ops = ops.len(), "consul txn rolled back");
            return Ok(false);
        }
        response.error_for_status().map_err(StoreError::backend)?;
        debug!(ops = ops.len(), "consul txn committed");
        Ok(true)
    }
}
