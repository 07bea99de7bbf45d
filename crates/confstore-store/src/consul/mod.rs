//! Consul KV backed repositories.
//!
//! Entities are stored as JSON under `configs/{name}/{version}` and
//! `configGroup/{name}/{version}`. Every write is conditional on Consul's
//! `ModifyIndex` (check-and-set), so a lost race surfaces as
//! [`StoreError::Conflict`](crate::StoreError::Conflict) instead of a lost
//! update. Renaming a config runs as a single `/v1/txn` transaction.

mod client;
mod config_store;
mod group_store;

pub use client::{ConsulClient, ConsulConfig, KvPair, KvTxnOp};
pub use config_store::ConsulConfigStore;
pub use group_store::ConsulConfigGroupStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreResult;

/// Encode an entity name as exactly one KV path segment.
///
/// `%` and `/` are percent-escaped and a name made only of dots is escaped
/// whole. The result is never a `.` or `..` path segment, and distinct names
/// map to distinct keys.
fn name_segment(name: &str) -> String {
    if !name.is_empty() && name.chars().all(|c| c == '.') {
        return "%2E".repeat(name.len());
    }
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            _ => out.push(c),
        }
    }
    out
}

fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(pair: &KvPair) -> StoreResult<T> {
    let bytes = pair.decoded_value()?;
    Ok(serde_json::from_slice(&bytes)?)
}
