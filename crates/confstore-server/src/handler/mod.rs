//! Request handlers. Each one maps path and body onto a single service call.

pub mod config;
pub mod group;

use axum::response::Json;
use serde_json::{json, Value};

/// Liveness probe. Does not touch the backend.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
