use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use confstore_types::Config;

use crate::error::ServerResult;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Config>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<Config>)> {
    let Json(config) = body?;
    state.configs.create_config(config.clone()).await?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub async fn get(
    State(state): State<AppState>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> ServerResult<Json<Config>> {
    let Path((name, version)) = path?;
    Ok(Json(state.configs.get_config(&name, version).await?))
}

/// Replace the config at the path key. The body may carry a different
/// name or version, in which case the entry moves.
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<(String, i64)>, PathRejection>,
    body: Result<Json<Config>, JsonRejection>,
) -> ServerResult<Json<Config>> {
    let Path((name, version)) = path?;
    let Json(config) = body?;
    state
        .configs
        .update_config(&name, version, config.clone())
        .await?;
    Ok(Json(config))
}

pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> ServerResult<StatusCode> {
    let Path((name, version)) = path?;
    state.configs.delete_config(&name, version).await?;
    Ok(StatusCode::NO_CONTENT)
}
