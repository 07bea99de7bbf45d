use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use confstore_types::{ConfigGroup, GroupedConfig, LabelFilter};
use serde_json::{json, Value};

use crate::error::ServerResult;
use crate::state::AppState;

type GroupPath = Path<(String, i64)>;
type FilterPath = Path<(String, i64, String)>;

pub async fn create_group(
    State(state): State<AppState>,
    body: Result<Json<ConfigGroup>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<ConfigGroup>)> {
    let Json(group) = body?;
    state.groups.create_group(group.clone()).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_group(
    State(state): State<AppState>,
    path: Result<GroupPath, PathRejection>,
) -> ServerResult<Json<ConfigGroup>> {
    let Path((name, version)) = path?;
    Ok(Json(state.groups.get_group(&name, version).await?))
}

pub async fn delete_group(
    State(state): State<AppState>,
    path: Result<GroupPath, PathRejection>,
) -> ServerResult<StatusCode> {
    let Path((name, version)) = path?;
    state.groups.delete_group(&name, version).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append one member, answering with the group as stored afterwards.
pub async fn add_member(
    State(state): State<AppState>,
    path: Result<GroupPath, PathRejection>,
    body: Result<Json<GroupedConfig>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<ConfigGroup>)> {
    let Path((name, version)) = path?;
    let Json(member) = body?;
    state.groups.add_member(&name, version, member).await?;
    let group = state.groups.get_group(&name, version).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn query_members(
    State(state): State<AppState>,
    path: Result<FilterPath, PathRejection>,
) -> ServerResult<Json<Vec<GroupedConfig>>> {
    let Path((name, version, filter)) = path?;
    let filter: LabelFilter = filter.parse()?;
    Ok(Json(state.groups.query_members(&name, version, &filter).await?))
}

pub async fn remove_members(
    State(state): State<AppState>,
    path: Result<FilterPath, PathRejection>,
) -> ServerResult<Json<Value>> {
    let Path((name, version, filter)) = path?;
    let filter: LabelFilter = filter.parse()?;
    let removed = state.groups.remove_members(&name, version, &filter).await?;
    Ok(Json(json!({ "removed": removed })))
}
