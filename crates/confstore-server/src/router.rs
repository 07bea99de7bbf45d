use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use crate::handler::{self, config, group};
use crate::rate_limit::{rate_limit, RateLimiter};
use crate::state::AppState;

/// Build the axum router with all confstore endpoints.
///
/// When `limiter` is set every route, health included, draws from it.
pub fn build_router(state: AppState, limiter: Option<Arc<RateLimiter>>) -> Router {
    let router = Router::new()
        .route("/health", get(handler::health))
        .route("/configs", post(config::create))
        .route(
            "/configs/:name/:version",
            get(config::get).put(config::update).delete(config::delete),
        )
        .route("/configGroups", post(group::create_group))
        .route(
            "/configGroups/:name/:version",
            get(group::get_group).delete(group::delete_group),
        )
        .route("/configGroups/:name/:version/configs", post(group::add_member))
        .route(
            "/configGroups/:name/:version/configs/:filter",
            get(group::query_members).delete(group::remove_members),
        )
        .with_state(state);

    let router = match limiter {
        Some(limiter) => router.layer(middleware::from_fn_with_state(limiter, rate_limit)),
        None => router,
    };
    router.layer(TraceLayer::new_for_http())
}
