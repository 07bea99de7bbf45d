use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use confstore_store::StoreError;
use confstore_types::TypeError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid filter: {0}")]
    Filter(#[from] TypeError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Store(err) => match err {
                StoreError::NotFound { .. } | StoreError::NoMatch { .. } => StatusCode::NOT_FOUND,
                StoreError::AlreadyExists { .. }
                | StoreError::DuplicateMember { .. }
                | StoreError::Conflict(_) => StatusCode::CONFLICT,
                StoreError::Backend(_) => StatusCode::BAD_GATEWAY,
                StoreError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Filter(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
