//! HTTP server for confstore.
//!
//! Exposes the config and config-group services as a JSON REST API, with a
//! process-wide token-bucket rate limit and graceful shutdown. Store errors
//! map onto status codes in [`error::ServerError::status`].

pub mod config;
pub mod error;
pub mod handler;
pub mod rate_limit;
pub mod router;
pub mod server;
pub mod state;

pub use config::{BackendConfig, RateLimitConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use rate_limit::RateLimiter;
pub use server::{shutdown_signal, ConfStoreServer};
pub use state::AppState;
