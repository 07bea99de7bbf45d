use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::rate_limit::RateLimiter;
use crate::router::build_router;
use crate::state::AppState;

/// confstore HTTP server.
#[derive(Debug)]
pub struct ConfStoreServer {
    config: ServerConfig,
    state: AppState,
    limiter: Option<Arc<RateLimiter>>,
}

impl ConfStoreServer {
    /// Build the server and its backend. Nothing is bound or contacted yet.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let state = AppState::from_backend(&config.backend)?;
        Ok(Self::with_state(config, state))
    }

    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::new(&config.rate_limit)));
        Self {
            config,
            state,
            limiter,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.limiter.clone())
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_until(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `signal` resolves, then stop accepting and
    /// give in-flight requests up to `shutdown_timeout_secs` to finish.
    pub async fn serve_until<F>(self, listener: TcpListener, signal: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.config.seed_demo_data {
            self.state.seed_demo_data().await?;
        }

        let addr = listener.local_addr()?;
        let (drain_tx, mut drain_rx) = watch::channel(false);
        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = drain_rx.changed().await;
            })
            .into_future();
        tokio::pin!(server);
        info!("confstore server listening on {addr}");

        tokio::select! {
            result = &mut server => {
                return result.map_err(|e| ServerError::Internal(e.to_string()));
            }
            _ = signal => {}
        }

        let grace = Duration::from_secs(self.config.shutdown_timeout_secs);
        info!(?grace, "shutting down");
        let _ = drain_tx.send(true);
        match tokio::time::timeout(grace, server).await {
            Ok(result) => result.map_err(|e| ServerError::Internal(e.to_string())),
            Err(_) => {
                warn!("connections still open after {grace:?}, exiting anyway");
                Ok(())
            }
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
