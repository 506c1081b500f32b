//! HTTP transport for the introspection API.
//!
//! Binds the listener, serves the router with client addresses attached for
//! access logging, and drains in-flight requests on SIGINT/SIGTERM.

use crate::api::{self, AppState};
use crate::db::ConnectionSource;
use crate::error::{DbError, DbResult};
use crate::transport::Transport;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// HTTP transport implementation.
pub struct HttpTransport {
    source: Arc<ConnectionSource>,
    state: AppState,
    /// Host to bind to
    host: String,
    /// Port to bind to
    port: u16,
    /// How long to wait for in-flight requests after a shutdown signal
    shutdown_timeout: Duration,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `source` - Connection source shared with the handlers, closed on shutdown
    /// * `state` - Handler state built around the same source
    /// * `host` - Host address to bind to
    /// * `port` - Port to bind to
    /// * `shutdown_timeout` - Grace period for in-flight requests
    pub fn new(
        source: Arc<ConnectionSource>,
        state: AppState,
        host: impl Into<String>,
        port: u16,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            source,
            state,
            host: host.into(),
            port,
            shutdown_timeout,
        }
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Transport for HttpTransport {
    async fn run(&self) -> DbResult<()> {
        let bind_addr = self.bind_addr();
        let app = api::router(self.state.clone());

        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            DbError::config(format!(
                "Failed to bind to {}: {} (check that the port is available)",
                bind_addr, e
            ))
        })?;

        info!(
            addr = %bind_addr,
            prefix = %self.state.prefix(),
            "API running on port {}",
            self.port
        );

        // Use a notify to coordinate shutdown timing
        let shutdown_notify = Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();

        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        // Stops accepting on the first signal, then waits for in-flight requests
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal);

        // Race between: server draining normally vs forced timeout/second signal after shutdown
        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        self.source.close().await;
                        return Err(DbError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "Waiting for in-flight requests to finish (send signal again to force exit)..."
                );

                tokio::select! {
                    _ = tokio::time::sleep(self.shutdown_timeout) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {
                // Timeout or second signal reached - server will be dropped
            }
        }

        info!("Closing database connections");
        self.source.close().await;

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
