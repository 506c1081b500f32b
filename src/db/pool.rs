//! Connection provisioning.
//!
//! Handlers obtain a connection with [`ConnectionSource::acquire`] and must
//! hand it back with [`DbConnection::release`] on every exit path. The direct
//! strategy opens a new session per request and closes it on release; the
//! pooled strategy leases sessions from a lazily-connected `PgPool`.

use crate::config::{ConnectionStrategy, DatabaseConfig};
use crate::error::{DbError, DbResult};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, PgPool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const APPLICATION_NAME: &str = "pg-inspect-api";

/// Where request handlers get their database sessions from.
#[derive(Debug, Clone)]
pub enum ConnectionSource {
    Direct {
        options: PgConnectOptions,
        connect_timeout: Duration,
    },
    Pooled(PgPool),
}

impl ConnectionSource {
    /// Build a connection source from validated configuration.
    ///
    /// No connection is opened here; the pooled strategy connects lazily so
    /// the server can start while the database is still unavailable.
    pub fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        let options = PgConnectOptions::from_str(&config.connection_string)
            .map_err(DbError::from)?
            .application_name(APPLICATION_NAME);

        let source = match config.strategy {
            ConnectionStrategy::Direct => Self::Direct {
                options,
                connect_timeout: config.connect_timeout,
            },
            ConnectionStrategy::Pooled => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(0)
                    .acquire_timeout(config.connect_timeout)
                    .test_before_acquire(true)
                    .connect_lazy_with(options);
                Self::Pooled(pool)
            }
        };

        info!(
            strategy = %source.strategy(),
            database = ?config.database,
            "Connection source ready"
        );
        Ok(source)
    }

    pub fn strategy(&self) -> ConnectionStrategy {
        match self {
            Self::Direct { .. } => ConnectionStrategy::Direct,
            Self::Pooled(_) => ConnectionStrategy::Pooled,
        }
    }

    /// Obtain a connection. Every failure is reported as `ConnectionFailed`.
    pub async fn acquire(&self) -> DbResult<DbConnection> {
        match self {
            Self::Direct {
                options,
                connect_timeout,
            } => {
                let conn = timeout(*connect_timeout, PgConnection::connect_with(options))
                    .await
                    .map_err(|_| {
                        DbError::connection(
                            format!(
                                "Connection timed out after {}s",
                                connect_timeout.as_secs()
                            ),
                            "Check that the database server is reachable",
                        )
                    })?
                    .map_err(|e| DbError::from(e).into_connection_failure())?;
                debug!("Opened direct database connection");
                Ok(DbConnection::Direct(conn))
            }
            Self::Pooled(pool) => {
                let conn = pool
                    .acquire()
                    .await
                    .map_err(|e| DbError::from(e).into_connection_failure())?;
                debug!(
                    size = pool.size(),
                    idle = pool.num_idle(),
                    "Leased pooled database connection"
                );
                Ok(DbConnection::Pooled(conn))
            }
        }
    }

    /// Close the source. Pooled connections are closed; direct ones have
    /// nothing shared to tear down.
    pub async fn close(&self) {
        if let Self::Pooled(pool) = self {
            pool.close().await;
            info!("Connection pool closed");
        }
    }
}

/// A connection held for the duration of one request.
///
/// Dropping it without calling [`release`](Self::release) still closes the
/// socket (direct) or returns it to the pool (pooled), but without a clean
/// protocol-level goodbye.
#[derive(Debug)]
pub enum DbConnection {
    Direct(PgConnection),
    Pooled(PoolConnection<Postgres>),
}

impl DbConnection {
    /// Get the underlying session.
    pub fn conn(&mut self) -> &mut PgConnection {
        match self {
            Self::Direct(conn) => conn,
            Self::Pooled(conn) => &mut **conn,
        }
    }

    /// Release the connection. Must be called exactly once.
    pub async fn release(self) {
        match self {
            Self::Direct(conn) => {
                if let Err(e) = conn.close().await {
                    warn!(error = %e, "Failed to close database connection cleanly");
                } else {
                    debug!("Closed direct database connection");
                }
            }
            Self::Pooled(conn) => drop(conn),
        }
    }
}
