//! Error types for the introspection API.
//!
//! This module defines the database-layer error taxonomy using `thiserror`.
//! HTTP status mapping lives in [`crate::api::error`], since the same database
//! failure maps to different statuses depending on the endpoint shape.

use thiserror::Error;

/// SQLSTATE raised by PostgreSQL when a referenced relation does not exist.
pub const SQLSTATE_UNDEFINED_TABLE: &str = "42P01";

/// SQLSTATEs PostgreSQL raises while parsing or looking up a relation name.
///
/// The introspection statements are fixed text, so on a lookup these can
/// only come from the caller-supplied name.
pub const SQLSTATES_UNRESOLVABLE_NAME: &[&str] = &[
    SQLSTATE_UNDEFINED_TABLE,
    "42602", // invalid_name
    "42601", // syntax_error (too many dotted names)
    "0A000", // cross-database reference
    "3F000", // invalid_schema_name
    "3D000", // invalid_catalog_name
];

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String, suggestion: String },

    #[error("Query failed: {message}")]
    QueryFailed {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("Invalid identifier: {message}")]
    InvalidIdentifier { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    pub fn invalid_identifier(message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::ConnectionFailed { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// SQLSTATE reported by the backend, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// True when the backend could not turn a name into a relation.
    pub fn is_unresolvable_name(&self) -> bool {
        self.sql_state()
            .is_some_and(|state| SQLSTATES_UNRESOLVABLE_NAME.contains(&state))
    }

    /// Reclassify any failure that happened while obtaining a connection.
    ///
    /// Driver errors raised before a session exists (bad credentials, unknown
    /// database) arrive as `Database` errors; from the caller's point of view
    /// they are all connection failures.
    pub fn into_connection_failure(self) -> Self {
        match self {
            Self::QueryFailed { message, .. } | Self::Internal { message } => Self::connection(
                message,
                "Check the connection string, credentials and database server status",
            ),
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::query(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => DbError::query("No rows returned", None),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out waiting for a pooled connection",
                "Increase --max-connections or --connect-timeout",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "The server is shutting down")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
