//! HTTP-facing errors.
//!
//! Every failure body is a JSON object with `status: "not ok"`; all but the
//! health probe also carry a `message`.

use crate::error::DbError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

pub const MSG_QUERY_FAILED: &str = "error while executing query";
pub const MSG_CONNECTION_FAILED: &str = "could not connect to database";
pub const MSG_QUERY_TIMEOUT: &str = "query timed out";
pub const MSG_TABLE_NOT_FOUND: &str = "table not found";
pub const MSG_RECORDS_NOT_FOUND: &str = "records for table not found";
pub const MSG_TABLE_NAME_REQUIRED: &str = "please enter a table name";
pub const MSG_RECORDS_TABLE_NAME_REQUIRED: &str = "please provide a table name";
pub const MSG_ROUTE_NOT_FOUND: &str = "not found";
pub const MSG_METHOD_NOT_ALLOWED: &str = "method not allowed";

/// The `{status, message}` envelope shared by every JSON status body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusBody {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    pub fn not_ok(message: Option<String>) -> Self {
        Self {
            status: "not ok",
            message,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("internal error: {message}")]
    Internal { message: String },

    /// Health probe failure; the body reuses `status` for the verdict.
    #[error("database is not healthy")]
    Unhealthy,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Map a failure on a collection endpoint. Nothing is "not found" here.
    pub fn from_list_failure(err: &DbError) -> Self {
        match err {
            DbError::ConnectionFailed { .. } => Self::internal(MSG_CONNECTION_FAILED),
            DbError::Timeout { .. } => Self::internal(MSG_QUERY_TIMEOUT),
            _ => Self::internal(MSG_QUERY_FAILED),
        }
    }

    /// Map a failure on a single-table endpoint.
    ///
    /// A name the backend cannot resolve to a relation (missing, malformed,
    /// unknown schema) is reported as `not_found`; every other query failure
    /// stays a 500.
    pub fn from_lookup_failure(err: &DbError, not_found: &str) -> Self {
        match err {
            DbError::QueryFailed { .. } if err.is_unresolvable_name() => Self::not_found(not_found),
            DbError::InvalidIdentifier { .. } => Self::not_found(not_found),
            other => Self::from_list_failure(other),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal { .. } | Self::Unhealthy => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> StatusBody {
        match self {
            Self::BadRequest { message }
            | Self::NotFound { message }
            | Self::Internal { message } => StatusBody::not_ok(Some(message.clone())),
            Self::MethodNotAllowed => StatusBody::not_ok(Some(MSG_METHOD_NOT_ALLOWED.to_string())),
            Self::Unhealthy => StatusBody::not_ok(None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
