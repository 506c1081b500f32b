//! HTTP API: routes, shared state and middleware.
//!
//! All routes are mounted under a configurable prefix (default `/api`):
//!
//! | Route                   | Handler                  |
//! |-------------------------|--------------------------|
//! | `/`                     | [`health::root`]         |
//! | `/health`               | [`health::health`]       |
//! | `/tables`               | [`tables::list_tables`]  |
//! | `/tables/{name}`        | [`tables::table_info`]   |
//! | `/tables/{name}/records`| [`tables::table_records`]|

pub mod access_log;
pub mod error;
pub mod health;
pub mod tables;

use crate::api::error::{
    ApiError, MSG_RECORDS_TABLE_NAME_REQUIRED, MSG_ROUTE_NOT_FOUND, MSG_TABLE_NAME_REQUIRED,
};
use crate::db::{ConnectionSource, SchemaInspector};
use axum::Router;
use axum::extract::State;
use axum::http::Uri;
use axum::middleware;
use axum::routing::get;
use std::sync::Arc;
use std::time::Duration;

/// State shared by every handler. Immutable after startup.
#[derive(Debug, Clone)]
pub struct AppState {
    source: Arc<ConnectionSource>,
    inspector: SchemaInspector,
    prefix: Arc<str>,
}

impl AppState {
    pub fn new(source: Arc<ConnectionSource>, query_timeout: Duration, prefix: &str) -> Self {
        Self {
            source,
            inspector: SchemaInspector::new(query_timeout),
            prefix: Arc::from(prefix),
        }
    }

    pub fn source(&self) -> &ConnectionSource {
        &self.source
    }

    pub fn inspector(&self) -> &SchemaInspector {
        &self.inspector
    }

    /// Route prefix, empty when mounted at the root.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Build the API router with access logging applied to every route.
pub fn router(state: AppState) -> Router {
    let prefix = state.prefix().to_string();
    let path = |suffix: &str| format!("{prefix}{suffix}");

    let mut router = Router::new()
        .route(&path("/"), get(health::root))
        .route(&path("/health"), get(health::health))
        .route(&path("/tables"), get(tables::list_tables))
        .route(&path("/tables/{name}"), get(tables::table_info))
        .route(&path("/tables/{name}/records"), get(tables::table_records));

    if !prefix.is_empty() {
        router = router.route(&prefix, get(health::root));
    }

    router
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(fallback)
        .layer(middleware::from_fn(access_log::log_request))
        .with_state(state)
}

/// Unmatched paths. Table routes with an empty name segment never reach
/// their handlers, so they are recognized here and answered with a 400.
async fn fallback(State(state): State<AppState>, uri: Uri) -> ApiError {
    let rest = uri.path().strip_prefix(state.prefix()).unwrap_or("");
    match missing_table_name(rest) {
        Some(message) => ApiError::bad_request(message),
        None => ApiError::not_found(MSG_ROUTE_NOT_FOUND),
    }
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// The 400 message for a table route whose name segment is empty, if `rest`
/// is such a route.
fn missing_table_name(rest: &str) -> Option<&'static str> {
    let name_and_tail = rest.strip_prefix("/tables/")?;
    match name_and_tail.split_once('/') {
        None if name_and_tail.trim().is_empty() => Some(MSG_TABLE_NAME_REQUIRED),
        Some((name, "records")) if name.trim().is_empty() => {
            Some(MSG_RECORDS_TABLE_NAME_REQUIRED)
        }
        _ => None,
    }
}
