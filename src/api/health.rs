//! Root and health endpoints.

use crate::api::AppState;
use crate::api::error::{ApiError, StatusBody};
use crate::error::DbResult;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

/// `GET /` - empty 200.
pub async fn root() -> StatusCode {
    StatusCode::OK
}

/// `GET /health` - 200 `{"status":"ok"}` when the probe query succeeds.
pub async fn health(State(state): State<AppState>) -> Response {
    match probe(&state).await {
        Ok(()) => (StatusCode::OK, Json(StatusBody::ok())).into_response(),
        Err(e) => {
            warn!(
                error = %e,
                sql_state = ?e.sql_state(),
                suggestion = ?e.suggestion(),
                "Health probe failed"
            );
            ApiError::Unhealthy.into_response()
        }
    }
}

async fn probe(state: &AppState) -> DbResult<()> {
    let mut lease = state.source().acquire().await?;
    let result = state.inspector().ping(lease.conn()).await;
    lease.release().await;
    result
}
