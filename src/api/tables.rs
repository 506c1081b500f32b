//! Table listing, table info and row dump endpoints.
//!
//! Each handler validates its path parameter before touching the database,
//! then acquires a connection, runs its queries and releases the connection
//! before building the response.

use crate::api::AppState;
use crate::api::error::{
    ApiError, ApiResult, MSG_RECORDS_NOT_FOUND, MSG_RECORDS_TABLE_NAME_REQUIRED,
    MSG_TABLE_NAME_REQUIRED, MSG_TABLE_NOT_FOUND,
};
use crate::db::SchemaInspector;
use crate::error::DbResult;
use crate::models::{TableDescriptor, TableDetail};
use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use serde_json::Value as JsonValue;
use sqlx::PgConnection;
use tracing::{debug, warn};

/// `GET /tables`
pub async fn list_tables(State(state): State<AppState>) -> ApiResult<Json<Vec<TableDescriptor>>> {
    let mut lease = state.source().acquire().await.map_err(|e| {
        warn!(
            error = %e,
            suggestion = ?e.suggestion(),
            "Cannot list tables: connection failed"
        );
        ApiError::from_list_failure(&e)
    })?;
    let result = state.inspector().list_tables(lease.conn()).await;
    lease.release().await;

    result.map(Json).map_err(|e| {
        warn!(error = %e, sql_state = ?e.sql_state(), "Failed to list tables");
        ApiError::from_list_failure(&e)
    })
}

/// `GET /tables/{name}`
pub async fn table_info(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<TableDetail>> {
    let name = required_table_name(name, MSG_TABLE_NAME_REQUIRED, MSG_TABLE_NOT_FOUND)?;

    let mut lease = state.source().acquire().await.map_err(|e| {
        warn!(
            table = %name,
            error = %e,
            suggestion = ?e.suggestion(),
            "Cannot describe table: connection failed"
        );
        ApiError::from_lookup_failure(&e, MSG_TABLE_NOT_FOUND)
    })?;
    let result = describe_table(state.inspector(), lease.conn(), &name).await;
    lease.release().await;

    match result {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => {
            debug!(table = %name, "Table not found");
            Err(ApiError::not_found(MSG_TABLE_NOT_FOUND))
        }
        Err(e) => {
            warn!(table = %name, error = %e, sql_state = ?e.sql_state(), "Failed to describe table");
            Err(ApiError::from_lookup_failure(&e, MSG_TABLE_NOT_FOUND))
        }
    }
}

/// `GET /tables/{name}/records`
pub async fn table_records(
    State(state): State<AppState>,
    name: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<JsonValue>>> {
    let name =
        required_table_name(name, MSG_RECORDS_TABLE_NAME_REQUIRED, MSG_RECORDS_NOT_FOUND)?;

    let mut lease = state.source().acquire().await.map_err(|e| {
        warn!(
            table = %name,
            error = %e,
            suggestion = ?e.suggestion(),
            "Cannot fetch records: connection failed"
        );
        ApiError::from_lookup_failure(&e, MSG_RECORDS_NOT_FOUND)
    })?;
    let result = fetch_records(state.inspector(), lease.conn(), &name).await;
    lease.release().await;

    match result {
        Ok(Some(records)) => Ok(Json(records)),
        Ok(None) => {
            debug!(table = %name, "Table not found for records");
            Err(ApiError::not_found(MSG_RECORDS_NOT_FOUND))
        }
        Err(e) => {
            warn!(table = %name, error = %e, sql_state = ?e.sql_state(), "Failed to fetch records");
            Err(ApiError::from_lookup_failure(&e, MSG_RECORDS_NOT_FOUND))
        }
    }
}

/// Extract the table name parameter.
///
/// A blank name is a 400 carrying `missing_message`. A segment that is not
/// valid UTF-8, or a name containing NUL, cannot name any relation and is
/// answered with a 404 carrying `not_found_message` without querying.
fn required_table_name(
    name: Result<Path<String>, PathRejection>,
    missing_message: &str,
    not_found_message: &str,
) -> ApiResult<String> {
    match name {
        Ok(Path(name)) if name.trim().is_empty() => Err(ApiError::bad_request(missing_message)),
        Ok(Path(name)) if name.contains('\0') => {
            debug!(table = %name.escape_debug(), "Table name contains NUL");
            Err(ApiError::not_found(not_found_message))
        }
        Ok(Path(name)) => Ok(name),
        Err(rejection) => {
            debug!(error = %rejection, "Rejected table name parameter");
            Err(ApiError::not_found(not_found_message))
        }
    }
}

async fn describe_table(
    inspector: &SchemaInspector,
    conn: &mut PgConnection,
    name: &str,
) -> DbResult<Option<TableDetail>> {
    let Some(table) = inspector.find_table(conn, name).await? else {
        return Ok(None);
    };
    let columns = inspector.list_columns(conn, &table).await?;
    Ok(Some(TableDetail::new(table, columns)))
}

async fn fetch_records(
    inspector: &SchemaInspector,
    conn: &mut PgConnection,
    name: &str,
) -> DbResult<Option<Vec<JsonValue>>> {
    let Some(table) = inspector.resolve_relation(conn, name).await? else {
        return Ok(None);
    };
    inspector.fetch_records(conn, &table).await.map(Some)
}
