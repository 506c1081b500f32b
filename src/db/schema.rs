//! Schema introspection module.
//!
//! # Architecture
//!
//! SQL text lives in the `queries` submodule. Catalog queries take user input
//! only through bound parameters and cast every output column to `text`.
//! The row dump cannot bind an identifier, so it is built from the catalog's
//! own (schema, table) pair passed through [`quote_ident`], and runs over the
//! simple-query protocol, which returns every value in text format.

use crate::db::types::{TextRow, rows_to_json};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnDescriptor, TableDescriptor};
use serde_json::Value as JsonValue;
use sqlx::{Executor, PgConnection};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

// =============================================================================
// SQL Query Templates
// =============================================================================

pub mod queries {
    /// Liveness probe.
    pub const HEALTH: &str = "SELECT 1";

    /// All user base tables. Order is whatever the backend returns.
    pub const LIST_TABLES: &str = r#"
        SELECT
            t.table_schema::text AS schema,
            t.table_name::text AS table_name,
            pg_catalog.pg_get_userbyid(c.relowner)::text AS owner
        FROM information_schema.tables t
        JOIN pg_catalog.pg_namespace n ON n.nspname = t.table_schema
        JOIN pg_catalog.pg_class c ON c.relnamespace = n.oid AND c.relname = t.table_name
        WHERE t.table_type = 'BASE TABLE'
        AND t.table_schema NOT IN ('pg_catalog', 'information_schema')
        "#;

    /// One user base table by exact name ($1). When several schemas hold a
    /// table with that name, the one earliest on the search path wins.
    pub const FIND_TABLE: &str = r#"
        SELECT
            t.table_schema::text AS schema,
            t.table_name::text AS table_name,
            pg_catalog.pg_get_userbyid(c.relowner)::text AS owner
        FROM information_schema.tables t
        JOIN pg_catalog.pg_namespace n ON n.nspname = t.table_schema
        JOIN pg_catalog.pg_class c ON c.relnamespace = n.oid AND c.relname = t.table_name
        WHERE t.table_type = 'BASE TABLE'
        AND t.table_schema NOT IN ('pg_catalog', 'information_schema')
        AND t.table_name = $1
        ORDER BY
            array_position(pg_catalog.current_schemas(false), t.table_schema::name) NULLS LAST,
            t.table_schema
        LIMIT 1
        "#;

    /// Resolve a relation name ($1) the way `SELECT * FROM <name>` would:
    /// search path, optional schema qualification, case folding of unquoted
    /// names. The exact spelling is tried first so names returned by the
    /// listing always resolve. Only row-bearing relations qualify.
    pub const RESOLVE_RELATION: &str = r#"
        SELECT
            n.nspname::text AS schema,
            c.relname::text AS table_name,
            pg_catalog.pg_get_userbyid(c.relowner)::text AS owner
        FROM pg_catalog.pg_class c
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.oid = COALESCE(
            pg_catalog.to_regclass(pg_catalog.quote_ident($1)),
            pg_catalog.to_regclass($1)
        )
        AND c.relkind IN ('r', 'p', 'v', 'm', 'f')
        "#;

    /// Columns of the table identified by schema ($1) and name ($2).
    pub const LIST_COLUMNS: &str = r#"
        SELECT
            c.column_name::text AS column_name,
            c.data_type::text AS data_type
        FROM information_schema.columns c
        WHERE c.table_schema = $1
        AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#;
}

/// Quote an identifier for inclusion in SQL text.
///
/// Wraps the name in double quotes and doubles any embedded quote, matching
/// PostgreSQL's `quote_ident`. Empty names and names containing NUL are rejected.
pub fn quote_ident(ident: &str) -> DbResult<String> {
    if ident.is_empty() {
        return Err(DbError::invalid_identifier("identifier is empty"));
    }
    if ident.contains('\0') {
        return Err(DbError::invalid_identifier(
            "identifier contains a NUL character",
        ));
    }
    Ok(format!("\"{}\"", ident.replace('"', "\"\"")))
}

/// Build the wildcard row dump for a resolved table.
pub fn select_all_sql(table: &TableDescriptor) -> DbResult<String> {
    Ok(format!(
        "SELECT * FROM {}.{}",
        quote_ident(&table.schema)?,
        quote_ident(&table.table_name)?
    ))
}

// =============================================================================
// Execution
// =============================================================================

/// Runs the introspection queries on a borrowed connection.
///
/// Each call is bounded by the configured query timeout.
#[derive(Debug, Clone, Copy)]
pub struct SchemaInspector {
    query_timeout: Duration,
}

impl SchemaInspector {
    pub fn new(query_timeout: Duration) -> Self {
        Self { query_timeout }
    }

    /// Run the health probe.
    pub async fn ping(&self, conn: &mut PgConnection) -> DbResult<()> {
        self.bounded("health probe", async {
            sqlx::query(queries::HEALTH)
                .execute(&mut *conn)
                .await
                .map(|_| ())
                .map_err(DbError::from)
        })
        .await
    }

    /// List all user base tables.
    pub async fn list_tables(&self, conn: &mut PgConnection) -> DbResult<Vec<TableDescriptor>> {
        let rows = self
            .bounded("list tables", async {
                sqlx::query(queries::LIST_TABLES)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(DbError::from)
            })
            .await?;

        let tables = rows
            .iter()
            .map(TableDescriptor::from_row)
            .collect::<DbResult<Vec<_>>>()?;
        debug!(count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Look a base table up by its exact name.
    pub async fn find_table(
        &self,
        conn: &mut PgConnection,
        table_name: &str,
    ) -> DbResult<Option<TableDescriptor>> {
        let row = self
            .bounded("find table", async {
                sqlx::query(queries::FIND_TABLE)
                    .bind(table_name)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(DbError::from)
            })
            .await?;

        row.as_ref().map(TableDescriptor::from_row).transpose()
    }

    /// Resolve the target of a row dump. `None` when the name does not denote
    /// a table, view or other row-bearing relation.
    pub async fn resolve_relation(
        &self,
        conn: &mut PgConnection,
        name: &str,
    ) -> DbResult<Option<TableDescriptor>> {
        let row = self
            .bounded("resolve relation", async {
                sqlx::query(queries::RESOLVE_RELATION)
                    .bind(name)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(DbError::from)
            })
            .await?;

        row.as_ref().map(TableDescriptor::from_row).transpose()
    }

    /// Enumerate the columns of a resolved table.
    pub async fn list_columns(
        &self,
        conn: &mut PgConnection,
        table: &TableDescriptor,
    ) -> DbResult<Vec<ColumnDescriptor>> {
        let rows = self
            .bounded("list columns", async {
                sqlx::query(queries::LIST_COLUMNS)
                    .bind(&table.schema)
                    .bind(&table.table_name)
                    .fetch_all(&mut *conn)
                    .await
                    .map_err(DbError::from)
            })
            .await?;

        rows.iter().map(ColumnDescriptor::from_row).collect()
    }

    /// Dump every row of a resolved table as text-valued objects.
    pub async fn fetch_records(
        &self,
        conn: &mut PgConnection,
        table: &TableDescriptor,
    ) -> DbResult<Vec<JsonValue>> {
        let sql = select_all_sql(table)?;
        let rows = self
            .bounded("fetch records", async {
                Executor::fetch_all(&mut *conn, sqlx::raw_sql(&sql))
                    .await
                    .map_err(DbError::from)
            })
            .await?;

        let records = rows_to_json(&rows)?;
        debug!(
            table = %table.qualified_name(),
            count = records.len(),
            columns = rows.first().map(|r| r.column_names().len()).unwrap_or(0),
            "Fetched records"
        );
        Ok(records)
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = DbResult<T>>,
    ) -> DbResult<T> {
        tokio::time::timeout(self.query_timeout, fut)
            .await
            .map_err(|_| DbError::timeout(operation, self.query_timeout.as_secs()))?
    }
}
