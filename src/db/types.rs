//! Row-to-JSON translation.
//!
//! Every column value is emitted as a JSON string regardless of its SQL type,
//! and SQL NULL becomes the empty string. Callers must therefore hand us rows
//! whose values are in PostgreSQL's text representation: either columns cast
//! to `text` in SQL, or rows fetched over the simple-query protocol (see
//! [`crate::db::schema`]).

use crate::error::{DbError, DbResult};
use serde_json::{Map, Value as JsonValue};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row};

/// A result row whose values can be read as text.
pub trait TextRow {
    /// Column names in result order.
    fn column_names(&self) -> Vec<String>;

    /// Textual value at `idx`, `None` for SQL NULL.
    fn text_at(&self, idx: usize) -> DbResult<Option<String>>;

    /// Textual value of the named column, NULL rendered as "".
    fn text_by_name(&self, name: &str) -> DbResult<String> {
        let idx = self
            .column_names()
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| DbError::internal(format!("Column '{}' missing from result", name)))?;
        Ok(self.text_at(idx)?.unwrap_or_default())
    }

    /// Convert the row into a JSON object keyed by column name.
    fn to_text_map(&self) -> DbResult<Map<String, JsonValue>> {
        self.column_names()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = self.text_at(idx)?.unwrap_or_default();
                Ok((name, JsonValue::String(value)))
            })
            .collect()
    }
}

impl TextRow for PgRow {
    fn column_names(&self) -> Vec<String> {
        self.columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect()
    }

    fn text_at(&self, idx: usize) -> DbResult<Option<String>> {
        // Unchecked: a text-format value decodes as UTF-8 whatever its column type.
        self.try_get_unchecked::<Option<String>, _>(idx)
            .map_err(DbError::from)
    }
}

/// Translate a multi-row result into a JSON array of objects.
pub fn rows_to_json<R: TextRow>(rows: &[R]) -> DbResult<Vec<JsonValue>> {
    rows.iter()
        .map(|row| row.to_text_map().map(JsonValue::Object))
        .collect()
}
