//! Schema-related data models.
//!
//! This module defines the descriptors returned by the table endpoints. Every
//! field is a string because values are rendered in their textual form.

use crate::db::types::TextRow;
use crate::error::DbResult;
use serde::Serialize;

/// A base table, identified by its (schema, table name, owner) triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub schema: String,
    pub table_name: String,
    pub owner: String,
}

impl TableDescriptor {
    pub fn new(
        schema: impl Into<String>,
        table_name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table_name: table_name.into(),
            owner: owner.into(),
        }
    }

    /// Build a descriptor from a row with `schema`, `table_name` and `owner` columns.
    pub fn from_row<R: TextRow>(row: &R) -> DbResult<Self> {
        Ok(Self {
            schema: row.text_by_name("schema")?,
            table_name: row.text_by_name("table_name")?,
            owner: row.text_by_name("owner")?,
        })
    }

    /// `schema.table` form used in log fields.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table_name)
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
        }
    }

    pub fn from_row<R: TextRow>(row: &R) -> DbResult<Self> {
        Ok(Self {
            column_name: row.text_by_name("column_name")?,
            data_type: row.text_by_name("data_type")?,
        })
    }
}

/// Table info response: the descriptor flattened next to its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDetail {
    #[serde(flatten)]
    pub table: TableDescriptor,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDetail {
    pub fn new(table: TableDescriptor, columns: Vec<ColumnDescriptor>) -> Self {
        Self { table, columns }
    }
}
