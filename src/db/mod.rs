//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection provisioning (direct or pooled)
//! - Introspection query construction and execution
//! - Row-to-JSON translation

pub mod pool;
pub mod schema;
pub mod types;

pub use pool::{ConnectionSource, DbConnection};
pub use schema::{SchemaInspector, quote_ident};
pub use types::{TextRow, rows_to_json};
