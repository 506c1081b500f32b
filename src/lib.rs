//! pg-inspect-api Library
//!
//! A thin HTTP adapter exposing read-only introspection of a PostgreSQL
//! database: health probe, table listing, table schema and row dumps, with
//! every value rendered as text.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod transport;

pub use api::{AppState, router};
pub use config::Config;
pub use error::DbError;
