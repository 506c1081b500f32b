//! Data models for the introspection API.
//!
//! This module contains the descriptors that are serialized into responses.

pub mod schema;

pub use schema::{ColumnDescriptor, TableDescriptor, TableDetail};
