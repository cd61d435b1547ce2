//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access
//! scoped the way the ingestion pipeline consumes it.

pub mod data_entry;
pub mod schema;
pub mod source;

pub use data_entry::{DataEntryRepository, NewDataEntry};
pub use schema::SchemaRepository;
pub use source::SourceRepository;
