//! # Data Models
//!
//! This module contains all the data models used throughout the Intake API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod data_entry;
pub mod source;
pub mod source_schema;

pub use data_entry::Entity as DataEntry;
pub use source::Entity as Source;
pub use source_schema::Entity as SourceSchema;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "intake".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
