//! # Intake API Library
//!
//! This library provides the core functionality for the Intake API service:
//! the public data-ingestion endpoint with per-source authentication, dynamic
//! schema validation, duplicate detection, and dual-store persistence.

pub mod auth;
pub mod blob;
pub mod config;
pub mod db;
pub mod dedupe;
pub mod error;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod rate_limit;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod validation;
pub use migration;
