//! `drctl` Core Library
//!
//! Shared functionality for `drctl` components:
//! - `SQLite` pool creation, migrations and the shared `DatabaseError`
//! - Configuration resolution and hierarchy
//! - Tracing subscriber initialisation
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
