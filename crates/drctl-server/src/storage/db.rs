//! Database connection and initialization.

pub use drctl_core::db::DatabaseError;

drctl_core::define_database!(ServerDatabase, "Server database migrations complete");
