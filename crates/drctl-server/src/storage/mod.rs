//! `SQLite` storage for the drctl server.
//!
//! Provides persistence for agents, plugins and jobs. Every read excludes
//! soft-deleted rows.

mod db;
mod directory;
mod models;
mod queries;
mod queries_jobs;


pub use db::{DatabaseError, ServerDatabase};
pub use models::*;
pub use queries::{NewAgent, NewPlugin};
pub use queries_jobs::NewJob;
