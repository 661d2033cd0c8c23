//! drctl Protocol Buffers
//!
//! Generated protobuf code for the drctl control-plane API.
//!
//! This crate contains:
//! - `JobService` for scheduling and listing backup/recovery jobs

#![allow(clippy::derive_partial_eq_without_eq)]

/// drctl v1 API definitions.
pub mod v1 {
    tonic::include_proto!("drctl.v1");
}

// Re-export v1 as the default API version for convenience
pub use v1::*;

// Re-export prost_types so callers can build `Timestamp` values
pub use prost_types;
