//! `MinIO` object-store administration.
//!
//! Provides:
//! - [`MinioAdmin`], an `aws-sdk-s3` client for bucket creation plus a
//!   `SigV4`-signed reqwest client for the admin policy API, implementing
//!   [`StorageProvisioner`](crate::jobs::StorageProvisioner)

mod client;


pub use client::{MinioAdmin, bucket_policy};

/// Errors that can occur while provisioning job storage.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The client or the request could not be built.
    #[error("object store configuration error: {0}")]
    Config(String),

    /// HTTP request to the object store failed.
    #[error("object store request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An S3 call failed without an HTTP response (connect error, timeout).
    #[error("object store S3 error: {0}")]
    S3(String),

    /// The object store returned a non-success status code.
    #[error("object store API error (status {status}): {body}")]
    Api {
        /// HTTP status code returned by the object store.
        status: u16,
        /// Response body.
        body: String,
    },
}
