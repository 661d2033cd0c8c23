//! drctl Server Library
//!
//! Control plane for disaster-recovery jobs:
//! - `SQLite` storage for agents, plugins and jobs
//! - Job scheduling and listing over injected collaborators
//! - `MinIO` provisioning of one bucket and access policy per job
//! - gRPC `JobService`

pub mod jobs;
pub mod minio;
pub mod server;
pub mod storage;
