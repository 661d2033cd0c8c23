//! Job scheduling and listing.
//!
//! The scheduler and lister orchestrate four collaborators, each injected as a
//! trait object so tests can swap in in-memory fakes:
//! - [`AgentDirectory`] and [`PluginDirectory`] for read access to registrations
//! - [`StorageProvisioner`] for the per-job bucket and access policy
//! - [`JobStore`] for the transactional job write path and filtered reads

mod error;
mod lister;
mod scheduler;
mod status;

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
mod scheduler_tests;

pub use error::JobError;
pub use lister::{JobLister, JobSummary};
pub use scheduler::{JobScheduler, ScheduleRequest, ScheduledJob, parse_plugin_name};
pub use status::{JobStatus, UnknownJobStatus};

use crate::minio::ProvisionError;
use crate::storage::{Agent, DatabaseError, Job, NewJob, Plugin};

/// Read access to registered agents.
#[tonic::async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Find the live agent for `host`; a missing agent is
    /// [`DatabaseError::NotFound`].
    async fn find_by_host(&self, host: &str) -> Result<Agent, DatabaseError>;
}

/// Read access to the plugins registered per agent.
#[tonic::async_trait]
pub trait PluginDirectory: Send + Sync {
    async fn list_by_agent_host(&self, host: &str) -> Result<Vec<Plugin>, DatabaseError>;
}

/// Provisions the isolated object-store bucket a job writes its artifacts to.
#[tonic::async_trait]
pub trait StorageProvisioner: Send + Sync {
    /// Create `bucket` and bind an access policy scoped to it to `identity`.
    ///
    /// Not transactional with the job insert that follows.
    async fn provision(&self, bucket: &str, identity: &str) -> Result<(), ProvisionError>;
}

/// Transactional create and filtered reads of job records.
#[tonic::async_trait]
pub trait JobStore: Send + Sync {
    /// Persist `job` atomically and return the generated id.
    async fn create(&self, job: &NewJob) -> Result<i64, DatabaseError>;

    async fn list_all(&self) -> Result<Vec<Job>, DatabaseError>;

    async fn list_by_agent_host(&self, host: &str) -> Result<Vec<Job>, DatabaseError>;
}
