//! Errors of the job subsystem and their gRPC status mapping.

use tonic::Status;

use super::status::UnknownJobStatus;
use crate::minio::ProvisionError;
use crate::storage::DatabaseError;

/// A failed schedule or list operation.
///
/// Each variant names the step that failed and carries its cause; the
/// rendered message is the chain clients receive. Store failures render
/// their bare cause, the [`DatabaseError`] itself stays reachable as the
/// source.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid plugin name {0:?}: expected \"repo/name\"")]
    InvalidName(String),

    #[error("agent not found")]
    AgentNotFound,

    #[error("error loading the agent from the DB: {}", .0.detail())]
    LoadAgent(#[source] DatabaseError),

    #[error("error loading the agent's plugins: {}", .0.detail())]
    LoadPlugins(#[source] DatabaseError),

    #[error("plugin not found")]
    PluginNotFound,

    #[error("error provisioning storage: {0}")]
    Provision(#[source] ProvisionError),

    #[error("error adding the job: error adding the job to the DB: {}", .0.detail())]
    AddJob(#[source] DatabaseError),

    #[error("error getting the jobs list: {}", .0.detail())]
    ListJobs(#[source] DatabaseError),

    #[error("error mapping the job status: {0}")]
    Status(#[from] UnknownJobStatus),

    #[error("job id {0} does not fit the wire representation")]
    IdOutOfRange(i64),
}

impl JobError {
    /// Map an agent lookup failure, keeping "not found" apart from store errors.
    pub(crate) fn from_agent_lookup(err: DatabaseError) -> Self {
        if err.is_not_found() {
            Self::AgentNotFound
        } else {
            Self::LoadAgent(err)
        }
    }
}

impl From<JobError> for Status {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidName(_) => Self::invalid_argument(err.to_string()),
            JobError::AgentNotFound | JobError::PluginNotFound => Self::not_found(err.to_string()),
            _ => Self::unknown(err.to_string()),
        }
    }
}
