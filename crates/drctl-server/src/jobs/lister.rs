//! Job listing.

use std::sync::Arc;

use super::{AgentDirectory, JobError, JobStatus, JobStore};
use crate::storage::Job;

/// The listed view of a job. It carries no job name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub id: u32,
    pub agent_host: String,
    pub status: JobStatus,
}

impl TryFrom<Job> for JobSummary {
    type Error = JobError;

    fn try_from(job: Job) -> Result<Self, Self::Error> {
        Ok(Self {
            id: u32::try_from(job.id).map_err(|_| JobError::IdOutOfRange(job.id))?,
            status: job.status.parse()?,
            agent_host: job.agent_host,
        })
    }
}

pub struct JobLister {
    agents: Arc<dyn AgentDirectory>,
    store: Arc<dyn JobStore>,
}

impl JobLister {
    pub fn new(agents: Arc<dyn AgentDirectory>, store: Arc<dyn JobStore>) -> Self {
        Self { agents, store }
    }

    /// List every live job, or only those of `agent_host` when given.
    ///
    /// With a filter the agent is resolved first, so an unknown host is
    /// [`JobError::AgentNotFound`] rather than an empty list.
    pub async fn list(&self, agent_host: Option<&str>) -> Result<Vec<JobSummary>, JobError> {
        let jobs = match agent_host {
            None => self.store.list_all().await.map_err(JobError::ListJobs)?,
            Some(host) => {
                let agent = self
                    .agents
                    .find_by_host(host)
                    .await
                    .map_err(JobError::from_agent_lookup)?;

                self.store
                    .list_by_agent_host(&agent.host)
                    .await
                    .map_err(JobError::ListJobs)?
            }
        };

        jobs.into_iter().map(JobSummary::try_from).collect()
    }
}
