//! The job subsystem's collaborator traits, backed by [`ServerDatabase`].

use super::db::{DatabaseError, ServerDatabase};
use super::models::{Agent, Job, Plugin};
use super::queries_jobs::NewJob;
use crate::jobs::{AgentDirectory, JobStore, PluginDirectory};

#[tonic::async_trait]
impl AgentDirectory for ServerDatabase {
    async fn find_by_host(&self, host: &str) -> Result<Agent, DatabaseError> {
        self.get_agent_by_host(host).await
    }
}

#[tonic::async_trait]
impl PluginDirectory for ServerDatabase {
    async fn list_by_agent_host(&self, host: &str) -> Result<Vec<Plugin>, DatabaseError> {
        self.list_plugins_by_agent_host(host).await
    }
}

#[tonic::async_trait]
impl JobStore for ServerDatabase {
    async fn create(&self, job: &NewJob) -> Result<i64, DatabaseError> {
        self.create_job(job).await
    }

    async fn list_all(&self) -> Result<Vec<Job>, DatabaseError> {
        self.list_jobs().await
    }

    async fn list_by_agent_host(&self, host: &str) -> Result<Vec<Job>, DatabaseError> {
        self.list_jobs_by_agent_host(host).await
    }
}
