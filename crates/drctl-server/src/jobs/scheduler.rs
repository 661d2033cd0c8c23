//! Job scheduling.
//!
//! `schedule` is a strictly sequential pipeline: resolve the agent, resolve
//! the plugin, provision storage, then persist. Every step is an abort point
//! and nothing is retried. A job never becomes visible to listers ahead of
//! its bucket. A failed insert leaves the bucket and policy behind; they are
//! logged for cleanup.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{AgentDirectory, JobError, JobStatus, JobStore, PluginDirectory, StorageProvisioner};
use crate::storage::NewJob;

/// Input of [`JobScheduler::schedule`].
#[derive(Debug, Clone, Default)]
pub struct ScheduleRequest {
    /// Plugin reference in `repo/name` form.
    pub name: String,
    pub agent_host: String,
    /// Unix seconds; `None` runs the job as soon as possible.
    pub time: Option<i64>,
    pub config: Option<Vec<u8>>,
}

/// Outcome of a successful schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub id: i64,
    pub bucket_name: String,
}

/// Split a `repo/name` plugin reference on its first `/`.
pub fn parse_plugin_name(name: &str) -> Result<(&str, &str), JobError> {
    match name.split_once('/') {
        Some((repo, plugin)) if !repo.is_empty() && !plugin.is_empty() => Ok((repo, plugin)),
        _ => Err(JobError::InvalidName(name.to_string())),
    }
}

pub struct JobScheduler {
    agents: Arc<dyn AgentDirectory>,
    plugins: Arc<dyn PluginDirectory>,
    provisioner: Arc<dyn StorageProvisioner>,
    store: Arc<dyn JobStore>,
    bucket_prefix: String,
}

impl JobScheduler {
    pub fn new(
        agents: Arc<dyn AgentDirectory>,
        plugins: Arc<dyn PluginDirectory>,
        provisioner: Arc<dyn StorageProvisioner>,
        store: Arc<dyn JobStore>,
        bucket_prefix: impl Into<String>,
    ) -> Self {
        Self {
            agents,
            plugins,
            provisioner,
            store,
            bucket_prefix: bucket_prefix.into(),
        }
    }

    /// Name for a new job bucket. The job id is not known before the insert,
    /// so uniqueness comes from a random UUID.
    fn bucket_name(&self) -> String {
        format!("{}-{}", self.bucket_prefix, uuid::Uuid::new_v4())
    }

    pub async fn schedule(&self, req: ScheduleRequest) -> Result<ScheduledJob, JobError> {
        let (repo, plugin_name) = parse_plugin_name(&req.name)?;

        let agent = self
            .agents
            .find_by_host(&req.agent_host)
            .await
            .map_err(JobError::from_agent_lookup)?;

        let plugin = self
            .plugins
            .list_by_agent_host(&agent.host)
            .await
            .map_err(JobError::LoadPlugins)?
            .into_iter()
            .find(|p| p.matches(repo, plugin_name))
            .ok_or(JobError::PluginNotFound)?;

        let bucket_name = self.bucket_name();
        debug!(bucket = %bucket_name, agent_host = %agent.host, "Provisioning job storage");
        self.provisioner
            .provision(&bucket_name, &agent.user)
            .await
            .map_err(JobError::Provision)?;

        let job = NewJob {
            plugin_id: plugin.id,
            agent_host: agent.host,
            status: JobStatus::Scheduled,
            time: req.time,
            config: req.config,
            bucket_name,
            reconn_attempts: 0,
        };

        let id = match self.store.create(&job).await {
            Ok(id) => id,
            Err(e) => {
                warn!(
                    error = %e,
                    bucket = %job.bucket_name,
                    agent_host = %job.agent_host,
                    "Job insert failed after storage was provisioned; bucket and policy are orphaned"
                );
                return Err(JobError::AddJob(e));
            }
        };

        info!(
            job_id = id,
            plugin = %req.name,
            agent_host = %job.agent_host,
            bucket = %job.bucket_name,
            "Job scheduled"
        );

        Ok(ScheduledJob {
            id,
            bucket_name: job.bucket_name,
        })
    }
}
