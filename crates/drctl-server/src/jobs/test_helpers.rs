//! Shared fixtures and fakes for the job subsystem tests.
//!
//! The database fixtures run against an in-memory `SQLite` store; the fakes
//! stand in for whichever collaborator a test needs to fail.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use super::{AgentDirectory, JobLister, JobScheduler, JobStore, PluginDirectory, StorageProvisioner};
use crate::minio::ProvisionError;
use crate::storage::{Agent, DatabaseError, Job, NewAgent, NewJob, NewPlugin, Plugin, ServerDatabase};

pub const AGENT_HOST: &str = "192.168.1.61";
pub const AGENT_USER: &str = "drlm-61";
pub const BUCKET_PREFIX: &str = "drctl";

/// The error every failing fake returns.
pub fn testing_error() -> DatabaseError {
    DatabaseError::Query("testing error".into())
}

/// An in-memory store holding one agent with the `default/tar` and
/// `default/copy` plugins.
pub async fn seed_db() -> Arc<ServerDatabase> {
    let db = ServerDatabase::open_in_memory().await.unwrap();
    db.create_agent(&NewAgent {
        host: AGENT_HOST,
        port: 8000,
        user: AGENT_USER,
    })
    .await
    .unwrap();
    for name in ["tar", "copy"] {
        db.create_plugin(&NewPlugin {
            repo: "default",
            name,
            agent_host: AGENT_HOST,
        })
        .await
        .unwrap();
    }
    Arc::new(db)
}

/// Add another agent with a single `default/tar` plugin.
pub async fn add_agent(db: &ServerDatabase, host: &str) -> i64 {
    db.create_agent(&NewAgent {
        host,
        port: 8000,
        user: "drlm-other",
    })
    .await
    .unwrap();
    db.create_plugin(&NewPlugin {
        repo: "default",
        name: "tar",
        agent_host: host,
    })
    .await
    .unwrap()
    .id
}

/// A scheduler wired entirely to `db` except for the provisioner.
pub fn scheduler_for(db: &Arc<ServerDatabase>, provisioner: Arc<dyn StorageProvisioner>) -> JobScheduler {
    JobScheduler::new(db.clone(), db.clone(), provisioner, db.clone(), BUCKET_PREFIX)
}

pub fn lister_for(db: &Arc<ServerDatabase>) -> JobLister {
    JobLister::new(db.clone(), db.clone())
}

// =============================================================================
// Provisioners
// =============================================================================

/// Succeeds and remembers every `(bucket, identity)` it was asked for.
#[derive(Default)]
pub struct RecordingProvisioner {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingProvisioner {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[tonic::async_trait]
impl StorageProvisioner for RecordingProvisioner {
    async fn provision(&self, bucket: &str, identity: &str) -> Result<(), ProvisionError> {
        self.calls
            .lock()
            .unwrap()
            .push((bucket.to_string(), identity.to_string()));
        Ok(())
    }
}

/// Fails like an object store answering 500.
pub struct FailingProvisioner;

#[tonic::async_trait]
impl StorageProvisioner for FailingProvisioner {
    async fn provision(&self, _bucket: &str, _identity: &str) -> Result<(), ProvisionError> {
        Err(ProvisionError::Api {
            status: 500,
            body: "testing error".into(),
        })
    }
}

// =============================================================================
// Failing directories and stores
// =============================================================================

pub struct FailingAgents;

#[tonic::async_trait]
impl AgentDirectory for FailingAgents {
    async fn find_by_host(&self, _host: &str) -> Result<Agent, DatabaseError> {
        Err(testing_error())
    }
}

pub struct FailingPlugins;

#[tonic::async_trait]
impl PluginDirectory for FailingPlugins {
    async fn list_by_agent_host(&self, _host: &str) -> Result<Vec<Plugin>, DatabaseError> {
        Err(testing_error())
    }
}

/// A store whose every operation fails, counting the create attempts.
#[derive(Default)]
pub struct FailingStore {
    creates: Mutex<Vec<NewJob>>,
}

impl FailingStore {
    pub fn attempted(&self) -> Vec<NewJob> {
        self.creates.lock().unwrap().clone()
    }
}

#[tonic::async_trait]
impl JobStore for FailingStore {
    async fn create(&self, job: &NewJob) -> Result<i64, DatabaseError> {
        self.creates.lock().unwrap().push(job.clone());
        Err(testing_error())
    }

    async fn list_all(&self) -> Result<Vec<Job>, DatabaseError> {
        Err(testing_error())
    }

    async fn list_by_agent_host(&self, _host: &str) -> Result<Vec<Job>, DatabaseError> {
        Err(testing_error())
    }
}

/// Serves a fixed set of job rows, including ones a test corrupts.
pub struct FixedStore(pub Vec<Job>);

#[tonic::async_trait]
impl JobStore for FixedStore {
    async fn create(&self, _job: &NewJob) -> Result<i64, DatabaseError> {
        Err(testing_error())
    }

    async fn list_all(&self) -> Result<Vec<Job>, DatabaseError> {
        Ok(self.0.clone())
    }

    async fn list_by_agent_host(&self, host: &str) -> Result<Vec<Job>, DatabaseError> {
        Ok(self.0.iter().filter(|j| j.agent_host == host).cloned().collect())
    }
}

/// A job row as the store would return it.
pub fn job_row(id: i64, agent_host: &str, status: &str) -> Job {
    Job {
        id,
        plugin_id: 1,
        agent_host: agent_host.into(),
        status: status.into(),
        time: None,
        config: None,
        bucket_name: format!("{BUCKET_PREFIX}-{id}"),
        info: String::new(),
        reconn_attempts: 0,
        created_at: 0,
        updated_at: 0,
        deleted_at: None,
    }
}
