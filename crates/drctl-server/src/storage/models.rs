//! Data models for drctl storage.

use serde::{Deserialize, Serialize};

/// A remote host able to run backup/recovery plugins.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Agent {
    pub id: i64,
    pub host: String,
    pub port: i64,
    /// Credential identity; per-job bucket policies are bound to it.
    pub user: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plugin {
    pub id: i64,
    pub repo: String,
    pub name: String,
    pub agent_host: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Plugin {
    /// Whether this plugin is the one referenced as `repo/name`.
    pub fn matches(&self, repo: &str, name: &str) -> bool {
        self.repo == repo && self.name == name
    }
}

/// A job row. `status` holds the persisted form of
/// [`JobStatus`](crate::jobs::JobStatus) and is only interpreted by the
/// status mapper.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: i64,
    pub plugin_id: i64,
    pub agent_host: String,
    pub status: String,
    /// Scheduled execution instant (Unix seconds); `None` runs as soon as possible.
    pub time: Option<i64>,
    pub config: Option<Vec<u8>>,
    pub bucket_name: String,
    pub info: String,
    pub reconn_attempts: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}
