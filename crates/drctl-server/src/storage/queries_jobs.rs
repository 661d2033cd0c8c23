//! Job queries for the drctl server.
//!
//! `create_job` is the only write path for the jobs table.

use drctl_core::db::unix_timestamp;

use super::db::{DatabaseError, ServerDatabase};
use super::models::Job;
use crate::jobs::JobStatus;

/// A job ready to be persisted. The id is generated by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub plugin_id: i64,
    pub agent_host: String,
    pub status: JobStatus,
    pub time: Option<i64>,
    pub config: Option<Vec<u8>>,
    pub bucket_name: String,
    pub reconn_attempts: i64,
}

impl ServerDatabase {
    /// Insert a job in its own transaction and return the generated id.
    ///
    /// A failing insert leaves no row behind: the transaction is rolled back
    /// when it is dropped without a commit.
    pub async fn create_job(&self, job: &NewJob) -> Result<i64, DatabaseError> {
        let now = unix_timestamp();
        let mut tx = self.pool().begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO jobs (plugin_id, agent_host, status, time, config, bucket_name, info, reconn_attempts, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, '', ?, ?, ?) RETURNING id",
        )
        .bind(job.plugin_id)
        .bind(&job.agent_host)
        .bind(job.status.as_str())
        .bind(job.time)
        .bind(job.config.as_deref())
        .bind(&job.bucket_name)
        .bind(job.reconn_attempts)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(id)
    }

    /// Get a live job by ID.
    pub async fn get_job(&self, id: i64) -> Result<Job, DatabaseError> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE deleted_at IS NULL AND id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Job {id}")))
    }

    /// List every live job in insertion order.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, DatabaseError> {
        let jobs =
            sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE deleted_at IS NULL ORDER BY id ASC")
                .fetch_all(self.pool())
                .await?;

        Ok(jobs)
    }

    /// List the live jobs of one agent host in insertion order.
    pub async fn list_jobs_by_agent_host(
        &self,
        agent_host: &str,
    ) -> Result<Vec<Job>, DatabaseError> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE deleted_at IS NULL AND agent_host = ? ORDER BY id ASC",
        )
        .bind(agent_host)
        .fetch_all(self.pool())
        .await?;

        Ok(jobs)
    }

    /// Soft-delete a job by ID.
    pub async fn soft_delete_job(&self, id: i64) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "UPDATE jobs SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
