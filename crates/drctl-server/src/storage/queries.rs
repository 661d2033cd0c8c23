//! Agent and plugin queries for the drctl server.
//!
//! Agents and plugins are written by the registration flows; the job
//! subsystem only reads them.

use drctl_core::db::unix_timestamp;

use super::db::{DatabaseError, ServerDatabase};
use super::models::{Agent, Plugin};

/// Parameters for registering an agent.
pub struct NewAgent<'a> {
    pub host: &'a str,
    pub port: i64,
    pub user: &'a str,
}

/// Parameters for registering a plugin on an agent.
pub struct NewPlugin<'a> {
    pub repo: &'a str,
    pub name: &'a str,
    pub agent_host: &'a str,
}

impl ServerDatabase {
    // =========================================================================
    // Agent queries
    // =========================================================================

    /// Register an agent.
    pub async fn create_agent(&self, params: &NewAgent<'_>) -> Result<Agent, DatabaseError> {
        let now = unix_timestamp();

        let id: i64 = sqlx::query_scalar(
            r#"INSERT INTO agents (host, port, "user", created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(params.host)
        .bind(params.port)
        .bind(params.user)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool())
        .await?;

        sqlx::query_as::<_, Agent>("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(Into::into)
    }

    /// Get the agent registered for `host`.
    ///
    /// Should several live rows share a host, the lowest id wins so the
    /// answer stays deterministic.
    pub async fn get_agent_by_host(&self, host: &str) -> Result<Agent, DatabaseError> {
        sqlx::query_as::<_, Agent>(
            "SELECT * FROM agents WHERE deleted_at IS NULL AND host = ? ORDER BY id ASC LIMIT 1",
        )
        .bind(host)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Agent {host}")))
    }

    /// Soft-delete every live agent registered for `host`.
    pub async fn soft_delete_agent(&self, host: &str) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "UPDATE agents SET deleted_at = ?, updated_at = ? WHERE host = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(host)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Plugin queries
    // =========================================================================

    /// Register a plugin for an agent.
    pub async fn create_plugin(&self, params: &NewPlugin<'_>) -> Result<Plugin, DatabaseError> {
        let now = unix_timestamp();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO plugins (repo, name, agent_host, created_at, updated_at) VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(params.repo)
        .bind(params.name)
        .bind(params.agent_host)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool())
        .await?;

        sqlx::query_as::<_, Plugin>("SELECT * FROM plugins WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(Into::into)
    }

    /// List the live plugins registered to an agent host, in storage order.
    pub async fn list_plugins_by_agent_host(
        &self,
        agent_host: &str,
    ) -> Result<Vec<Plugin>, DatabaseError> {
        let plugins = sqlx::query_as::<_, Plugin>(
            "SELECT * FROM plugins WHERE deleted_at IS NULL AND agent_host = ?",
        )
        .bind(agent_host)
        .fetch_all(self.pool())
        .await?;

        Ok(plugins)
    }

    /// Soft-delete a plugin by ID.
    pub async fn soft_delete_plugin(&self, id: i64) -> Result<bool, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "UPDATE plugins SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
