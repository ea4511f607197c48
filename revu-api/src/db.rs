//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres and a
//! `RecordStore` implementation over it.
//!
//! Expected tables:
//! - `teams (team_name TEXT PRIMARY KEY)`
//! - `users (user_id TEXT PRIMARY KEY, username TEXT, team_name TEXT, is_active BOOLEAN)`
//! - `pull_requests (pull_request_id TEXT PRIMARY KEY, pull_request_name TEXT,
//!   author_id TEXT, status TEXT, created_at TIMESTAMPTZ, merged_at TIMESTAMPTZ NULL)`
//! - `pr_reviewers (pr_id TEXT, reviewer_user_id TEXT, assigned_at TIMESTAMPTZ,
//!   PRIMARY KEY (pr_id, reviewer_user_id))`

use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use revu_core::{
    AssignmentStats, EntityType, PullRequest, PullRequestStatus, RevuError, RevuResult,
    StorageError, Team, Timestamp, User,
};
use revu_storage::RecordStore;
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full connection string. Takes precedence over the discrete fields.
    pub url: Option<String>,
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            dbname: "review_service".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: std::env::var("DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("DB_USER").unwrap_or(defaults.user),
            password: std::env::var("DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("REVU_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        match &self.url {
            Some(url) => cfg.url = Some(url.clone()),
            None => {
                cfg.host = Some(self.host.clone());
                cfg.port = Some(self.port);
                cfg.dbname = Some(self.dbname.clone());
                cfg.user = Some(self.user.clone());
                cfg.password = Some(self.password.clone());
            }
        }

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(self.max_size));

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// POSTGRES RECORD STORE
// ============================================================================

/// Record store over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Check that a connection can be acquired and used.
    pub async fn ping(&self) -> ApiResult<()> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn client(&self) -> RevuResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            RevuError::from(StorageError::ConnectionFailed {
                reason: e.to_string(),
            })
        })
    }
}

fn query_failed(entity_type: EntityType) -> impl FnOnce(tokio_postgres::Error) -> RevuError {
    move |e| {
        StorageError::QueryFailed {
            entity_type,
            reason: e.to_string(),
        }
        .into()
    }
}

fn insert_failed(entity_type: EntityType) -> impl FnOnce(tokio_postgres::Error) -> RevuError {
    move |e| {
        StorageError::InsertFailed {
            entity_type,
            reason: e.to_string(),
        }
        .into()
    }
}

fn row_to_user(row: &Row) -> User {
    User {
        user_id: row.get("user_id"),
        username: row.get("username"),
        team_name: row.get("team_name"),
        is_active: row.get("is_active"),
    }
}

fn row_to_pull_request(row: &Row) -> RevuResult<PullRequest> {
    let raw: String = row.get("status");
    let status = PullRequestStatus::from_db_str(&raw).map_err(|e| StorageError::QueryFailed {
        entity_type: EntityType::PullRequest,
        reason: e.to_string(),
    })?;
    Ok(PullRequest {
        pull_request_id: row.get("pull_request_id"),
        pull_request_name: row.get("pull_request_name"),
        author_id: row.get("author_id"),
        status,
        created_at: row.get("created_at"),
        merged_at: row.get("merged_at"),
    })
}

const USER_COLUMNS: &str = "user_id, username, COALESCE(team_name, '') AS team_name, is_active";
const PULL_REQUEST_COLUMNS: &str =
    "pull_request_id, pull_request_name, author_id, status, created_at, merged_at";

#[async_trait]
impl RecordStore for PgStore {
    // === User Operations ===

    async fn user_get(&self, user_id: &str) -> RevuResult<Option<User>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                &format!("SELECT {} FROM users WHERE user_id = $1", USER_COLUMNS),
                &[&user_id],
            )
            .await
            .map_err(query_failed(EntityType::User))?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn user_list_by_team(&self, team_name: &str) -> RevuResult<Vec<User>> {
        let client = self.client().await?;
        let rows = client
            .query(
                &format!(
                    "SELECT {} FROM users WHERE team_name = $1 ORDER BY username, user_id",
                    USER_COLUMNS
                ),
                &[&team_name],
            )
            .await
            .map_err(query_failed(EntityType::User))?;
        Ok(rows.iter().map(row_to_user).collect())
    }

    async fn user_set_active(&self, user_id: &str, is_active: bool) -> RevuResult<Option<User>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                &format!(
                    "UPDATE users SET is_active = $1 WHERE user_id = $2 RETURNING {}",
                    USER_COLUMNS
                ),
                &[&is_active, &user_id],
            )
            .await
            .map_err(query_failed(EntityType::User))?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn user_bulk_deactivate(&self, team_name: &str, user_ids: &[String]) -> RevuResult<u64> {
        let client = self.client().await?;
        client
            .execute(
                "UPDATE users SET is_active = false WHERE team_name = $1 AND user_id = ANY($2) AND is_active = true",
                &[&team_name, &user_ids],
            )
            .await
            .map_err(query_failed(EntityType::User))
    }

    async fn user_upsert(&self, user: &User) -> RevuResult<()> {
        let client = self.client().await?;
        client
            .execute(
                "INSERT INTO users (user_id, username, team_name, is_active)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (user_id) DO UPDATE SET
                     username = EXCLUDED.username,
                     team_name = EXCLUDED.team_name,
                     is_active = EXCLUDED.is_active",
                &[&user.user_id, &user.username, &user.team_name, &user.is_active],
            )
            .await
            .map_err(insert_failed(EntityType::User))?;
        Ok(())
    }

    // === Team Operations ===

    async fn team_get(&self, team_name: &str) -> RevuResult<Option<Team>> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT team_name FROM teams WHERE team_name = $1", &[&team_name])
            .await
            .map_err(query_failed(EntityType::Team))?;
        Ok(row.map(|r| Team {
            team_name: r.get("team_name"),
        }))
    }

    async fn team_exists(&self, team_name: &str) -> RevuResult<bool> {
        let client = self.client().await?;
        let row = client
            .query_one(
                "SELECT EXISTS(SELECT 1 FROM teams WHERE team_name = $1)",
                &[&team_name],
            )
            .await
            .map_err(query_failed(EntityType::Team))?;
        Ok(row.get(0))
    }

    async fn team_insert(&self, team: &Team) -> RevuResult<()> {
        let client = self.client().await?;
        client
            .execute("INSERT INTO teams (team_name) VALUES ($1)", &[&team.team_name])
            .await
            .map_err(insert_failed(EntityType::Team))?;
        Ok(())
    }

    // === Pull Request Operations ===

    async fn pull_request_get(&self, pull_request_id: &str) -> RevuResult<Option<PullRequest>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                &format!(
                    "SELECT {} FROM pull_requests WHERE pull_request_id = $1",
                    PULL_REQUEST_COLUMNS
                ),
                &[&pull_request_id],
            )
            .await
            .map_err(query_failed(EntityType::PullRequest))?;
        row.as_ref().map(row_to_pull_request).transpose()
    }

    async fn pull_request_exists(&self, pull_request_id: &str) -> RevuResult<bool> {
        let client = self.client().await?;
        let row = client
            .query_one(
                "SELECT EXISTS(SELECT 1 FROM pull_requests WHERE pull_request_id = $1)",
                &[&pull_request_id],
            )
            .await
            .map_err(query_failed(EntityType::PullRequest))?;
        Ok(row.get(0))
    }

    async fn pull_request_insert(&self, pr: &PullRequest) -> RevuResult<()> {
        let client = self.client().await?;
        client
            .execute(
                &format!(
                    "INSERT INTO pull_requests ({}) VALUES ($1, $2, $3, $4, $5, $6)",
                    PULL_REQUEST_COLUMNS
                ),
                &[
                    &pr.pull_request_id,
                    &pr.pull_request_name,
                    &pr.author_id,
                    &pr.status.as_db_str(),
                    &pr.created_at,
                    &pr.merged_at,
                ],
            )
            .await
            .map_err(insert_failed(EntityType::PullRequest))?;
        Ok(())
    }

    async fn pull_request_update_status(
        &self,
        pull_request_id: &str,
        status: PullRequestStatus,
        merged_at: Option<Timestamp>,
    ) -> RevuResult<Option<PullRequest>> {
        let client = self.client().await?;
        let row = client
            .query_opt(
                &format!(
                    "UPDATE pull_requests SET status = $1, merged_at = $2
                     WHERE pull_request_id = $3 RETURNING {}",
                    PULL_REQUEST_COLUMNS
                ),
                &[&status.as_db_str(), &merged_at, &pull_request_id],
            )
            .await
            .map_err(query_failed(EntityType::PullRequest))?;
        row.as_ref().map(row_to_pull_request).transpose()
    }

    async fn pull_request_list_open_for_reviewer(
        &self,
        user_id: &str,
    ) -> RevuResult<Vec<PullRequest>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status,
                        pr.created_at, pr.merged_at
                 FROM pull_requests pr
                 INNER JOIN pr_reviewers prv ON pr.pull_request_id = prv.pr_id
                 WHERE prv.reviewer_user_id = $1 AND pr.status = 'OPEN'
                 ORDER BY pr.created_at DESC, pr.pull_request_id",
                &[&user_id],
            )
            .await
            .map_err(query_failed(EntityType::PullRequest))?;
        rows.iter().map(row_to_pull_request).collect()
    }

    // === Reviewer Assignment Operations ===

    async fn reviewer_add(&self, pull_request_id: &str, user_id: &str) -> RevuResult<()> {
        let client = self.client().await?;
        client
            .execute(
                "INSERT INTO pr_reviewers (pr_id, reviewer_user_id, assigned_at)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (pr_id, reviewer_user_id) DO NOTHING",
                &[&pull_request_id, &user_id, &revu_core::now()],
            )
            .await
            .map_err(insert_failed(EntityType::ReviewerAssignment))?;
        Ok(())
    }

    async fn reviewer_remove(&self, pull_request_id: &str, user_id: &str) -> RevuResult<()> {
        let client = self.client().await?;
        client
            .execute(
                "DELETE FROM pr_reviewers WHERE pr_id = $1 AND reviewer_user_id = $2",
                &[&pull_request_id, &user_id],
            )
            .await
            .map_err(query_failed(EntityType::ReviewerAssignment))?;
        Ok(())
    }

    async fn reviewer_list(&self, pull_request_id: &str) -> RevuResult<Vec<String>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT reviewer_user_id FROM pr_reviewers
                 WHERE pr_id = $1 ORDER BY assigned_at, reviewer_user_id",
                &[&pull_request_id],
            )
            .await
            .map_err(query_failed(EntityType::ReviewerAssignment))?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    // === Statistics ===

    async fn assignment_stats(&self) -> RevuResult<AssignmentStats> {
        let client = self.client().await?;
        let mut stats = AssignmentStats::default();

        let rows = client
            .query(
                "SELECT reviewer_user_id, COUNT(*) FROM pr_reviewers GROUP BY reviewer_user_id",
                &[],
            )
            .await
            .map_err(query_failed(EntityType::ReviewerAssignment))?;
        for row in &rows {
            let count: i64 = row.get(1);
            stats.user_assignments.insert(row.get(0), count as u64);
        }

        let rows = client
            .query("SELECT pr_id, COUNT(*) FROM pr_reviewers GROUP BY pr_id", &[])
            .await
            .map_err(query_failed(EntityType::ReviewerAssignment))?;
        for row in &rows {
            let count: i64 = row.get(1);
            stats.pr_assignments.insert(row.get(0), count as u64);
            stats.total_assignments += count as u64;
        }

        let rows = client
            .query("SELECT status, COUNT(*) FROM pull_requests GROUP BY status", &[])
            .await
            .map_err(query_failed(EntityType::PullRequest))?;
        for row in &rows {
            let status: String = row.get(0);
            let count: i64 = row.get(1);
            match PullRequestStatus::from_db_str(&status) {
                Ok(PullRequestStatus::Open) => stats.active_prs = count as u64,
                Ok(PullRequestStatus::Merged) => stats.merged_prs = count as u64,
                Err(e) => tracing::warn!(status = %status, error = %e, "Skipping unknown status"),
            }
        }

        Ok(stats)
    }
}
