//! SQLite-based persistence store

use crate::core::{RunStatus, StepOutcome};
use crate::persistence::{PersistenceBackend, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT id, pipeline_name, event, status, status_step, started_at, \
     completed_at, total_steps, outcomes FROM runs";

/// SQLite run history store
pub struct SqliteExecutionStore {
    pool: SqlitePool,
}

impl SqliteExecutionStore {
    /// Create a new SQLite store; `":memory:"` opens a private in-memory database
    pub async fn new(db_path: &str) -> Result<Self> {
        let (options, max_connections) = if db_path == ":memory:" {
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        } else {
            (
                SqliteConnectOptions::new()
                    .filename(db_path)
                    .create_if_missing(true),
                4,
            )
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("stepline");
        std::fs::create_dir_all(&db_dir)
            .with_context(|| format!("Failed to create {}", db_dir.display()))?;

        Self::at_path(&db_dir.join("runs.db")).await
    }

    pub async fn at_path(path: &Path) -> Result<Self> {
        let path = path
            .to_str()
            .with_context(|| format!("Database path is not valid UTF-8: {}", path.display()))?;
        Self::new(path).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                pipeline_name TEXT NOT NULL,
                event TEXT NOT NULL,
                status TEXT NOT NULL,
                status_step INTEGER,
                started_at TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                total_steps INTEGER NOT NULL DEFAULT 0,
                outcomes TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_runs_pipeline_name ON runs(pipeline_name);
            CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to initialize schema")?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn status_columns(status: RunStatus) -> (&'static str, Option<i64>) {
        match status {
            RunStatus::Success => (status.label(), None),
            RunStatus::Failed { step } => (status.label(), Some(step as i64)),
            RunStatus::Cancelled { before_step } => (status.label(), Some(before_step as i64)),
        }
    }

    fn parse_status(label: &str, step: Option<i64>) -> Result<RunStatus> {
        let step = || {
            step.map(|s| s as usize)
                .with_context(|| format!("Run status '{}' is missing its step", label))
        };
        match label {
            "Success" => Ok(RunStatus::Success),
            "Failed" => Ok(RunStatus::Failed { step: step()? }),
            "Cancelled" => Ok(RunStatus::Cancelled {
                before_step: step()?,
            }),
            other => anyhow::bail!("Unknown run status '{}'", other),
        }
    }

    fn from_row(row: &SqliteRow) -> Result<RunSummary> {
        let outcomes: Vec<StepOutcome> = serde_json::from_str(&row.get::<String, _>("outcomes"))
            .context("Failed to decode step outcomes")?;

        Ok(RunSummary {
            execution_id: Uuid::parse_str(&row.get::<String, _>("id"))?,
            pipeline_name: row.get("pipeline_name"),
            event: row.get("event"),
            status: Self::parse_status(
                &row.get::<String, _>("status"),
                row.get::<Option<i64>, _>("status_step"),
            )?,
            started_at: Self::from_naive(row.get("started_at")),
            completed_at: Self::from_naive(row.get("completed_at")),
            total_steps: row.get::<i64, _>("total_steps") as usize,
            outcomes,
        })
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for SqliteExecutionStore {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        let (status, status_step) = Self::status_columns(run.status);
        let outcomes = serde_json::to_string(&run.outcomes)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs
            (id, pipeline_name, event, status, status_step, started_at, completed_at, total_steps, outcomes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(run.execution_id.to_string())
        .bind(&run.pipeline_name)
        .bind(&run.event)
        .bind(status)
        .bind(status_step)
        .bind(Self::to_naive(run.started_at))
        .bind(Self::to_naive(run.completed_at))
        .bind(run.total_steps as i64)
        .bind(outcomes)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn load_run(&self, execution_id: Uuid) -> Result<Option<RunSummary>> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(execution_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load run")?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn list_runs(&self, pipeline_name: &str) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(&format!(
            "{} WHERE pipeline_name = ?1 ORDER BY started_at DESC",
            SELECT_COLUMNS
        ))
        .bind(pipeline_name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list runs")?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn recent_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(&format!("{} ORDER BY started_at DESC LIMIT ?1", SELECT_COLUMNS))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list recent runs")?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn list_pipelines(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT pipeline_name
            FROM runs
            ORDER BY pipeline_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list pipelines")?;

        Ok(rows.iter().map(|row| row.get("pipeline_name")).collect())
    }
}
