//! # Sync Run Repository
//!
//! One row per sync operation. A run of a given kind refuses to start while
//! another run of that kind is still `running`, unless that run is older
//! than the stale threshold, in which case it is closed as `failed`.
//!
//! ```text
//!   start(kind) ──► running ──► finish(completed | failed, counts, error)
//!        │
//!        └── open run of same kind?
//!              fresh → DbError::RunInProgress
//!              stale → close it as failed, then start
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use infoplus_core::{RunStatus, SyncKind, SyncRun};

const SELECT_COLUMNS: &str = r#"
    SELECT id, kind, status, started_at, finished_at,
           success_count, failure_count, error
    FROM sync_runs
"#;

/// Repository for sync run records.
#[derive(Debug, Clone)]
pub struct SyncRunRepository {
    pool: SqlitePool,
}

impl SyncRunRepository {
    /// Creates a new SyncRunRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncRunRepository { pool }
    }

    /// Opens a run record for `kind`.
    pub async fn start(&self, kind: SyncKind, stale_after: Duration) -> DbResult<SyncRun> {
        let now = Utc::now();
        let stale_after = chrono::Duration::from_std(stale_after)
            .unwrap_or_else(|_| chrono::Duration::days(365));

        let mut tx = self.pool.begin().await?;

        let open = sqlx::query_as::<_, SyncRun>(&format!(
            "{SELECT_COLUMNS} WHERE kind = ?1 AND status = ?2 ORDER BY started_at DESC"
        ))
        .bind(kind)
        .bind(RunStatus::Running)
        .fetch_all(&mut *tx)
        .await?;

        for run in open {
            if now - run.started_at < stale_after {
                return Err(DbError::RunInProgress {
                    kind: kind.to_string(),
                    run_id: run.id,
                });
            }

            warn!(run_id = %run.id, kind = %kind, "Closing stale sync run");
            sqlx::query(
                "UPDATE sync_runs SET status = ?2, finished_at = ?3, error = ?4 WHERE id = ?1",
            )
            .bind(&run.id)
            .bind(RunStatus::Failed)
            .bind(now)
            .bind("abandoned (stale)")
            .execute(&mut *tx)
            .await?;
        }

        let run = SyncRun {
            id: Uuid::new_v4().to_string(),
            kind,
            status: RunStatus::Running,
            started_at: now,
            finished_at: None,
            success_count: 0,
            failure_count: 0,
            error: None,
        };

        sqlx::query(
            r#"
            INSERT INTO sync_runs (id, kind, status, started_at, success_count, failure_count)
            VALUES (?1, ?2, ?3, ?4, 0, 0)
            "#,
        )
        .bind(&run.id)
        .bind(run.kind)
        .bind(run.status)
        .bind(run.started_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(run_id = %run.id, kind = %kind, "Sync run started");
        Ok(run)
    }

    /// Closes a run record.
    pub async fn finish(
        &self,
        run_id: &str,
        status: RunStatus,
        success_count: i64,
        failure_count: i64,
        error: Option<&str>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sync_runs
            SET status = ?2, finished_at = ?3, success_count = ?4,
                failure_count = ?5, error = ?6
            WHERE id = ?1
            "#,
        )
        .bind(run_id)
        .bind(status)
        .bind(Utc::now())
        .bind(success_count)
        .bind(failure_count)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("SyncRun", run_id));
        }

        debug!(run_id = %run_id, status = ?status, "Sync run finished");
        Ok(())
    }

    pub async fn get(&self, run_id: &str) -> DbResult<Option<SyncRun>> {
        let run = sqlx::query_as::<_, SyncRun>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(run)
    }

    /// Most recent runs, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<SyncRun>> {
        let runs = sqlx::query_as::<_, SyncRun>(&format!(
            "{SELECT_COLUMNS} ORDER BY started_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(runs)
    }

    /// True when a run of `kind` is open.
    pub async fn is_running(&self, kind: SyncKind) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sync_runs WHERE kind = ?1 AND status = ?2")
                .bind(kind)
                .bind(RunStatus::Running)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }
}
