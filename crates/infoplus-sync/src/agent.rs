//! # Sync Agent
//!
//! Long-running orchestrator. Owns the job worker and the periodic order
//! status reconciliation.
//!
//! ## Agent Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SyncAgent Architecture                           │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SyncAgent                                │  │
//! │  │                                                                  │  │
//! │  │  • Spawns the job worker                                         │  │
//! │  │  • Ticks order status reconciliation every poll interval         │  │
//! │  │  • Tracks status for external queries                            │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │              ┌────────────────┴────────────────┐                        │
//! │              ▼                                 ▼                        │
//! │  ┌────────────────────────┐        ┌────────────────────────────────┐  │
//! │  │  Reconcile ticker      │        │  JobWorker                     │  │
//! │  │                        │  Run   │                                │  │
//! │  │  interval, Delay on    │ ─────► │  events, runs, full syncs      │  │
//! │  │  missed ticks          │ status │  one at a time                 │  │
//! │  └────────────────────────┘        └────────────────────────────────┘  │
//! │                                                                         │
//! │  Reconciliation goes through the same queue as every other job, so     │
//! │  it never overlaps an entity sync.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::SyncEngine;
use crate::error::{SyncError, SyncResult};
use crate::events::{LocalEvent, SyncJob};
use crate::jobs::{JobQueueHandle, JobReport, JobWorker};
use infoplus_core::{SyncKind, SyncOutcome};

// =============================================================================
// Agent Status
// =============================================================================

/// Snapshot of the agent for external queries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentStatus {
    /// Whether the background tasks are running.
    pub running: bool,

    /// Completed reconcile ticks since start.
    pub reconcile_count: u64,

    /// When the last reconcile tick finished.
    pub last_reconcile: Option<DateTime<Utc>>,

    /// Last error seen by a reconcile tick.
    pub last_error: Option<String>,
}

// =============================================================================
// Sync Agent
// =============================================================================

/// Spawns and owns the background sync tasks.
pub struct SyncAgent {
    engine: SyncEngine,
}

impl SyncAgent {
    pub fn new(engine: SyncEngine) -> Self {
        SyncAgent { engine }
    }

    /// Starts the job worker and the reconcile ticker.
    ///
    /// The returned handle is the only way to reach the running agent.
    pub fn start(self) -> SyncAgentHandle {
        let config = self.engine.config();
        let interval = config.sync.status_poll_interval();
        let reconcile_enabled = config.is_enabled(SyncKind::OrderStatus);

        info!(
            poll_interval_secs = interval.as_secs(),
            reconcile_enabled,
            "Starting sync agent"
        );

        let (worker, jobs) = JobWorker::new(self.engine);
        let worker_task = tokio::spawn(worker.run());

        let status = Arc::new(RwLock::new(AgentStatus {
            running: true,
            ..Default::default()
        }));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let ticker_task = tokio::spawn(Self::reconcile_loop(
            jobs.clone(),
            status.clone(),
            interval,
            reconcile_enabled,
            shutdown_rx,
        ));

        SyncAgentHandle {
            jobs,
            status,
            shutdown_tx,
            tasks: Arc::new(tokio::sync::Mutex::new(vec![worker_task, ticker_task])),
        }
    }

    async fn reconcile_loop(
        jobs: JobQueueHandle,
        status: Arc<RwLock<AgentStatus>>,
        period: std::time::Duration,
        enabled: bool,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !enabled {
                        debug!("Order status reconciliation disabled, skipping tick");
                        continue;
                    }

                    let report = jobs.submit_and_wait(SyncJob::Run(SyncKind::OrderStatus)).await;
                    let mut s = status.write().await;
                    s.reconcile_count += 1;
                    s.last_reconcile = Some(Utc::now());
                    s.last_error = match report {
                        Ok(JobReport::Run(SyncOutcome::Error { error })) => Some(error),
                        Ok(JobReport::Run(_)) => None,
                        Ok(other) => {
                            warn!(?other, "Unexpected report for reconcile job");
                            None
                        }
                        Err(e) => {
                            error!(error = %e, "Reconcile tick failed");
                            Some(e.to_string())
                        }
                    };
                }

                _ = shutdown_rx.recv() => {
                    info!("Reconcile ticker shutting down");
                    break;
                }
            }
        }
    }
}

// =============================================================================
// Agent Handle (for external control)
// =============================================================================

/// Handle for a running [`SyncAgent`].
#[derive(Clone)]
pub struct SyncAgentHandle {
    jobs: JobQueueHandle,
    status: Arc<RwLock<AgentStatus>>,
    shutdown_tx: mpsc::Sender<()>,
    tasks: Arc<tokio::sync::Mutex<Vec<JoinHandle<()>>>>,
}

impl SyncAgentHandle {
    pub async fn status(&self) -> AgentStatus {
        self.status.read().await.clone()
    }

    /// Queue for submitting jobs directly.
    pub fn jobs(&self) -> &JobQueueHandle {
        &self.jobs
    }

    /// Forwards a local write to the job queue.
    pub fn notify(&self, event: &LocalEvent) -> SyncResult<bool> {
        self.jobs.dispatch(event)
    }

    /// Stops the ticker and the worker, then waits for both.
    pub async fn shutdown(&self) -> SyncResult<()> {
        info!("Shutting down sync agent");

        let _ = self.shutdown_tx.send(()).await;
        let _ = self.jobs.shutdown().await;

        let tasks: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            task.await
                .map_err(|e| SyncError::Internal(format!("Agent task panicked: {e}")))?;
        }

        self.status.write().await.running = false;
        info!("Sync agent stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{config, engine_with};
    use crate::testing::FakeApi;
    use std::time::Duration;

    async fn wait_for_reconcile(handle: &SyncAgentHandle) -> AgentStatus {
        for _ in 0..100 {
            let status = handle.status().await;
            if status.reconcile_count > 0 {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("reconcile tick never completed");
    }

    #[tokio::test]
    async fn test_first_tick_reconciles_immediately() {
        let (engine, db) = engine_with(FakeApi::new(), config()).await;
        let handle = SyncAgent::new(engine).start();

        let status = wait_for_reconcile(&handle).await;
        assert!(status.running);
        assert!(status.last_reconcile.is_some());
        assert_eq!(status.last_error, None);

        let runs = db.sync_runs().recent(1).await.unwrap();
        assert_eq!(runs[0].kind, SyncKind::OrderStatus);

        handle.shutdown().await.unwrap();
        assert!(!handle.status().await.running);
    }

    #[tokio::test]
    async fn test_disabled_reconcile_never_runs() {
        let mut config = config();
        config.sync.orders = false;
        let (engine, db) = engine_with(FakeApi::new(), config).await;
        let handle = SyncAgent::new(engine).start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.status().await.reconcile_count, 0);
        assert!(db.sync_runs().recent(1).await.unwrap().is_empty());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_jobs_rejected_after_shutdown() {
        let (engine, _) = engine_with(FakeApi::new(), config()).await;
        let handle = SyncAgent::new(engine).start();
        handle.shutdown().await.unwrap();

        let result = handle.notify(&LocalEvent::ProductWritten("p1".into()));
        assert!(matches!(result, Err(SyncError::ShuttingDown)));
    }
}
