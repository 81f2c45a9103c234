//! # Background Job Queue
//!
//! Local writes must not wait on InfoPlus. Events are turned into jobs,
//! pushed onto a bounded queue and executed by a single worker, one at a
//! time, in submission order.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Job Queue Flow                                 │
//! │                                                                         │
//! │  LocalEvent ──► job_for_event ──► JobQueueHandle::submit                │
//! │                  (flag check)          │  try_send, never blocks        │
//! │                                        ▼                                │
//! │                         ┌──────────────────────────────┐                │
//! │                         │ mpsc (queue_capacity)        │                │
//! │                         └──────────────┬───────────────┘                │
//! │                                        ▼                                │
//! │                         ┌──────────────────────────────┐                │
//! │                         │ JobWorker                    │                │
//! │                         │  Product/Customer/Order ─►   │                │
//! │                         │    single-entity sync        │                │
//! │                         │  Run(kind) ─► engine.run     │                │
//! │                         │  FullSync  ─► engine.full    │                │
//! │                         └──────────────┬───────────────┘                │
//! │                                        ▼                                │
//! │                          JobReport (to waiter, if any)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::SyncSettings;
use crate::engine::{FullSyncReport, SyncEngine};
use crate::error::{SyncError, SyncResult};
use crate::events::{job_for_event, LocalEvent, SyncJob};
use infoplus_core::{ItemResult, SyncOutcome};

// =============================================================================
// Job Report
// =============================================================================

/// What a finished job produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "report", rename_all = "snake_case")]
pub enum JobReport {
    Item(ItemResult),
    Run(SyncOutcome),
    Full(FullSyncReport),
    /// The job could not run at all (database unavailable).
    Failed(String),
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        match self {
            JobReport::Item(result) => result.success,
            JobReport::Run(outcome) => !outcome.is_error() && outcome.failure_count() == 0,
            JobReport::Full(report) => report.failure_count() == 0,
            JobReport::Failed(_) => false,
        }
    }
}

struct QueuedJob {
    job: SyncJob,
    reply: Option<oneshot::Sender<JobReport>>,
}

// =============================================================================
// Handle
// =============================================================================

/// Handle for submitting jobs to a running [`JobWorker`].
#[derive(Clone)]
pub struct JobQueueHandle {
    jobs_tx: mpsc::Sender<QueuedJob>,
    shutdown_tx: mpsc::Sender<()>,
    settings: SyncSettings,
}

impl JobQueueHandle {
    /// Queues a job without waiting.
    ///
    /// ## Errors
    /// - [`SyncError::QueueFull`] when the queue is at capacity
    /// - [`SyncError::ShuttingDown`] when the worker has stopped
    pub fn submit(&self, job: SyncJob) -> SyncResult<()> {
        self.enqueue(QueuedJob { job, reply: None })
    }

    /// Turns a local event into a job and queues it.
    ///
    /// Returns `Ok(false)` when the event's kind is switched off.
    pub fn dispatch(&self, event: &LocalEvent) -> SyncResult<bool> {
        match job_for_event(event, &self.settings) {
            Some(job) => {
                debug!(?event, %job, "Dispatching local event");
                self.submit(job).map(|()| true)
            }
            None => {
                debug!(?event, "Sync disabled for event, dropping");
                Ok(false)
            }
        }
    }

    /// Queues a job and waits for its report.
    pub async fn submit_and_wait(&self, job: SyncJob) -> SyncResult<JobReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.jobs_tx
            .send(QueuedJob {
                job,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| SyncError::ShuttingDown)?;

        reply_rx
            .await
            .map_err(|_| SyncError::ChannelError("Job dropped before completion".into()))
    }

    /// Stops the worker after the job in progress.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Shutdown channel closed".into()))
    }

    fn enqueue(&self, queued: QueuedJob) -> SyncResult<()> {
        self.jobs_tx.try_send(queued).map_err(|e| match e {
            mpsc::error::TrySendError::Full(q) => {
                warn!(job = %q.job, "Job queue full, dropping job");
                SyncError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => SyncError::ShuttingDown,
        })
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Executes queued jobs sequentially against the engine.
pub struct JobWorker {
    engine: SyncEngine,
    jobs_rx: mpsc::Receiver<QueuedJob>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl JobWorker {
    /// Creates a worker and its handle. Spawn [`JobWorker::run`] to start it.
    pub fn new(engine: SyncEngine) -> (Self, JobQueueHandle) {
        let capacity = engine.config().sync.queue_capacity.max(1);
        let settings = engine.config().sync.clone();
        let (jobs_tx, jobs_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = JobWorker {
            engine,
            jobs_rx,
            shutdown_rx,
        };
        let handle = JobQueueHandle {
            jobs_tx,
            shutdown_tx,
            settings,
        };

        (worker, handle)
    }

    /// Runs the worker loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!("Job worker starting");

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Job worker shutting down");
                    break;
                }

                queued = self.jobs_rx.recv() => {
                    let Some(QueuedJob { job, reply }) = queued else {
                        debug!("All job handles dropped");
                        break;
                    };

                    let report = self.execute(&job).await;
                    if report.is_success() {
                        debug!(%job, "Job finished");
                    } else {
                        warn!(%job, ?report, "Job finished with failures");
                    }

                    if let Some(reply) = reply {
                        let _ = reply.send(report);
                    }
                }
            }
        }

        info!("Job worker stopped");
    }

    async fn execute(&self, job: &SyncJob) -> JobReport {
        let item = match job {
            SyncJob::Product(id) => self.engine.sync_product(id).await,
            SyncJob::Customer(id) => self.engine.sync_customer(id).await,
            SyncJob::Order(id) => self.engine.sync_order(id).await,
            SyncJob::Run(kind) => return JobReport::Run(self.engine.run(*kind).await),
            SyncJob::FullSync => return JobReport::Full(self.engine.full_sync().await),
        };

        match item {
            Ok(result) => JobReport::Item(result),
            Err(e) => {
                error!(%job, error = %e, "Job failed");
                JobReport::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiResponse;
    use crate::engine::test_support::{config, engine_with, product};
    use crate::testing::FakeApi;
    use infoplus_core::{EntityType, SyncKind};
    use serde_json::json;

    #[tokio::test]
    async fn test_event_is_executed_in_background() {
        let api = FakeApi::new().on_request(|_, _, _| ApiResponse::Success(json!({"id": 77})));
        let (engine, db) = engine_with(api, config()).await;
        db.products().insert(&product("p1", "ABC123")).await.unwrap();

        let (worker, handle) = JobWorker::new(engine);
        let task = tokio::spawn(worker.run());

        assert!(handle
            .dispatch(&LocalEvent::ProductWritten("p1".into()))
            .unwrap());

        // Jobs run in order, so waiting on a second job drains the first.
        let report = handle
            .submit_and_wait(SyncJob::Product("p1".into()))
            .await
            .unwrap();
        assert!(report.is_success(), "{report:?}");
        assert_eq!(
            db.id_mappings()
                .get_remote_id(EntityType::Item, "p1")
                .await
                .unwrap(),
            Some(77)
        );

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_event_is_not_queued() {
        let mut config = config();
        config.sync.products = false;
        let (engine, _) = engine_with(FakeApi::new(), config).await;
        let (_worker, handle) = JobWorker::new(engine);

        assert!(!handle
            .dispatch(&LocalEvent::ProductWritten("p1".into()))
            .unwrap());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_blocking() {
        let mut config = config();
        config.sync.queue_capacity = 1;
        let (engine, _) = engine_with(FakeApi::new(), config).await;
        let (_worker, handle) = JobWorker::new(engine);

        handle.submit(SyncJob::FullSync).unwrap();
        assert!(matches!(
            handle.submit(SyncJob::FullSync),
            Err(SyncError::QueueFull)
        ));
    }

    #[tokio::test]
    async fn test_stopped_worker_reports_shutting_down() {
        let (engine, _) = engine_with(FakeApi::new(), config()).await;
        let (worker, handle) = JobWorker::new(engine);
        drop(worker);

        assert!(matches!(
            handle.submit(SyncJob::Run(SyncKind::Inventory)),
            Err(SyncError::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn test_run_job_reports_outcome() {
        let (engine, _) = engine_with(FakeApi::new(), config()).await;
        let (worker, handle) = JobWorker::new(engine);
        tokio::spawn(worker.run());

        let report = handle
            .submit_and_wait(SyncJob::Run(SyncKind::Customers))
            .await
            .unwrap();
        match report {
            JobReport::Run(outcome) => {
                assert_eq!(outcome, SyncOutcome::error("No customers to sync"))
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }
}
