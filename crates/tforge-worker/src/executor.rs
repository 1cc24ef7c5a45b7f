//! Job executors: pick jobs up, track their status, run the coordinator.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, AcquireError, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use tforge_models::{JobStatusRecord, RunResult};
use tforge_queue::{GenerateVideoJob, JobQueue, JobStatusStore};

use crate::config::WorkerConfig;
use crate::coordinator::Coordinator;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;

const READ_BLOCK_MS: u64 = 1_000;
const READ_BATCH: usize = 5;
const IDLE_POLL: Duration = Duration::from_millis(100);
const MIN_HEARTBEAT: Duration = Duration::from_secs(1);

/// Runs one job end to end and keeps its status record current.
pub struct JobRunner {
    coordinator: Arc<Coordinator>,
    status: Arc<dyn JobStatusStore>,
}

impl JobRunner {
    pub fn new(coordinator: Arc<Coordinator>, status: Arc<dyn JobStatusStore>) -> Self {
        Self { coordinator, status }
    }

    pub async fn run(&self, job: &GenerateVideoJob) -> WorkerResult<RunResult> {
        let start = Instant::now();
        let record = match self.status.get(&job.job_id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => JobStatusRecord::pending(job.job_id.clone(), job.request.clone()),
            Err(e) => {
                warn!(job_id = %job.job_id, "Failed to read status: {}", e);
                JobStatusRecord::pending(job.job_id.clone(), job.request.clone())
            }
        };

        let record = record.started();
        self.save(&record).await;

        let outcome = self.coordinator.execute(&job.job_id, &job.request).await;
        metrics::record_job(outcome.is_ok(), start.elapsed().as_secs_f64());

        match &outcome {
            Ok(result) => self.save(&record.succeeded(result.clone())).await,
            Err(e) => self.save(&record.failed(e.to_string())).await,
        }
        outcome
    }

    async fn save(&self, record: &JobStatusRecord) {
        if let Err(e) = self.status.put(record).await {
            error!(job_id = %record.job_id, state = %record.state, "Failed to write status: {}", e);
        }
    }
}

/// Stream entries currently running on this worker.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `message_id` as running. `None` when it already is.
    pub fn begin(&self, message_id: &str) -> Option<InFlightGuard> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if !ids.insert(message_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            ids: Arc::clone(&self.ids),
            message_id: message_id.to_string(),
        })
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(message_id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears the entry from its [`InFlight`] set when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    ids: Arc<Mutex<HashSet<String>>>,
    message_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.message_id);
    }
}

/// How often a running entry's idle time is reset. Well inside the
/// visibility timeout so no other consumer can claim it mid-run.
pub fn heartbeat_interval(visibility_timeout: Duration) -> Duration {
    (visibility_timeout / 3).max(MIN_HEARTBEAT)
}

/// Everything a spawned job task needs.
#[derive(Clone)]
struct Dispatcher {
    queue: Arc<JobQueue>,
    runner: Arc<JobRunner>,
    semaphore: Arc<Semaphore>,
    in_flight: InFlight,
    consumer: String,
}

impl Dispatcher {
    /// Wait for a free slot, then run the job in its own task. Entries already
    /// running here are skipped.
    async fn dispatch(&self, (message_id, job): (String, GenerateVideoJob)) -> Result<(), AcquireError> {
        let Some(guard) = self.in_flight.begin(&message_id) else {
            debug!(job_id = %job.job_id, message_id = %message_id, "Entry already running on this worker");
            return Ok(());
        };
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;

        let this = self.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let _guard = guard;
            this.execute(message_id, job).await;
        });
        Ok(())
    }

    /// Run a job, then ack it or move it to the DLQ. Failed jobs are not retried.
    async fn execute(&self, message_id: String, job: GenerateVideoJob) {
        let heartbeat = self.spawn_heartbeat(message_id.clone());
        let outcome = self.runner.run(&job).await;
        heartbeat.abort();

        let settled = match outcome {
            Ok(_) => self.queue.ack(&message_id).await,
            Err(e) => self.queue.dlq(&message_id, &job, &e.to_string()).await,
        };
        if let Err(e) = settled {
            error!(job_id = %job.job_id, message_id = %message_id, "Failed to settle stream entry: {}", e);
        }
    }

    fn spawn_heartbeat(&self, message_id: String) -> JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let consumer = self.consumer.clone();
        let every = heartbeat_interval(queue.config().visibility_timeout);

        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            // The first tick completes immediately
            ticks.tick().await;
            loop {
                ticks.tick().await;
                if let Err(e) = queue.touch(&consumer, &message_id).await {
                    warn!(message_id = %message_id, "Failed to refresh entry ownership: {}", e);
                }
            }
        })
    }
}

/// Job executor that processes jobs from the Redis stream.
pub struct JobExecutor {
    config: WorkerConfig,
    dispatcher: Dispatcher,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, queue: JobQueue, runner: JobRunner) -> Self {
        let (shutdown, _) = tokio::sync::watch::channel(false);
        let dispatcher = Dispatcher {
            queue: Arc::new(queue),
            runner: Arc::new(runner),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            in_flight: InFlight::new(),
            consumer: format!("worker-{}", Uuid::new_v4()),
        };

        Self {
            config,
            dispatcher,
            shutdown,
        }
    }

    /// Consume until [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            consumer = %self.dispatcher.consumer,
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            "Job executor starting"
        );

        self.dispatcher.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_task = self.spawn_claim_task();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_jobs() => {
                    if let Err(e) = result {
                        error!("Failed to read jobs: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Draining in-flight jobs");
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(running = self.dispatcher.in_flight.len(), "Shutdown timeout reached with jobs still running");
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Periodically take over jobs left pending by dead workers.
    fn spawn_claim_task(&self) -> JoinHandle<()> {
        let dispatcher = self.dispatcher.clone();
        let every = self.config.claim_interval;

        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            loop {
                ticks.tick().await;
                let free = dispatcher.semaphore.available_permits();
                if free == 0 {
                    continue;
                }

                let claimed = match dispatcher.queue.claim_pending(&dispatcher.consumer, free).await {
                    Ok(claimed) => claimed,
                    Err(e) => {
                        warn!(consumer = %dispatcher.consumer, "Failed to claim pending jobs: {}", e);
                        continue;
                    }
                };
                if !claimed.is_empty() {
                    info!(count = claimed.len(), "Claimed pending jobs");
                }
                for delivery in claimed {
                    if dispatcher.dispatch(delivery).await.is_err() {
                        return;
                    }
                }
            }
        })
    }

    async fn consume_jobs(&self) -> WorkerResult<()> {
        let free = self.dispatcher.semaphore.available_permits();
        if free == 0 {
            tokio::time::sleep(IDLE_POLL).await;
            return Ok(());
        }

        let deliveries = self
            .dispatcher
            .queue
            .consume(&self.dispatcher.consumer, READ_BLOCK_MS, free.min(READ_BATCH))
            .await?;
        if !deliveries.is_empty() {
            debug!(count = deliveries.len(), "Read jobs from stream");
        }

        for delivery in deliveries {
            self.dispatcher
                .dispatch(delivery)
                .await
                .map_err(|_| WorkerError::config_error("job semaphore closed"))?;
        }
        Ok(())
    }

    async fn wait_for_jobs(&self) {
        while self.dispatcher.semaphore.available_permits() < self.config.max_concurrent_jobs {
            tokio::time::sleep(IDLE_POLL).await;
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Executor fed by an in-process [`LocalQueue`](tforge_queue::LocalQueue).
pub struct LocalExecutor {
    receiver: mpsc::UnboundedReceiver<GenerateVideoJob>,
    runner: Arc<JobRunner>,
    job_semaphore: Arc<Semaphore>,
}

impl LocalExecutor {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<GenerateVideoJob>,
        runner: JobRunner,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            receiver,
            runner: Arc::new(runner),
            job_semaphore: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }

    /// Drain the queue until every sender is dropped.
    pub async fn run(mut self) {
        info!("Local executor started");
        while let Some(job) = self.receiver.recv().await {
            let Ok(permit) = Arc::clone(&self.job_semaphore).acquire_owned().await else {
                break;
            };
            let runner = Arc::clone(&self.runner);
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = runner.run(&job).await {
                    error!("Job {} failed: {}", job.job_id, e);
                }
            });
        }
        info!("Local executor stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_cannot_run_twice_at_once() {
        let in_flight = InFlight::new();

        let first = in_flight.begin("1700000000000-0");
        assert!(first.is_some());
        assert!(in_flight.begin("1700000000000-0").is_none());
        assert!(in_flight.begin("1700000000001-0").is_some());

        drop(first);
        assert!(!in_flight.contains("1700000000000-0"));
        assert!(in_flight.begin("1700000000000-0").is_some());
    }

    #[test]
    fn test_guards_clear_on_drop() {
        let in_flight = InFlight::new();
        {
            let _a = in_flight.begin("a");
            let _b = in_flight.begin("b");
            assert_eq!(in_flight.len(), 2);
        }
        assert!(in_flight.is_empty());
    }

    #[test]
    fn test_heartbeat_stays_inside_visibility_timeout() {
        assert_eq!(heartbeat_interval(Duration::from_secs(900)), Duration::from_secs(300));
        assert_eq!(heartbeat_interval(Duration::from_millis(600)), MIN_HEARTBEAT);
    }
}
