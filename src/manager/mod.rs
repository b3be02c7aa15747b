//! Job scheduling core: admission control, thread budgeting and lifecycle
//! tracking for calculation jobs.
//!
//! One `JobManager` is constructed per process with an explicit thread
//! capacity. Submissions land in a priority backlog; a single-occupancy
//! admission slot serializes the decision to start the next job, while any
//! number of admitted jobs execute concurrently under the shared thread
//! budget.

pub(crate) mod backlog;
pub mod job;
pub mod registry;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedSemaphorePermit, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::ServiceConfig;
use crate::error::JobError;
use crate::model::{CalculationRequest, Solution, StatusReport};
use crate::solver::Executor;
use registry::{AdmittedJob, BucketCounts, Registry};

pub use registry::MAX_COMPLETED_JOBS;

/// How often a blocked admission attempt re-checks the thread budget.
pub const ADMISSION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Accepts jobs, admits them under the thread budget, runs them through the
/// executor and answers queries about them. Cheap to clone; all clones share
/// the same scheduler state.
#[derive(Clone)]
pub struct JobManager {
    inner: Arc<Inner>,
}

struct Inner {
    capacity: usize,
    executor: Arc<dyn Executor>,
    /// Buckets and id index; single writer, many readers.
    registry: RwLock<Registry>,
    /// The admission slot: at most one admission decision in flight.
    admission_slot: Arc<Semaphore>,
    /// Thread reservations held by admitted jobs. Guarded separately from
    /// the registry lock so execution never blocks admission checks.
    threads_in_use: Mutex<usize>,
}

impl JobManager {
    pub fn new(config: &ServiceConfig, executor: Arc<dyn Executor>) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity: config.thread_capacity(),
                executor,
                registry: RwLock::new(Registry::new()),
                admission_slot: Arc::new(Semaphore::new(1)),
                threads_in_use: Mutex::new(0),
            }),
        }
    }

    /// Total thread capacity shared across all running jobs.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Validate and enqueue a new job. Returns its status record without
    /// waiting for admission.
    pub async fn submit(&self, request: CalculationRequest) -> Result<StatusReport, JobError> {
        validate_request(&request)?;
        let report = {
            let mut registry = self.inner.registry.write().await;
            registry.enqueue(Arc::new(request))
        };
        debug!(job_id = report.id, "job enqueued");
        spawn_admission(&self.inner);
        Ok(report)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// All problems, in bucket order (backlog, waiting, running, completed).
    pub async fn list_problems(&self) -> Vec<Arc<CalculationRequest>> {
        self.inner.registry.read().await.problems()
    }

    pub async fn get_problem(&self, id: u64) -> Option<Arc<CalculationRequest>> {
        self.inner.registry.read().await.problem(id)
    }

    /// All status records, in bucket order.
    pub async fn list_statuses(&self) -> Vec<StatusReport> {
        self.inner.registry.read().await.statuses()
    }

    pub async fn get_status(&self, id: u64) -> Option<StatusReport> {
        self.inner.registry.read().await.status(id)
    }

    /// `None` for unknown ids and for jobs that have no solution (yet).
    pub async fn get_solution(&self, id: u64) -> Option<Solution> {
        self.inner.registry.read().await.solution(id)
    }

    pub async fn bucket_counts(&self) -> BucketCounts {
        self.inner.registry.read().await.bucket_counts()
    }

    /// Currently reserved threads; for diagnostics and tests.
    pub async fn threads_in_use(&self) -> usize {
        *self.inner.threads_in_use.lock().await
    }
}

/// Fire-and-forget admission attempt. The at-most-one property comes from
/// the admission slot, not from the spawn.
fn spawn_admission(inner: &Arc<Inner>) {
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        try_admit_next(inner).await;
    });
}

/// Attempt to claim the admission slot and start the next backlog job.
/// Returns silently when the slot is occupied or the backlog is empty.
async fn try_admit_next(inner: Arc<Inner>) {
    let Ok(permit) = Arc::clone(&inner.admission_slot).try_acquire_owned() else {
        return;
    };
    let admitted = {
        let mut registry = inner.registry.write().await;
        registry.fetch()
    };
    match admitted {
        Some(job) => run_job(&inner, job, permit).await,
        None => drop(permit),
    }
}

/// Hold the admitted job in the waiting position until the thread budget
/// allows it, then execute it.
async fn run_job(inner: &Arc<Inner>, job: AdmittedJob, permit: OwnedSemaphorePermit) {
    let required = clamp_thread_request(job.request.configuration.thread_limit, inner.capacity);

    // Poll for spare budget. Only the slot holder ever claims threads, so a
    // successful check cannot be invalidated by another claimer.
    loop {
        {
            let mut in_use = inner.threads_in_use.lock().await;
            if inner.capacity - *in_use >= required {
                *in_use += required;
                break;
            }
        }
        tokio::time::sleep(ADMISSION_POLL_INTERVAL).await;
    }

    // Release the slot before executing: the next job may start its own
    // admission attempt while this one runs.
    drop(permit);
    {
        let mut registry = inner.registry.write().await;
        registry.mark_running(job.id);
    }
    spawn_admission(inner);

    info!(job_id = job.id, threads = required, "starting job");
    let executor = Arc::clone(&inner.executor);
    let request = Arc::clone(&job.request);
    let outcome = tokio::task::spawn_blocking(move || {
        let mut config = request.configuration.clone();
        config.thread_limit = required as i64;
        executor.execute(&request.instance, &config)
    })
    .await;

    match outcome {
        Ok(Ok(result)) => {
            info!(
                job_id = job.id,
                elapsed_s = result.elapsed.as_secs_f64(),
                objective = result.objective,
                "finished job"
            );
            let mut registry = inner.registry.write().await;
            registry.complete(job.id, result);
        }
        Ok(Err(e)) => {
            error!(job_id = job.id, error = %e, "job failed");
            let mut registry = inner.registry.write().await;
            registry.fail(job.id, e.to_string());
        }
        Err(join_error) => {
            // Solver panicked on the blocking worker.
            error!(job_id = job.id, error = %join_error, "job panicked");
            let mut registry = inner.registry.write().await;
            registry.fail(job.id, join_error.to_string());
        }
    }

    // Released on every outcome.
    {
        let mut in_use = inner.threads_in_use.lock().await;
        *in_use -= required;
    }
    spawn_admission(inner);
}

/// Clamp a job's requested thread count to the service capacity. Invalid and
/// oversized requests consume the full capacity, they are never rejected.
fn clamp_thread_request(requested: i64, capacity: usize) -> usize {
    if requested <= 0 || requested as u64 > capacity as u64 {
        capacity
    } else {
        requested as usize
    }
}

fn validate_request(request: &CalculationRequest) -> Result<(), JobError> {
    let instance = &request.instance;
    if instance.containers.is_empty() {
        return Err(JobError::InvalidPayload {
            reason: "instance has no containers".into(),
        });
    }
    if instance.pieces.is_empty() {
        return Err(JobError::InvalidPayload {
            reason: "instance has no pieces".into(),
        });
    }
    for container in &instance.containers {
        if container.length <= 0.0 || container.width <= 0.0 || container.height <= 0.0 {
            return Err(JobError::InvalidPayload {
                reason: format!("container {} has non-positive dimensions", container.id),
            });
        }
    }
    for piece in &instance.pieces {
        if piece.cubes.is_empty() {
            return Err(JobError::InvalidPayload {
                reason: format!("piece {} has no cubes", piece.id),
            });
        }
        if piece
            .cubes
            .iter()
            .any(|c| c.length <= 0.0 || c.width <= 0.0 || c.height <= 0.0)
        {
            return Err(JobError::InvalidPayload {
                reason: format!("piece {} has a cube with non-positive dimensions", piece.id),
            });
        }
    }
    Ok(())
}

/// Spawn a background task that periodically logs the bucket sizes.
pub fn spawn_stats_task(manager: JobManager, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // immediate first tick
        loop {
            ticker.tick().await;
            let counts = manager.bucket_counts().await;
            info!(
                backlog = counts.backlog,
                waiting = counts.waiting,
                running = counts.running,
                completed = counts.completed,
                "job buckets"
            );
        }
    })
}
