//! Lifecycle registry: the backlog/waiting/running/completed buckets plus
//! the id index. All access goes through the manager's read/write lock;
//! structural transitions happen under the write mode, queries under the
//! read mode.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use chrono::Utc;

use crate::manager::backlog::Backlog;
use crate::manager::job::Job;
use crate::model::{CalculationRequest, JobStatus, Solution, StatusReport};
use crate::solver::SolveOutcome;

/// The maximal number of completed jobs kept before evicting the oldest.
pub const MAX_COMPLETED_JOBS: usize = 1000;

/// A job popped from the backlog, handed to the admission path.
#[derive(Debug, Clone)]
pub(crate) struct AdmittedJob {
    pub id: u64,
    pub request: Arc<CalculationRequest>,
}

/// Bucket sizes, in lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketCounts {
    pub backlog: usize,
    pub waiting: usize,
    pub running: usize,
    pub completed: usize,
}

/// Invariant: every live id is in at most one bucket, and in `jobs` unless
/// evicted from `completed`. Jobs that fail are removed from their bucket
/// but stay in `jobs` forever; they never pass through the completed list
/// and so are never evicted.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    next_id: u64,
    backlog: Backlog,
    /// Popped from the backlog, waiting for a thread reservation.
    waiting: HashSet<u64>,
    running: HashSet<u64>,
    completed: VecDeque<u64>,
    jobs: HashMap<u64, Job>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next id and insert the job into backlog and index.
    /// Ids are monotonically increasing and never reused.
    pub fn enqueue(&mut self, request: Arc<CalculationRequest>) -> StatusReport {
        let id = self.next_id;
        self.next_id += 1;
        let job = Job::new(id, request);
        let report = job.status_report();
        self.backlog.insert(id, job.request.priority);
        self.jobs.insert(id, job);
        report
    }

    /// Pop the next backlog job into the waiting bucket. The status flips to
    /// `Ongoing` here, before any thread reservation succeeds.
    pub fn fetch(&mut self) -> Option<AdmittedJob> {
        let entry = self.backlog.pop_front()?;
        let job = self.jobs.get_mut(&entry.id)?;
        job.status = JobStatus::Ongoing;
        self.waiting.insert(entry.id);
        Some(AdmittedJob {
            id: entry.id,
            request: Arc::clone(&job.request),
        })
    }

    /// Thread reservation satisfied: waiting → running.
    pub fn mark_running(&mut self, id: u64) {
        self.waiting.remove(&id);
        self.running.insert(id);
        if let Some(job) = self.jobs.get_mut(&id) {
            job.started_at = Some(Utc::now());
        }
    }

    /// Executor succeeded: running → completed, with bounded FIFO eviction
    /// of the oldest completed job (and its index entry).
    pub fn complete(&mut self, id: u64, outcome: SolveOutcome) {
        self.running.remove(&id);
        if let Some(job) = self.jobs.get_mut(&id) {
            job.status = JobStatus::Done;
            job.solution = Some(outcome.solution);
            job.finished_at = Some(Utc::now());
        }
        self.completed.push_back(id);
        if self.completed.len() > MAX_COMPLETED_JOBS {
            if let Some(oldest) = self.completed.pop_front() {
                self.jobs.remove(&oldest);
            }
        }
    }

    /// Executor failed: drop from waiting/running without entering the
    /// completed list. The index entry is kept indefinitely.
    pub fn fail(&mut self, id: u64, message: String) {
        self.waiting.remove(&id);
        self.running.remove(&id);
        if let Some(job) = self.jobs.get_mut(&id) {
            job.status = JobStatus::Error;
            job.error_message = message;
            job.finished_at = Some(Utc::now());
        }
    }

    fn bucket_order(&self) -> impl Iterator<Item = u64> + '_ {
        self.backlog
            .iter()
            .map(|entry| entry.id)
            .chain(self.waiting.iter().copied())
            .chain(self.running.iter().copied())
            .chain(self.completed.iter().copied())
    }

    /// All problems in bucket order (backlog, waiting, running, completed).
    pub fn problems(&self) -> Vec<Arc<CalculationRequest>> {
        self.bucket_order()
            .filter_map(|id| self.jobs.get(&id))
            .map(|job| Arc::clone(&job.request))
            .collect()
    }

    /// All status records in bucket order.
    pub fn statuses(&self) -> Vec<StatusReport> {
        self.bucket_order()
            .filter_map(|id| self.jobs.get(&id))
            .map(Job::status_report)
            .collect()
    }

    pub fn problem(&self, id: u64) -> Option<Arc<CalculationRequest>> {
        self.jobs.get(&id).map(|job| Arc::clone(&job.request))
    }

    pub fn status(&self, id: u64) -> Option<StatusReport> {
        self.jobs.get(&id).map(Job::status_report)
    }

    /// `None` both for unknown ids and for known jobs without a solution;
    /// the API layer distinguishes the two via [`Registry::status`].
    pub fn solution(&self, id: u64) -> Option<Solution> {
        self.jobs.get(&id).and_then(|job| job.solution.clone())
    }

    pub fn bucket_counts(&self) -> BucketCounts {
        BucketCounts {
            backlog: self.backlog.len(),
            waiting: self.waiting.len(),
            running: self.running.len(),
            completed: self.completed.len(),
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, id: u64) -> bool {
        self.running.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Cube, Instance, Piece, SolveConfig};
    use crate::solver::SolveOutcome;
    use std::time::Duration;

    fn request(priority: i32) -> Arc<CalculationRequest> {
        Arc::new(CalculationRequest {
            priority,
            configuration: SolveConfig::default(),
            instance: Instance {
                name: String::new(),
                containers: vec![Container {
                    id: 0,
                    length: 10.0,
                    width: 10.0,
                    height: 10.0,
                    max_weight: f64::INFINITY,
                }],
                pieces: vec![Piece {
                    id: 0,
                    weight: 0.0,
                    cubes: vec![Cube {
                        x: 0.0,
                        y: 0.0,
                        z: 0.0,
                        length: 1.0,
                        width: 1.0,
                        height: 1.0,
                    }],
                }],
            },
        })
    }

    fn outcome() -> SolveOutcome {
        SolveOutcome {
            objective: 1.0,
            best_bound: 1.0,
            gap: 0.0,
            elapsed: Duration::ZERO,
            solution: Solution {
                containers: Vec::new(),
                offload: Vec::new(),
            },
        }
    }

    /// Runs one job through the full transition chain.
    fn run_to_completion(registry: &mut Registry) -> u64 {
        let id = registry.enqueue(request(5)).id;
        let admitted = registry.fetch().unwrap();
        assert_eq!(admitted.id, id);
        registry.mark_running(id);
        registry.complete(id, outcome());
        id
    }

    #[test]
    fn ids_are_monotonic_and_unique() {
        let mut registry = Registry::new();
        for expected in 0..10 {
            assert_eq!(registry.enqueue(request(5)).id, expected);
        }
    }

    #[test]
    fn fetch_flips_status_before_running() {
        let mut registry = Registry::new();
        let id = registry.enqueue(request(5)).id;
        assert_eq!(registry.status(id).unwrap().status, JobStatus::Pending);

        registry.fetch().unwrap();
        // Ongoing already, even though the job is only waiting for threads.
        assert_eq!(registry.status(id).unwrap().status, JobStatus::Ongoing);
        assert!(!registry.is_running(id));

        registry.mark_running(id);
        assert_eq!(registry.status(id).unwrap().status, JobStatus::Ongoing);
        assert!(registry.is_running(id));
        assert!(registry.status(id).unwrap().started_at.is_some());
    }

    #[test]
    fn completed_list_is_bounded_and_evicts_oldest_first() {
        let mut registry = Registry::new();
        let first = run_to_completion(&mut registry);
        assert_eq!(first, 0);
        for _ in 0..MAX_COMPLETED_JOBS {
            run_to_completion(&mut registry);
        }

        assert_eq!(registry.bucket_counts().completed, MAX_COMPLETED_JOBS);
        // Job 0 was evicted from the index, job 1000 is retrievable.
        assert!(registry.status(0).is_none());
        assert!(registry.status(1000).is_some());
        assert_eq!(registry.status(1000).unwrap().status, JobStatus::Done);
    }

    #[test]
    fn failed_jobs_skip_completed_and_stay_indexed() {
        let mut registry = Registry::new();
        let id = registry.enqueue(request(5)).id;
        registry.fetch().unwrap();
        registry.mark_running(id);
        registry.fail(id, "solver blew up".into());

        let report = registry.status(id).unwrap();
        assert_eq!(report.status, JobStatus::Error);
        assert_eq!(report.error_message, "solver blew up");
        assert!(registry.solution(id).is_none());
        assert_eq!(registry.bucket_counts().completed, 0);

        // Push MAX_COMPLETED_JOBS + 1 successes through; the failed job must
        // survive every eviction because it never entered the completed list.
        for _ in 0..=MAX_COMPLETED_JOBS {
            run_to_completion(&mut registry);
        }
        assert_eq!(registry.status(id).unwrap().status, JobStatus::Error);
    }

    #[test]
    fn failure_while_waiting_also_clears_bucket() {
        let mut registry = Registry::new();
        let id = registry.enqueue(request(5)).id;
        registry.fetch().unwrap();
        registry.fail(id, "rejected".into());

        let counts = registry.bucket_counts();
        assert_eq!(counts.waiting, 0);
        assert_eq!(counts.running, 0);
        assert_eq!(registry.status(id).unwrap().status, JobStatus::Error);
    }

    #[test]
    fn snapshots_follow_bucket_order() {
        let mut registry = Registry::new();
        let done = registry.enqueue(request(1)).id;
        registry.fetch().unwrap();
        registry.mark_running(done);
        registry.complete(done, outcome());

        let running = registry.enqueue(request(1)).id;
        registry.fetch().unwrap();
        registry.mark_running(running);

        let queued = registry.enqueue(request(9)).id;

        let ids: Vec<u64> = registry.statuses().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![queued, running, done]);
        assert_eq!(registry.problems().len(), 3);
    }

    #[test]
    fn unknown_id_distinct_from_missing_solution() {
        let mut registry = Registry::new();
        let id = registry.enqueue(request(5)).id;
        // Known job, no solution yet.
        assert!(registry.status(id).is_some());
        assert!(registry.solution(id).is_none());
        // Unknown job.
        assert!(registry.status(999).is_none());
        assert!(registry.solution(999).is_none());
    }
}
