//! Job record: immutable problem payload plus mutable lifecycle fields.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::CALCULATIONS;
use crate::model::{CalculationRequest, JobStatus, Solution, StatusReport};

/// One submitted unit of work. Owned by the registry from submission until
/// eviction; only the scheduler mutates the lifecycle fields.
#[derive(Debug)]
pub struct Job {
    pub id: u64,
    pub request: Arc<CalculationRequest>,
    pub status: JobStatus,
    /// Empty unless `status == Error`.
    pub error_message: String,
    /// Present iff `status == Done`.
    pub solution: Option<Solution>,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: u64, request: Arc<CalculationRequest>) -> Self {
        Self {
            id,
            request,
            status: JobStatus::Pending,
            error_message: String::new(),
            solution: None,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Snapshot of the externally visible status record.
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            id: self.id,
            status: self.status,
            error_message: self.error_message.clone(),
            problem_url: format!("{CALCULATIONS}/{}", self.id),
            status_url: format!("{CALCULATIONS}/{}/status", self.id),
            solution_url: format!("{CALCULATIONS}/{}/solution", self.id),
            submitted_at: self.submitted_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}
