//! Error types for stowage.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

/// Job lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Job {id} not found")]
    NotFound { id: u64 },

    #[error("Invalid job payload: {reason}")]
    InvalidPayload { reason: String },
}

/// Solve execution errors.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Instance is infeasible: {reason}")]
    Infeasible { reason: String },

    #[error("Solve aborted: {reason}")]
    Aborted { reason: String },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
