//! Wire-facing data model: problem instances, solve configuration, job
//! status records and solutions.
//!
//! Field names follow the JSON contract of the service (camelCase), hence
//! the serde renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An axis-aligned box, positioned relative to its piece's origin. Pieces
/// made of a single cube at the origin are the common case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Cube {
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}

/// A container to load pieces into. An absent `maxWeight` means unlimited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: i32,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default = "unlimited_weight")]
    pub max_weight: f64,
}

fn unlimited_weight() -> f64 {
    f64::INFINITY
}

impl Container {
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}

/// A piece to load, composed of one or more cubes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub id: i32,
    #[serde(default)]
    pub weight: f64,
    pub cubes: Vec<Cube>,
}

impl Piece {
    /// Extent of the tightest axis-aligned box enclosing all cubes,
    /// anchored at the piece origin.
    pub fn bounding_box(&self) -> (f64, f64, f64) {
        self.cubes.iter().fold((0.0, 0.0, 0.0), |(l, w, h), cube| {
            (
                f64::max(l, cube.x + cube.length),
                f64::max(w, cube.y + cube.width),
                f64::max(h, cube.z + cube.height),
            )
        })
    }

    pub fn volume(&self) -> f64 {
        self.cubes.iter().map(Cube::volume).sum()
    }
}

/// One container-loading problem instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub name: String,
    pub containers: Vec<Container>,
    pub pieces: Vec<Piece>,
}

/// The optimization method to run for a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodType {
    /// Deterministic first-fit over anchor points.
    #[default]
    ExtremePointInsertion,
    /// Seeded randomized restarts, best packing kept.
    RandomizedInsertion,
}

/// Per-job solve configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveConfig {
    #[serde(default)]
    pub method: MethodType,
    /// Requested thread count. Non-positive or oversized values are clamped
    /// to the service capacity at admission, never rejected.
    #[serde(default = "default_thread_limit")]
    pub thread_limit: i64,
    /// Wall-clock limit in seconds; zero means unlimited.
    #[serde(default)]
    pub time_limit: f64,
    #[serde(default)]
    pub seed: u64,
}

fn default_thread_limit() -> i64 {
    1
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            method: MethodType::default(),
            thread_limit: default_thread_limit(),
            time_limit: 0.0,
            seed: 0,
        }
    }
}

/// A submitted calculation: the instance plus scheduling metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// Scheduling priority; lower values are admitted first.
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub configuration: SolveConfig,
    pub instance: Instance,
}

fn default_priority() -> i32 {
    5
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued in the backlog.
    Pending,
    /// Admitted: waiting for threads or executing.
    Ongoing,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStatus::Pending => "pending",
            JobStatus::Ongoing => "ongoing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// Externally visible status record of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub id: u64,
    pub status: JobStatus,
    /// Empty unless `status` is `error`.
    #[serde(rename = "errorMessage")]
    pub error_message: String,
    #[serde(rename = "problemUrl")]
    pub problem_url: String,
    #[serde(rename = "statusUrl")]
    pub status_url: String,
    #[serde(rename = "solutionUrl")]
    pub solution_url: String,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
    #[serde(rename = "startedAt", default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt", default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Placement of a piece inside a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Axis-aligned rotation index; the shipped methods never rotate.
    #[serde(default)]
    pub rotation: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub piece: i32,
    pub position: Position,
}

/// The loading plan for one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionContainer {
    pub id: i32,
    pub assignments: Vec<Assignment>,
}

/// A complete solution: per-container assignments plus the ids of pieces
/// that could not be placed anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub containers: Vec<SolutionContainer>,
    #[serde(default)]
    pub offload: Vec<i32>,
}
