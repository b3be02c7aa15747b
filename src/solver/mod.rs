//! Solve-method boundary: the executor contract the scheduler consumes, and
//! the shipped placement methods behind it.

mod placement;

use std::time::{Duration, Instant};

use crate::error::SolverError;
use crate::model::{Instance, MethodType, Solution, SolveConfig};

/// Performance record of one solve run.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Total volume of pieces placed.
    pub objective: f64,
    /// Best bound on the objective.
    pub best_bound: f64,
    /// Relative gap between objective and best bound.
    pub gap: f64,
    pub elapsed: Duration,
    pub solution: Solution,
}

/// The collaborator that actually runs a job's optimization method.
///
/// The call is synchronous and blocking for the duration of one admission;
/// the scheduler runs it on a blocking worker. Implementations must honor
/// the configured thread and time limits and communicate only through the
/// return value.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, instance: &Instance, config: &SolveConfig) -> Result<SolveOutcome, SolverError>;
}

/// Production executor: dispatches on the configured method type.
#[derive(Debug, Default)]
pub struct MethodExecutor;

impl Executor for MethodExecutor {
    fn execute(&self, instance: &Instance, config: &SolveConfig) -> Result<SolveOutcome, SolverError> {
        let started = Instant::now();
        let (solution, packed_volume) = match config.method {
            MethodType::ExtremePointInsertion => placement::first_fit(instance)?,
            MethodType::RandomizedInsertion => placement::randomized(instance, config)?,
        };

        let best_bound = bound(instance);
        let gap = if best_bound > 0.0 {
            (best_bound - packed_volume) / best_bound
        } else {
            0.0
        };
        Ok(SolveOutcome {
            objective: packed_volume,
            best_bound,
            gap,
            elapsed: started.elapsed(),
            solution,
        })
    }
}

/// Upper bound on packable volume: no more than the pieces bring, no more
/// than the containers hold.
fn bound(instance: &Instance) -> f64 {
    let piece_volume: f64 = instance.pieces.iter().map(|p| p.volume()).sum();
    let container_volume: f64 = instance.containers.iter().map(|c| c.volume()).sum();
    piece_volume.min(container_volume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Cube, Piece};

    fn boxy(id: i32, length: f64, width: f64, height: f64) -> Piece {
        Piece {
            id,
            weight: 0.0,
            cubes: vec![Cube {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                length,
                width,
                height,
            }],
        }
    }

    fn instance() -> Instance {
        Instance {
            name: "unit".into(),
            containers: vec![Container {
                id: 0,
                length: 10.0,
                width: 10.0,
                height: 10.0,
                max_weight: f64::INFINITY,
            }],
            pieces: vec![boxy(0, 5.0, 10.0, 10.0), boxy(1, 5.0, 10.0, 10.0)],
        }
    }

    #[test]
    fn extreme_point_insertion_packs_everything_that_fits() {
        let outcome = MethodExecutor
            .execute(&instance(), &SolveConfig::default())
            .unwrap();
        assert_eq!(outcome.solution.offload.len(), 0);
        assert_eq!(outcome.solution.containers[0].assignments.len(), 2);
        assert!((outcome.objective - 1000.0).abs() < 1e-9);
        assert!(outcome.gap.abs() < 1e-9);
    }

    #[test]
    fn oversized_pieces_are_offloaded_not_errors() {
        let mut inst = instance();
        inst.pieces.push(boxy(2, 20.0, 20.0, 20.0));
        let outcome = MethodExecutor
            .execute(&inst, &SolveConfig::default())
            .unwrap();
        assert_eq!(outcome.solution.offload, vec![2]);
        assert!(outcome.gap > 0.0);
    }

    #[test]
    fn randomized_method_is_deterministic_for_a_seed() {
        let config = SolveConfig {
            method: MethodType::RandomizedInsertion,
            seed: 7,
            time_limit: 1.0,
            ..Default::default()
        };
        let a = MethodExecutor.execute(&instance(), &config).unwrap();
        let b = MethodExecutor.execute(&instance(), &config).unwrap();
        assert_eq!(a.objective, b.objective);
        assert_eq!(
            serde_json::to_string(&a.solution).unwrap(),
            serde_json::to_string(&b.solution).unwrap()
        );
    }

    #[test]
    fn piece_without_cubes_is_infeasible() {
        let mut inst = instance();
        inst.pieces.push(Piece {
            id: 9,
            weight: 0.0,
            cubes: Vec::new(),
        });
        let err = MethodExecutor
            .execute(&inst, &SolveConfig::default())
            .unwrap_err();
        assert!(matches!(err, SolverError::Infeasible { .. }));
    }
}
