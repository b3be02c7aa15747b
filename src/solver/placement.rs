//! Anchor-point placement heuristics.
//!
//! Pieces are placed by their bounding box at candidate anchor points,
//! first-fit, lowest anchor first.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};

use crate::error::SolverError;
use crate::model::{Assignment, Instance, Position, Solution, SolutionContainer, SolveConfig};

const EPS: f64 = 1e-9;

/// Restart budget for the randomized method when no time limit is set.
const DEFAULT_RESTARTS: usize = 32;

#[derive(Debug, Clone, Copy)]
struct PlacedBox {
    x: f64,
    y: f64,
    z: f64,
    length: f64,
    width: f64,
    height: f64,
}

impl PlacedBox {
    fn overlaps(&self, other: &PlacedBox) -> bool {
        self.x + self.length > other.x + EPS
            && other.x + other.length > self.x + EPS
            && self.y + self.width > other.y + EPS
            && other.y + other.width > self.y + EPS
            && self.z + self.height > other.z + EPS
            && other.z + other.height > self.z + EPS
    }
}

/// Mutable packing state of one container.
struct ContainerState {
    placed: Vec<PlacedBox>,
    anchors: Vec<(f64, f64, f64)>,
    weight_used: f64,
}

/// Deterministic first-fit: pieces in descending volume order, ties by
/// submission order of the pieces.
pub(crate) fn first_fit(instance: &Instance) -> Result<(Solution, f64), SolverError> {
    let mut order: Vec<usize> = (0..instance.pieces.len()).collect();
    order.sort_by(|&a, &b| {
        instance.pieces[b]
            .volume()
            .total_cmp(&instance.pieces[a].volume())
    });
    pack(instance, &order)
}

/// Randomized restarts over piece orders, keeping the best packing. Seeded
/// for reproducibility; stops at the configured time limit, or after a fixed
/// restart budget when none is set.
pub(crate) fn randomized(
    instance: &Instance,
    config: &SolveConfig,
) -> Result<(Solution, f64), SolverError> {
    let started = Instant::now();
    let deadline = (config.time_limit > 0.0).then(|| Duration::from_secs_f64(config.time_limit));
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut order: Vec<usize> = (0..instance.pieces.len()).collect();
    let mut best = first_fit(instance)?;

    for _ in 0..DEFAULT_RESTARTS {
        if let Some(limit) = deadline {
            if started.elapsed() >= limit {
                break;
            }
        }
        order.shuffle(&mut rng);
        let candidate = pack(instance, &order)?;
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    Ok(best)
}

/// Pack pieces in the given order, first container and lowest anchor that
/// fits. Returns the solution and the total placed volume.
fn pack(instance: &Instance, order: &[usize]) -> Result<(Solution, f64), SolverError> {
    let mut states: Vec<ContainerState> = instance
        .containers
        .iter()
        .map(|_| ContainerState {
            placed: Vec::new(),
            anchors: vec![(0.0, 0.0, 0.0)],
            weight_used: 0.0,
        })
        .collect();
    let mut assignments: Vec<Vec<Assignment>> = vec![Vec::new(); instance.containers.len()];
    let mut offload = Vec::new();
    let mut packed_volume = 0.0;

    for &index in order {
        let piece = &instance.pieces[index];
        if piece.cubes.is_empty() {
            return Err(SolverError::Infeasible {
                reason: format!("piece {} has no cubes", piece.id),
            });
        }
        let (length, width, height) = piece.bounding_box();

        let mut placed = false;
        for (ci, container) in instance.containers.iter().enumerate() {
            let state = &mut states[ci];
            if state.weight_used + piece.weight > container.max_weight + EPS {
                continue;
            }

            // Lowest anchor first: z, then y, then x.
            state
                .anchors
                .sort_by(|a, b| (a.2, a.1, a.0).partial_cmp(&(b.2, b.1, b.0)).unwrap_or(std::cmp::Ordering::Equal));
            let slot = state.anchors.iter().position(|&(x, y, z)| {
                let candidate = PlacedBox {
                    x,
                    y,
                    z,
                    length,
                    width,
                    height,
                };
                x + length <= container.length + EPS
                    && y + width <= container.width + EPS
                    && z + height <= container.height + EPS
                    && !state.placed.iter().any(|other| candidate.overlaps(other))
            });

            if let Some(slot) = slot {
                let (x, y, z) = state.anchors.swap_remove(slot);
                state.placed.push(PlacedBox {
                    x,
                    y,
                    z,
                    length,
                    width,
                    height,
                });
                state.anchors.push((x + length, y, z));
                state.anchors.push((x, y + width, z));
                state.anchors.push((x, y, z + height));
                state.weight_used += piece.weight;
                packed_volume += piece.volume();
                assignments[ci].push(Assignment {
                    piece: piece.id,
                    position: Position {
                        x,
                        y,
                        z,
                        ..Default::default()
                    },
                });
                placed = true;
                break;
            }
        }

        if !placed {
            offload.push(piece.id);
        }
    }

    let containers = instance
        .containers
        .iter()
        .zip(assignments)
        .map(|(container, assignments)| SolutionContainer {
            id: container.id,
            assignments,
        })
        .collect();
    Ok((
        Solution {
            containers,
            offload,
        },
        packed_volume,
    ))
}
