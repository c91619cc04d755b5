use super::{Contribution, accumulate_pair_gradient, check_index};
use crate::engine::error::ForceFieldError;
use crate::engine::forcefield::ForceField;

const ZERO_DISTANCE_GRADIENT_FACTOR: f64 = 0.01;

/// Flat-bottomed distance restraint.
///
/// Contributes nothing while the distance lies in `[min_len, max_len]` and
/// `0.5·k·Δ²` outside, with `Δ` measured to the nearest bound.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceConstraintContrib {
    indices: [usize; 2],
    min_len: f64,
    max_len: f64,
    force_constant: f64,
}

impl DistanceConstraintContrib {
    /// Bounds given in the wrong order are swapped.
    pub fn new(
        owner: &ForceField,
        idx1: usize,
        idx2: usize,
        min_len: f64,
        max_len: f64,
        force_constant: f64,
    ) -> Result<Self, ForceFieldError> {
        Ok(Self {
            indices: [check_index(owner, idx1)?, check_index(owner, idx2)?],
            min_len: min_len.min(max_len),
            max_len: min_len.max(max_len),
            force_constant,
        })
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min_len, self.max_len)
    }

    /// Signed violation: negative below the window, positive above, zero inside.
    fn violation(&self, dist: f64) -> f64 {
        if dist < self.min_len {
            dist - self.min_len
        } else if dist > self.max_len {
            dist - self.max_len
        } else {
            0.0
        }
    }
}

impl Contribution for DistanceConstraintContrib {
    fn name(&self) -> &'static str {
        "distance-constraint"
    }

    fn point_indices(&self) -> &[usize] {
        &self.indices
    }

    fn energy(&self, field: &ForceField, pos: &[f64]) -> f64 {
        let [i, j] = self.indices;
        let delta = self.violation(field.pair_distance(i, j, pos));
        0.5 * self.force_constant * delta * delta
    }

    fn accumulate_gradient(&self, field: &ForceField, pos: &[f64], grad: &mut [f64]) {
        let [i, j] = self.indices;
        let dist = field.pair_distance(i, j, pos);
        let delta = self.violation(dist);
        if delta == 0.0 {
            return;
        }
        let pre_factor = self.force_constant * delta;
        accumulate_pair_gradient(
            field,
            pos,
            grad,
            (i, j),
            dist,
            pre_factor,
            pre_factor * ZERO_DISTANCE_GRADIENT_FACTOR,
        );
    }

    fn clone_box(&self) -> Box<dyn Contribution> {
        Box::new(self.clone())
    }
}
