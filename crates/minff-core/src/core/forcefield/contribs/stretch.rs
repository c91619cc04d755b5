use super::{Contribution, accumulate_pair_gradient, check_index};
use crate::core::forcefield::potentials::{harmonic, harmonic_derivative};
use crate::engine::error::ForceFieldError;
use crate::engine::forcefield::ForceField;

const ZERO_DISTANCE_GRADIENT_FACTOR: f64 = 0.01;

/// Harmonic bond stretch, `0.5·k·(r − r0)²`.
#[derive(Debug, Clone, PartialEq)]
pub struct BondStretchContrib {
    indices: [usize; 2],
    rest_length: f64,
    force_constant: f64,
}

impl BondStretchContrib {
    pub fn new(
        owner: &ForceField,
        idx1: usize,
        idx2: usize,
        rest_length: f64,
        force_constant: f64,
    ) -> Result<Self, ForceFieldError> {
        Ok(Self {
            indices: [check_index(owner, idx1)?, check_index(owner, idx2)?],
            rest_length,
            force_constant,
        })
    }

    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }

    pub fn force_constant(&self) -> f64 {
        self.force_constant
    }
}

impl Contribution for BondStretchContrib {
    fn name(&self) -> &'static str {
        "bond-stretch"
    }

    fn point_indices(&self) -> &[usize] {
        &self.indices
    }

    fn energy(&self, field: &ForceField, pos: &[f64]) -> f64 {
        let [i, j] = self.indices;
        harmonic(
            field.pair_distance(i, j, pos),
            self.rest_length,
            self.force_constant,
        )
    }

    fn accumulate_gradient(&self, field: &ForceField, pos: &[f64], grad: &mut [f64]) {
        let [i, j] = self.indices;
        let dist = field.pair_distance(i, j, pos);
        let de_dr = harmonic_derivative(dist, self.rest_length, self.force_constant);
        let fallback = self.force_constant * ZERO_DISTANCE_GRADIENT_FACTOR;
        accumulate_pair_gradient(field, pos, grad, (i, j), dist, de_dr, fallback);
    }

    fn clone_box(&self) -> Box<dyn Contribution> {
        Box::new(self.clone())
    }
}
