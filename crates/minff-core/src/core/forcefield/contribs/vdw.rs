use super::{Contribution, accumulate_pair_gradient, check_index};
use crate::core::forcefield::params::{MmffVdwCollection, MmffVdwParams, VdwPairParams, vdw_pair_params};
use crate::core::forcefield::potentials::{buffered_14_7, buffered_14_7_derivative};
use crate::engine::error::ForceFieldError;
use crate::engine::forcefield::ForceField;

const ZERO_DISTANCE_GRADIENT_FACTOR: f64 = 0.01;

/// MMFF buffered 14-7 van der Waals interaction between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct VdwContrib {
    indices: [usize; 2],
    params: VdwPairParams,
}

impl VdwContrib {
    pub fn new(
        owner: &ForceField,
        idx1: usize,
        idx2: usize,
        params: VdwPairParams,
    ) -> Result<Self, ForceFieldError> {
        Ok(Self {
            indices: [check_index(owner, idx1)?, check_index(owner, idx2)?],
            params,
        })
    }

    /// Builds the pair term from per-atom parameters via the MMFF combining rules.
    pub fn from_atom_params(
        owner: &ForceField,
        idx1: usize,
        idx2: usize,
        collection: &MmffVdwCollection,
        atom1: &MmffVdwParams,
        atom2: &MmffVdwParams,
    ) -> Result<Self, ForceFieldError> {
        Self::new(owner, idx1, idx2, vdw_pair_params(collection, atom1, atom2))
    }

    pub fn params(&self) -> &VdwPairParams {
        &self.params
    }
}

impl Contribution for VdwContrib {
    fn name(&self) -> &'static str {
        "vdw"
    }

    fn point_indices(&self) -> &[usize] {
        &self.indices
    }

    fn energy(&self, field: &ForceField, pos: &[f64]) -> f64 {
        let [i, j] = self.indices;
        let dist = field.pair_distance(i, j, pos);
        buffered_14_7(dist, self.params.r_star_ij, self.params.well_depth)
    }

    fn accumulate_gradient(&self, field: &ForceField, pos: &[f64], grad: &mut [f64]) {
        let [i, j] = self.indices;
        let dist = field.pair_distance(i, j, pos);
        let de_dr = if dist > 0.0 {
            buffered_14_7_derivative(dist, self.params.r_star_ij, self.params.well_depth)
        } else {
            0.0
        };
        let fallback = self.params.r_star_ij * ZERO_DISTANCE_GRADIENT_FACTOR;
        accumulate_pair_gradient(field, pos, grad, (i, j), dist, de_dr, fallback);
    }

    fn clone_box(&self) -> Box<dyn Contribution> {
        Box::new(self.clone())
    }
}
