use super::{Contribution, check_index};
use crate::core::forcefield::potentials::{harmonic, harmonic_derivative};
use crate::engine::error::ForceFieldError;
use crate::engine::forcefield::ForceField;

const MIN_SIN_THETA: f64 = 1e-8;

/// Harmonic angle bend, `0.5·k·(θ − θ0)²`, with `θ` measured at the vertex point.
///
/// Angles are in radians. A zero-length arm leaves the angle undefined; such
/// geometries contribute neither energy nor gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleBendContrib {
    indices: [usize; 3],
    rest_angle: f64,
    force_constant: f64,
}

struct Arms {
    r1: Vec<f64>,
    r2: Vec<f64>,
    d1: f64,
    d2: f64,
    cos_theta: f64,
}

impl AngleBendContrib {
    pub fn new(
        owner: &ForceField,
        idx1: usize,
        vertex: usize,
        idx3: usize,
        rest_angle: f64,
        force_constant: f64,
    ) -> Result<Self, ForceFieldError> {
        Ok(Self {
            indices: [
                check_index(owner, idx1)?,
                check_index(owner, vertex)?,
                check_index(owner, idx3)?,
            ],
            rest_angle,
            force_constant,
        })
    }

    pub fn rest_angle(&self) -> f64 {
        self.rest_angle
    }

    fn arms(&self, dim: usize, pos: &[f64]) -> Option<Arms> {
        let [i, j, k] = self.indices;
        let r1: Vec<f64> = (0..dim).map(|c| pos[i * dim + c] - pos[j * dim + c]).collect();
        let r2: Vec<f64> = (0..dim).map(|c| pos[k * dim + c] - pos[j * dim + c]).collect();
        let d1 = r1.iter().map(|v| v * v).sum::<f64>().sqrt();
        let d2 = r2.iter().map(|v| v * v).sum::<f64>().sqrt();
        if d1 == 0.0 || d2 == 0.0 {
            return None;
        }
        let dot: f64 = r1.iter().zip(&r2).map(|(a, b)| a * b).sum();
        let cos_theta = (dot / (d1 * d2)).clamp(-1.0, 1.0);
        Some(Arms {
            r1,
            r2,
            d1,
            d2,
            cos_theta,
        })
    }
}

impl Contribution for AngleBendContrib {
    fn name(&self) -> &'static str {
        "angle-bend"
    }

    fn point_indices(&self) -> &[usize] {
        &self.indices
    }

    fn energy(&self, field: &ForceField, pos: &[f64]) -> f64 {
        match self.arms(field.dimension(), pos) {
            Some(arms) => harmonic(arms.cos_theta.acos(), self.rest_angle, self.force_constant),
            None => 0.0,
        }
    }

    fn accumulate_gradient(&self, field: &ForceField, pos: &[f64], grad: &mut [f64]) {
        let dim = field.dimension();
        let Some(arms) = self.arms(dim, pos) else {
            return;
        };
        let theta = arms.cos_theta.acos();
        let sin_theta = (1.0 - arms.cos_theta * arms.cos_theta)
            .sqrt()
            .max(MIN_SIN_THETA);
        let de_dtheta = harmonic_derivative(theta, self.rest_angle, self.force_constant);
        let pre_factor = -de_dtheta / sin_theta;

        let [i, j, k] = self.indices;
        for c in 0..dim {
            let g1 = pre_factor
                * (arms.r2[c] / (arms.d1 * arms.d2) - arms.cos_theta * arms.r1[c] / (arms.d1 * arms.d1));
            let g3 = pre_factor
                * (arms.r1[c] / (arms.d1 * arms.d2) - arms.cos_theta * arms.r2[c] / (arms.d2 * arms.d2));
            grad[i * dim + c] += g1;
            grad[k * dim + c] += g3;
            grad[j * dim + c] -= g1 + g3;
        }
    }

    fn clone_box(&self) -> Box<dyn Contribution> {
        Box::new(self.clone())
    }
}
