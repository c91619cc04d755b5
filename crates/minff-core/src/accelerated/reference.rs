//! CPU implementation of the native-context capability.
//!
//! Evaluates a small set of pair forces directly in backend units and reuses
//! [`Bfgs`] as its local minimizer.

use super::context::{BackendError, ContextFactory, NativeContext, Platform, PropertyMap};
use crate::engine::bfgs::Bfgs;
use crate::engine::config::MinimizeOptions;
use crate::engine::error::ForceFieldError;
use crate::engine::solver::{Objective, QuasiNewtonSolver};
use crate::engine::state::MinimizeOutcome;
use std::sync::Arc;

pub const REFERENCE_PLATFORM_NAME: &str = "Reference";

/// Coulomb constant in kJ·nm/(mol·e²).
pub const COULOMB_CONSTANT: f64 = 138.935_458;

/// Pair terms understood by [`ReferenceContext`], in nm and kJ/mol.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendForce {
    HarmonicBond {
        particles: [usize; 2],
        length: f64,
        k: f64,
    },
    LennardJones {
        particles: [usize; 2],
        sigma: f64,
        epsilon: f64,
    },
    Coulomb {
        particles: [usize; 2],
        charge_product: f64,
    },
}

impl BackendForce {
    fn particles(&self) -> [usize; 2] {
        match self {
            Self::HarmonicBond { particles, .. }
            | Self::LennardJones { particles, .. }
            | Self::Coulomb { particles, .. } => *particles,
        }
    }

    /// Energy and dE/dr at separation `r`.
    fn evaluate(&self, r: f64) -> (f64, f64) {
        match *self {
            Self::HarmonicBond { length, k, .. } => {
                let delta = r - length;
                (0.5 * k * delta * delta, k * delta)
            }
            Self::LennardJones { sigma, epsilon, .. } => {
                let sr6 = (sigma / r).powi(6);
                let sr12 = sr6 * sr6;
                (
                    4.0 * epsilon * (sr12 - sr6),
                    4.0 * epsilon * (-12.0 * sr12 + 6.0 * sr6) / r,
                )
            }
            Self::Coulomb { charge_product, .. } => {
                let e = COULOMB_CONSTANT * charge_product / r;
                (e, -e / r)
            }
        }
    }
}

/// The particle system a [`ReferenceFactory`] builds contexts for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceSystem {
    pub num_particles: usize,
    pub forces: Vec<BackendForce>,
}

impl ReferenceSystem {
    pub fn new(num_particles: usize) -> Self {
        Self {
            num_particles,
            forces: Vec::new(),
        }
    }

    pub fn add_force(&mut self, force: BackendForce) -> Result<(), BackendError> {
        if let Some(&p) = force.particles().iter().find(|&&p| p >= self.num_particles) {
            return Err(BackendError(format!(
                "particle {p} is out of range for {} particle(s)",
                self.num_particles
            )));
        }
        self.forces.push(force);
        Ok(())
    }

    fn energy(&self, positions: &[[f64; 3]]) -> f64 {
        self.forces
            .iter()
            .map(|force| {
                let [i, j] = force.particles();
                force.evaluate(separation(positions, i, j).1).0
            })
            .sum()
    }

    /// Adds dE/dx into a flat gradient buffer.
    fn accumulate_gradient(&self, positions: &[[f64; 3]], grad: &mut [f64]) {
        for force in &self.forces {
            let [i, j] = force.particles();
            let (delta, r) = separation(positions, i, j);
            if r == 0.0 {
                continue;
            }
            let de_dr = force.evaluate(r).1;
            for k in 0..3 {
                let g = de_dr * delta[k] / r;
                grad[i * 3 + k] += g;
                grad[j * 3 + k] -= g;
            }
        }
    }
}

fn separation(positions: &[[f64; 3]], i: usize, j: usize) -> ([f64; 3], f64) {
    let (a, b) = (positions[i], positions[j]);
    let delta = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    let r = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
    (delta, r)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReferencePlatform;

impl Platform for ReferencePlatform {
    fn name(&self) -> &str {
        REFERENCE_PLATFORM_NAME
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceContext {
    system: ReferenceSystem,
    positions: Vec<[f64; 3]>,
    platform_name: String,
    properties: PropertyMap,
    step_size_ps: f64,
}

impl ReferenceContext {
    pub fn platform_name(&self) -> &str {
        &self.platform_name
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn step_size_ps(&self) -> f64 {
        self.step_size_ps
    }
}

struct ContextObjective<'a> {
    system: &'a ReferenceSystem,
}

impl ContextObjective<'_> {
    fn unflatten(x: &[f64]) -> Vec<[f64; 3]> {
        x.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
    }
}

impl Objective for ContextObjective<'_> {
    fn energy(&mut self, x: &[f64]) -> Result<f64, ForceFieldError> {
        Ok(self.system.energy(&Self::unflatten(x)))
    }

    fn gradient(&mut self, x: &[f64], grad: &mut [f64]) -> Result<f64, ForceFieldError> {
        grad.fill(0.0);
        self.system.accumulate_gradient(&Self::unflatten(x), grad);
        Ok(1.0)
    }
}

impl NativeContext for ReferenceContext {
    fn set_positions(&mut self, positions: &[[f64; 3]]) -> Result<(), BackendError> {
        if positions.len() != self.system.num_particles {
            return Err(BackendError(format!(
                "expected {} positions, got {}",
                self.system.num_particles,
                positions.len()
            )));
        }
        self.positions.clear();
        self.positions.extend_from_slice(positions);
        Ok(())
    }

    fn positions(&self) -> Result<Vec<[f64; 3]>, BackendError> {
        Ok(self.positions.clone())
    }

    fn potential_energy(&self) -> Result<f64, BackendError> {
        Ok(self.system.energy(&self.positions))
    }

    fn forces(&self) -> Result<Vec<[f64; 3]>, BackendError> {
        let mut grad = vec![0.0; self.positions.len() * 3];
        self.system.accumulate_gradient(&self.positions, &mut grad);
        Ok(grad.chunks_exact(3).map(|g| [-g[0], -g[1], -g[2]]).collect())
    }

    fn reinitialize(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn minimize_local(
        &mut self,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<MinimizeOutcome, BackendError> {
        let mut x: Vec<f64> = self.positions.iter().flatten().copied().collect();
        let options = MinimizeOptions::new(max_iterations, tolerance, 0.0);
        let mut objective = ContextObjective {
            system: &self.system,
        };
        let outcome = Bfgs
            .minimize(&mut x, &mut objective, &options, None)
            .map_err(|e| BackendError(e.to_string()))?;
        self.positions = ContextObjective::unflatten(&x);
        Ok(outcome)
    }
}

/// Builds [`ReferenceContext`]s for a fixed [`ReferenceSystem`].
#[derive(Debug, Clone, Default)]
pub struct ReferenceFactory {
    system: ReferenceSystem,
}

impl ReferenceFactory {
    pub fn new(system: ReferenceSystem) -> Self {
        Self { system }
    }

    pub fn system(&self) -> &ReferenceSystem {
        &self.system
    }
}

impl ContextFactory for ReferenceFactory {
    type Context = ReferenceContext;

    fn platform_by_name(&self, name: &str) -> Result<Arc<dyn Platform>, BackendError> {
        if name == REFERENCE_PLATFORM_NAME {
            Ok(Arc::new(ReferencePlatform))
        } else {
            Err(BackendError(format!("There is no registered Platform called \"{name}\"")))
        }
    }

    fn create_context(
        &self,
        platform: Option<&dyn Platform>,
        properties: &PropertyMap,
        step_size_ps: f64,
    ) -> Result<Self::Context, BackendError> {
        let platform_name = platform
            .map(|p| p.name().to_string())
            .unwrap_or_else(|| REFERENCE_PLATFORM_NAME.to_string());
        if platform_name != REFERENCE_PLATFORM_NAME {
            return Err(BackendError(format!(
                "Platform \"{platform_name}\" is not supported by the reference factory"
            )));
        }
        Ok(ReferenceContext {
            system: self.system.clone(),
            positions: vec![[0.0; 3]; self.system.num_particles],
            platform_name,
            properties: properties.clone(),
            step_size_ps,
        })
    }
}
