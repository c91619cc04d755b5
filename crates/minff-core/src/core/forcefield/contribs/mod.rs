//! Concrete energy contributions.
//!
//! A contribution is evaluated against a flat, point-major position buffer and
//! never owns its engine: the engine is lent to it for the duration of each call.
//! Every variant validates its point indices against the engine it is built for.

use crate::engine::error::ForceFieldError;
use crate::engine::forcefield::ForceField;
use std::fmt;

pub mod angle;
pub mod constraint;
pub mod electrostatic;
pub mod stretch;
pub mod vdw;

pub use angle::AngleBendContrib;
pub use constraint::DistanceConstraintContrib;
pub use electrostatic::EleContrib;
pub use stretch::BondStretchContrib;
pub use vdw::VdwContrib;

pub trait Contribution: fmt::Debug + Send + Sync {
    /// Short tag used in energy breakdowns.
    fn name(&self) -> &'static str;

    fn point_indices(&self) -> &[usize];

    fn energy(&self, field: &ForceField, pos: &[f64]) -> f64;

    /// Adds this term's gradient into `grad`. Never overwrites.
    fn accumulate_gradient(&self, field: &ForceField, pos: &[f64], grad: &mut [f64]);

    fn clone_box(&self) -> Box<dyn Contribution>;
}

impl Clone for Box<dyn Contribution> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub(crate) fn check_index(owner: &ForceField, index: usize) -> Result<usize, ForceFieldError> {
    let len = owner.num_points();
    if index >= len {
        return Err(ForceFieldError::IndexOutOfRange { index, len });
    }
    Ok(index)
}

/// Projects `de_dr` onto the i→j separation and splits it between the two points.
///
/// When the points coincide each component receives `fallback` instead.
pub(crate) fn accumulate_pair_gradient(
    field: &ForceField,
    pos: &[f64],
    grad: &mut [f64],
    (i, j): (usize, usize),
    dist: f64,
    de_dr: f64,
    fallback: f64,
) {
    let dim = field.dimension();
    for k in 0..dim {
        let component = if dist > 0.0 {
            de_dr * (pos[i * dim + k] - pos[j * dim + k]) / dist
        } else {
            fallback
        };
        grad[i * dim + k] += component;
        grad[j * dim + k] -= component;
    }
}
