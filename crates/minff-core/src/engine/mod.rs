//! # Engine Module
//!
//! Stateful orchestration around the contribution model: the [`forcefield::ForceField`]
//! engine with its distance cache, the adapter that exposes it to a quasi-Newton
//! solver, the built-in [`bfgs::Bfgs`] solver, and the options, outcomes, errors and
//! progress events shared by every engine.
//!
//! ## Lifecycle
//!
//! Points and contributions are added first, then [`forcefield::ForceField::initialize`]
//! captures the point count and allocates the cache. Energy, gradient and
//! minimization calls are valid only after that; adding points afterwards requires
//! another `initialize`.
//!
//! ## Shared contract
//!
//! [`EnergyEngine`] is implemented by the contribution-based engine and, with the
//! `accelerated` feature, by the backend-driven engine, so workflows can drive
//! either one.

use config::MinimizeOptions;
use error::ForceFieldError;
use state::MinimizeOutcome;

pub mod bfgs;
pub mod cache;
pub mod config;
pub mod error;
pub mod forcefield;
pub mod minimize;
pub mod progress;
pub mod solver;
pub mod state;

/// Energy, gradient and minimization over a point-major position buffer of
/// `num_points() * dimension()` values.
pub trait EnergyEngine {
    fn dimension(&self) -> usize;

    fn num_points(&self) -> usize;

    fn calc_energy(&self) -> Result<f64, ForceFieldError>;

    fn calc_energy_at(&mut self, pos: &[f64]) -> Result<f64, ForceFieldError>;

    /// Accumulates into `grad` without zeroing it first.
    fn calc_grad(&self, grad: &mut [f64]) -> Result<(), ForceFieldError>;

    fn calc_grad_at(&mut self, pos: &[f64], grad: &mut [f64]) -> Result<(), ForceFieldError>;

    fn minimize_with_options(
        &mut self,
        options: &MinimizeOptions,
    ) -> Result<MinimizeOutcome, ForceFieldError>;
}
