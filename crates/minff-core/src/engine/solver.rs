use super::config::MinimizeOptions;
use super::error::ForceFieldError;
use super::state::{MinimizeOutcome, Snapshot};

pub const STATUS_CONVERGED: i32 = 0;
pub const STATUS_MAX_ITERATIONS: i32 = 1;

/// The function being minimized, as seen by a solver.
pub trait Objective {
    fn energy(&mut self, x: &[f64]) -> Result<f64, ForceFieldError>;

    /// Overwrites `grad` with the (possibly rescaled) gradient at `x` and
    /// returns the scale factor that was applied.
    fn gradient(&mut self, x: &[f64], grad: &mut [f64]) -> Result<f64, ForceFieldError>;
}

/// A callback-driven local minimizer.
///
/// `x` holds the starting point on entry and the best iterate on return. The
/// returned status is reported to callers unchanged.
pub trait QuasiNewtonSolver: Send + Sync {
    fn minimize(
        &self,
        x: &mut [f64],
        objective: &mut dyn Objective,
        options: &MinimizeOptions,
        snapshots: Option<&mut Vec<Snapshot>>,
    ) -> Result<MinimizeOutcome, ForceFieldError>;
}
