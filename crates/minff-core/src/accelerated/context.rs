use crate::engine::error::ForceFieldError;
use crate::engine::state::MinimizeOutcome;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Platform-specific settings, e.g. device index or precision.
pub type PropertyMap = BTreeMap<String, String>;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl From<BackendError> for ForceFieldError {
    fn from(err: BackendError) -> Self {
        ForceFieldError::Backend(err.0)
    }
}

/// An execution platform a context can be created on.
pub trait Platform: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn default_properties(&self) -> PropertyMap {
        PropertyMap::new()
    }
}

/// A native evaluation context holding particle positions in backend units
/// (nm, kJ/mol).
pub trait NativeContext: Send {
    fn set_positions(&mut self, positions: &[[f64; 3]]) -> Result<(), BackendError>;

    fn positions(&self) -> Result<Vec<[f64; 3]>, BackendError>;

    /// Potential energy in kJ/mol.
    fn potential_energy(&self) -> Result<f64, BackendError>;

    /// Forces in kJ/mol/nm.
    fn forces(&self) -> Result<Vec<[f64; 3]>, BackendError>;

    /// Resets integrator state. Positions are kept.
    fn reinitialize(&mut self) -> Result<(), BackendError>;

    /// Runs the backend's own local minimizer. `tolerance` is in kJ/mol/nm and
    /// the returned energy in kJ/mol; the status is the backend's own code.
    fn minimize_local(
        &mut self,
        tolerance: f64,
        max_iterations: usize,
    ) -> Result<MinimizeOutcome, BackendError>;
}

/// Creates contexts for one particle system.
pub trait ContextFactory: Send + Sync {
    type Context: NativeContext;

    fn platform_by_name(&self, name: &str) -> Result<Arc<dyn Platform>, BackendError>;

    /// `platform` is `None` when the backend should choose.
    fn create_context(
        &self,
        platform: Option<&dyn Platform>,
        properties: &PropertyMap,
        step_size_ps: f64,
    ) -> Result<Self::Context, BackendError>;
}
