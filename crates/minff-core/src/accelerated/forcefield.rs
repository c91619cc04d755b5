use super::context::{ContextFactory, NativeContext, PropertyMap};
use super::units::{
    ANGSTROMS_PER_NM, KCAL_PER_KJ, KJ_PER_KCAL, PS_PER_FS, accumulate_forces_as_gradient,
    angstrom_buffer_to_nm,
};
use crate::core::models::point::{self, SharedPoint};
use crate::engine::EnergyEngine;
use crate::engine::config::MinimizeOptions;
use crate::engine::error::ForceFieldError;
use crate::engine::state::MinimizeOutcome;
use tracing::{debug, info, instrument, warn};

const DIMENSION: usize = 3;

/// Default integrator step size in femtoseconds.
pub const DEFAULT_STEP_SIZE: f64 = 2.0;

/// Engine that evaluates energies and gradients through a native context
/// instead of a contribution list.
///
/// Positions are exchanged with the context in nm and kJ/mol and converted to
/// Å and kcal/mol at the boundary. Every temporary position swap happens inside
/// a single `&mut self` call, so no other access can observe it half done.
pub struct AcceleratedForceField<F: ContextFactory> {
    factory: F,
    points: Vec<SharedPoint>,
    step_size: f64,
    context: Option<F::Context>,
    platform_name: Option<String>,
    platform_properties: PropertyMap,
    stored_positions: Vec<[f64; 3]>,
}

impl<F: ContextFactory> AcceleratedForceField<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            points: Vec::new(),
            step_size: DEFAULT_STEP_SIZE,
            context: None,
            platform_name: None,
            platform_properties: PropertyMap::new(),
            stored_positions: Vec::new(),
        }
    }

    /// Step size in femtoseconds used for contexts created afterwards.
    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn points(&self) -> &[SharedPoint] {
        &self.points
    }

    pub fn add_point(&mut self, point: SharedPoint) -> Result<(), ForceFieldError> {
        let actual = point::read(&point).len();
        if actual != DIMENSION {
            return Err(ForceFieldError::DimensionMismatch {
                expected: DIMENSION,
                actual,
            });
        }
        self.points.push(point);
        Ok(())
    }

    pub fn platform_name(&self) -> Option<&str> {
        self.platform_name.as_deref()
    }

    pub fn platform_properties(&self) -> &PropertyMap {
        &self.platform_properties
    }

    pub fn context(&self) -> Result<&F::Context, ForceFieldError> {
        self.context
            .as_ref()
            .ok_or_else(|| ForceFieldError::Backend("Context has not been created yet".to_string()))
    }

    fn context_mut(&mut self) -> Result<&mut F::Context, ForceFieldError> {
        self.context
            .as_mut()
            .ok_or_else(|| ForceFieldError::Backend("Context has not been created yet".to_string()))
    }

    fn resident_positions_nm(&self) -> Vec<[f64; 3]> {
        angstrom_buffer_to_nm(&point::flatten(&self.points))
    }

    /// Creates the context on first use, reinitializes it afterwards.
    ///
    /// A freshly created context receives the current point positions.
    pub fn initialize_context(&mut self) -> Result<(), ForceFieldError> {
        if let Some(ctx) = self.context.as_mut() {
            ctx.reinitialize()?;
            debug!("Context reinitialized");
            return Ok(());
        }

        let platform = match &self.platform_name {
            Some(name) => Some(self.factory.platform_by_name(name)?),
            None => None,
        };
        let mut ctx = self.factory.create_context(
            platform.as_deref(),
            &self.platform_properties,
            self.step_size * PS_PER_FS,
        )?;
        ctx.set_positions(&self.resident_positions_nm())?;
        self.context = Some(ctx);
        debug!(platform = ?self.platform_name, "Context created");
        Ok(())
    }

    /// Moves to `platform_name` with `properties`.
    ///
    /// A new context is only built when there is none yet or when the platform
    /// or its properties differ from the current ones; otherwise the existing
    /// context is reinitialized. Positions survive the swap.
    pub fn initialize_context_on(
        &mut self,
        platform_name: &str,
        properties: &PropertyMap,
    ) -> Result<(), ForceFieldError> {
        let need_new_context = self.context.is_none()
            || self.platform_name.as_deref() != Some(platform_name)
            || &self.platform_properties != properties;
        if !need_new_context {
            return self.initialize_context();
        }

        let platform = self.factory.platform_by_name(platform_name)?;
        let carried = match &self.context {
            Some(old) => old.positions()?,
            None => self.resident_positions_nm(),
        };
        // The current context stays in place until its replacement is ready.
        let mut ctx = self.factory.create_context(
            Some(platform.as_ref()),
            properties,
            self.step_size * PS_PER_FS,
        )?;
        if !carried.is_empty() {
            ctx.set_positions(&carried)?;
        }
        self.context = Some(ctx);
        self.platform_name = Some(platform_name.to_string());
        self.platform_properties = properties.clone();
        debug!(platform = platform_name, "Context created on new platform");
        Ok(())
    }

    pub fn copy_positions_to(&self, other: &mut F::Context) -> Result<(), ForceFieldError> {
        other.set_positions(&self.context()?.positions()?)?;
        Ok(())
    }

    /// Takes positions from `other` into this context and the shared points.
    pub fn copy_positions_from(&mut self, other: &F::Context) -> Result<(), ForceFieldError> {
        let positions = other.positions()?;
        self.context_mut()?.set_positions(&positions)?;
        self.write_points(&positions)
    }

    /// Pulls the context positions back into the shared points.
    pub fn update_positions(&mut self) -> Result<(), ForceFieldError> {
        let positions = self.context()?.positions()?;
        self.write_points(&positions)
    }

    fn write_points(&self, positions: &[[f64; 3]]) -> Result<(), ForceFieldError> {
        if positions.len() != self.points.len() {
            return Err(ForceFieldError::BufferLength {
                expected: self.points.len() * DIMENSION,
                actual: positions.len() * DIMENSION,
            });
        }
        for (p, nm) in self.points.iter().zip(positions) {
            let mut guard = point::write(p);
            for (coord, value) in guard.iter_mut().zip(nm) {
                *coord = value * ANGSTROMS_PER_NM;
            }
        }
        Ok(())
    }

    fn check_buffer(&self, buffer: &[f64]) -> Result<(), ForceFieldError> {
        let expected = self.points.len() * DIMENSION;
        if buffer.len() != expected {
            return Err(ForceFieldError::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(())
    }

    fn replace_positions(&mut self, pos: &[f64]) -> Result<(), ForceFieldError> {
        let ctx = self.context.as_mut().ok_or_else(|| {
            ForceFieldError::Backend("Context has not been created yet".to_string())
        })?;
        self.stored_positions = ctx.positions()?;
        ctx.set_positions(&angstrom_buffer_to_nm(pos))?;
        Ok(())
    }

    fn restore_positions(&mut self) -> Result<(), ForceFieldError> {
        let stored = std::mem::take(&mut self.stored_positions);
        self.context_mut()?.set_positions(&stored)?;
        Ok(())
    }

    /// Evaluates `eval` with `pos` swapped into the context, restoring the
    /// previous positions even when the evaluation fails.
    fn with_positions<T>(
        &mut self,
        pos: &[f64],
        eval: impl FnOnce(&F::Context) -> Result<T, ForceFieldError>,
    ) -> Result<T, ForceFieldError> {
        self.check_buffer(pos)?;
        self.replace_positions(pos)?;
        let result = self.context().and_then(eval);
        self.restore_positions()?;
        result
    }

    /// Energy at the context positions in kcal/mol.
    pub fn calc_energy(&self) -> Result<f64, ForceFieldError> {
        Ok(self.context()?.potential_energy()? * KCAL_PER_KJ)
    }

    pub fn calc_energy_at(&mut self, pos: &[f64]) -> Result<f64, ForceFieldError> {
        self.with_positions(pos, |ctx| Ok(ctx.potential_energy()? * KCAL_PER_KJ))
    }

    /// Accumulates the gradient (kcal/mol/Å) at the context positions into `grad`.
    pub fn calc_grad(&self, grad: &mut [f64]) -> Result<(), ForceFieldError> {
        self.check_buffer(grad)?;
        accumulate_forces_as_gradient(&self.context()?.forces()?, grad);
        Ok(())
    }

    pub fn calc_grad_at(&mut self, pos: &[f64], grad: &mut [f64]) -> Result<(), ForceFieldError> {
        self.check_buffer(grad)?;
        let forces = self.with_positions(pos, |ctx| Ok(ctx.forces()?))?;
        accumulate_forces_as_gradient(&forces, grad);
        Ok(())
    }

    /// Runs the backend minimizer and returns its status code.
    ///
    /// The energy tolerance has no counterpart in the backend and is ignored.
    pub fn minimize(
        &mut self,
        max_iterations: usize,
        force_tolerance: f64,
        _energy_tolerance: f64,
    ) -> Result<i32, ForceFieldError> {
        let options = MinimizeOptions::new(max_iterations, force_tolerance, 0.0);
        self.minimize_with(&options).map(|o| o.status)
    }

    #[instrument(skip_all, name = "accelerated_minimize")]
    pub fn minimize_with(
        &mut self,
        options: &MinimizeOptions,
    ) -> Result<MinimizeOutcome, ForceFieldError> {
        let tolerance = options.force_tolerance * KJ_PER_KCAL * ANGSTROMS_PER_NM;
        info!(
            points = self.points.len(),
            max_iterations = options.max_iterations,
            "Starting backend minimization"
        );
        let outcome = self
            .context_mut()?
            .minimize_local(tolerance, options.max_iterations)?;
        self.update_positions()?;

        let outcome = MinimizeOutcome {
            energy: outcome.energy * KCAL_PER_KJ,
            ..outcome
        };
        if !outcome.converged() {
            warn!(status = outcome.status, "Backend minimization did not converge");
        }
        Ok(outcome)
    }
}

impl<F: ContextFactory> EnergyEngine for AcceleratedForceField<F> {
    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn num_points(&self) -> usize {
        self.points.len()
    }

    fn calc_energy(&self) -> Result<f64, ForceFieldError> {
        AcceleratedForceField::calc_energy(self)
    }

    fn calc_energy_at(&mut self, pos: &[f64]) -> Result<f64, ForceFieldError> {
        AcceleratedForceField::calc_energy_at(self, pos)
    }

    fn calc_grad(&self, grad: &mut [f64]) -> Result<(), ForceFieldError> {
        AcceleratedForceField::calc_grad(self, grad)
    }

    fn calc_grad_at(&mut self, pos: &[f64], grad: &mut [f64]) -> Result<(), ForceFieldError> {
        AcceleratedForceField::calc_grad_at(self, pos, grad)
    }

    fn minimize_with_options(
        &mut self,
        options: &MinimizeOptions,
    ) -> Result<MinimizeOutcome, ForceFieldError> {
        self.minimize_with(options)
    }
}
