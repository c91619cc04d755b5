use super::error::ForceFieldError;
use super::forcefield::ForceField;
use super::solver::Objective;

const INITIAL_GRADIENT_SCALE: f64 = 0.1;
const MAX_SCALED_GRADIENT: f64 = 10.0;

/// Rescales `grad` in place so no component exceeds 10 in magnitude.
///
/// Starts from a factor of 0.1 and halves it until the largest component fits,
/// then applies the factor once. Returns the factor.
pub fn stabilize_gradient(grad: &mut [f64]) -> f64 {
    let max_abs = grad.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
    let mut scale = INITIAL_GRADIENT_SCALE;
    while max_abs * scale > MAX_SCALED_GRADIENT {
        scale *= 0.5;
    }
    for g in grad.iter_mut() {
        *g *= scale;
    }
    scale
}

/// Presents a [`ForceField`] to a solver as energy and gradient callbacks.
pub struct ForceFieldObjective<'a> {
    field: &'a mut ForceField,
}

impl<'a> ForceFieldObjective<'a> {
    pub fn new(field: &'a mut ForceField) -> Self {
        Self { field }
    }
}

impl Objective for ForceFieldObjective<'_> {
    fn energy(&mut self, x: &[f64]) -> Result<f64, ForceFieldError> {
        self.field.calc_energy_at(x)
    }

    fn gradient(&mut self, x: &[f64], grad: &mut [f64]) -> Result<f64, ForceFieldError> {
        grad.fill(0.0);
        self.field.calc_grad_at(x, grad)?;
        Ok(stabilize_gradient(grad))
    }
}
