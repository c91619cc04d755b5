use super::config::MinimizeOptions;
use super::error::ForceFieldError;
use super::solver::{Objective, QuasiNewtonSolver, STATUS_CONVERGED, STATUS_MAX_ITERATIONS};
use super::state::{MinimizeOutcome, Snapshot};
use nalgebra::{DMatrix, DVector};
use tracing::trace;

const FUNCTOL: f64 = 1e-4;
const MOVETOL: f64 = 1e-7;
const EPS: f64 = 3e-8;
const TOLX: f64 = 4.0 * EPS;
const MAXSTEP: f64 = 100.0;
const MAX_LINE_SEARCH_ITERATIONS: usize = 1000;

/// Dense-Hessian BFGS with a cubic backtracking line search.
///
/// Convergence is declared on the first of: a step smaller than `TOLX`
/// relative to the coordinates, an energy change below
/// `options.energy_tolerance`, or a scaled gradient below
/// `options.force_tolerance`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bfgs;

impl Bfgs {
    pub fn new() -> Self {
        Self
    }
}

#[inline]
fn relative_max(values: &DVector<f64>, reference: &DVector<f64>) -> f64 {
    values
        .iter()
        .zip(reference.iter())
        .fold(0.0, |acc, (v, r)| acc.max(v.abs() / r.abs().max(1.0)))
}

/// Backtracks along `dir` from `old_pos` until the Armijo condition holds.
///
/// On failure `new_pos` is left equal to `old_pos` and `old_val` is returned,
/// which the caller sees as a zero-length step.
fn line_search(
    objective: &mut dyn Objective,
    old_pos: &DVector<f64>,
    old_val: f64,
    grad: &DVector<f64>,
    dir: &mut DVector<f64>,
    new_pos: &mut DVector<f64>,
    max_step: f64,
) -> Result<f64, ForceFieldError> {
    let norm = dir.norm();
    if norm > max_step {
        *dir *= max_step / norm;
    }

    let slope = dir.dot(grad);
    if slope >= 0.0 {
        new_pos.copy_from(old_pos);
        return Ok(old_val);
    }

    let lambda_min = MOVETOL / relative_max(dir, old_pos);
    let mut lambda = 1.0;
    let mut prev_lambda = 0.0;
    let mut prev_val = 0.0;

    for iteration in 0..MAX_LINE_SEARCH_ITERATIONS {
        if lambda < lambda_min {
            break;
        }
        new_pos.copy_from(old_pos);
        new_pos.axpy(lambda, dir, 1.0);
        let new_val = objective.energy(new_pos.as_slice())?;

        if new_val - old_val <= FUNCTOL * lambda * slope {
            return Ok(new_val);
        }

        let next_lambda = if iteration == 0 {
            -slope / (2.0 * (new_val - old_val - slope))
        } else {
            let rhs1 = new_val - old_val - lambda * slope;
            let rhs2 = prev_val - old_val - prev_lambda * slope;
            let a = (rhs1 / (lambda * lambda) - rhs2 / (prev_lambda * prev_lambda))
                / (lambda - prev_lambda);
            let b = (-prev_lambda * rhs1 / (lambda * lambda)
                + lambda * rhs2 / (prev_lambda * prev_lambda))
                / (lambda - prev_lambda);
            let candidate = if a == 0.0 {
                -slope / (2.0 * b)
            } else {
                let disc = b * b - 3.0 * a * slope;
                if disc < 0.0 {
                    0.5 * lambda
                } else if b <= 0.0 {
                    (-b + disc.sqrt()) / (3.0 * a)
                } else {
                    -slope / (b + disc.sqrt())
                }
            };
            candidate.min(0.5 * lambda)
        };

        prev_lambda = lambda;
        prev_val = new_val;
        lambda = next_lambda.max(0.1 * lambda);
    }

    new_pos.copy_from(old_pos);
    Ok(old_val)
}

impl QuasiNewtonSolver for Bfgs {
    fn minimize(
        &self,
        x: &mut [f64],
        objective: &mut dyn Objective,
        options: &MinimizeOptions,
        mut snapshots: Option<&mut Vec<Snapshot>>,
    ) -> Result<MinimizeOutcome, ForceFieldError> {
        let dim = x.len();
        let mut pos = DVector::from_column_slice(x);
        let mut grad = DVector::zeros(dim);
        let mut new_pos = DVector::zeros(dim);

        let mut energy = objective.energy(pos.as_slice())?;
        objective.gradient(pos.as_slice(), grad.as_mut_slice())?;

        let max_step = MAXSTEP * pos.norm().max(dim as f64);
        let mut inv_hessian = DMatrix::<f64>::identity(dim, dim);
        let mut dir = -&grad;

        let finish = |x: &mut [f64], pos: &DVector<f64>, status, iterations, energy| {
            x.copy_from_slice(pos.as_slice());
            MinimizeOutcome {
                status,
                iterations,
                energy,
            }
        };

        for iteration in 1..=options.max_iterations {
            let new_energy = line_search(
                objective,
                &pos,
                energy,
                &grad,
                &mut dir,
                &mut new_pos,
                max_step,
            )?;

            let step = &new_pos - &pos;
            pos.copy_from(&new_pos);
            let energy_change = (energy - new_energy).abs();
            energy = new_energy;

            trace!(iteration, energy, energy_change, "BFGS step");

            let record =
                options.snapshot_frequency > 0 && iteration % options.snapshot_frequency == 0;
            if let Some(snaps) = snapshots.as_deref_mut().filter(|_| record) {
                snaps.push(Snapshot::new(pos.as_slice().to_vec(), energy));
            }

            if relative_max(&step, &pos) < TOLX {
                return Ok(finish(x, &pos, STATUS_CONVERGED, iteration, energy));
            }
            if energy_change < options.energy_tolerance {
                return Ok(finish(x, &pos, STATUS_CONVERGED, iteration, energy));
            }

            let prev_grad = grad.clone();
            let grad_scale = objective.gradient(pos.as_slice(), grad.as_mut_slice())?;

            let grad_test = relative_max_product(&grad, &pos) / (energy * grad_scale).max(1.0);
            if grad_test < options.force_tolerance {
                return Ok(finish(x, &pos, STATUS_CONVERGED, iteration, energy));
            }

            let d_grad = &grad - &prev_grad;
            let hd_grad = &inv_hessian * &d_grad;
            let fac = d_grad.dot(&step);
            let fae = d_grad.dot(&hd_grad);
            let sum_d_grad = d_grad.norm_squared();
            let sum_step = step.norm_squared();

            if fac > (EPS * sum_d_grad * sum_step).sqrt() {
                let fac = 1.0 / fac;
                let fad = 1.0 / fae;
                let u = &step * fac - &hd_grad * fad;
                inv_hessian.ger(fac, &step, &step, 1.0);
                inv_hessian.ger(-fad, &hd_grad, &hd_grad, 1.0);
                inv_hessian.ger(fae, &u, &u, 1.0);
            }

            dir = -(&inv_hessian * &grad);
        }

        Ok(finish(
            x,
            &pos,
            STATUS_MAX_ITERATIONS,
            options.max_iterations,
            energy,
        ))
    }
}

#[inline]
fn relative_max_product(grad: &DVector<f64>, pos: &DVector<f64>) -> f64 {
    grad.iter()
        .zip(pos.iter())
        .fold(0.0, |acc, (g, p)| acc.max(g.abs() * p.abs().max(1.0)))
}
