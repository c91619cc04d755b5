use super::params::DielectricModel;

pub const ELE_CONSTANT: f64 = 332.0716; // In kcal·Å/(mol·e²)
pub const ELE_DAMPING: f64 = 0.05;
pub const ELE_SCALE_1_4: f64 = 0.75;

const VDW_BUFFER_A: f64 = 1.07;
const VDW_BUFFER_B: f64 = 1.12;

/// Buffered 14-7 energy. At `dist == r_star` this evaluates to `-well_depth`.
#[inline]
pub fn buffered_14_7(dist: f64, r_star: f64, well_depth: f64) -> f64 {
    let dist7 = dist.powi(7);
    let a_term = VDW_BUFFER_A * r_star / (dist + (VDW_BUFFER_A - 1.0) * r_star);
    let r_star7 = r_star.powi(7);
    let b_term = VDW_BUFFER_B * r_star7 / (dist7 + (VDW_BUFFER_B - 1.0) * r_star7) - 2.0;
    well_depth * a_term.powi(7) * b_term
}

/// dE/dr of [`buffered_14_7`].
#[inline]
pub fn buffered_14_7_derivative(dist: f64, r_star: f64, well_depth: f64) -> f64 {
    let b7 = VDW_BUFFER_B * 7.0;
    let q = dist / r_star;
    let q6 = q.powi(6);
    let q7_buffered = q6 * q + (VDW_BUFFER_B - 1.0);
    let t = VDW_BUFFER_A / (q + VDW_BUFFER_A - 1.0);
    let t7 = t.powi(7);
    well_depth / r_star
        * t7
        * (-b7 * q6 / (q7_buffered * q7_buffered)
            + (-b7 / q7_buffered + 14.0) / (q + (VDW_BUFFER_A - 1.0)))
}

#[inline]
fn ele_scale(is_1_4: bool) -> f64 {
    if is_1_4 { ELE_SCALE_1_4 } else { 1.0 }
}

/// Damped Coulomb energy, `k·c / (r + δ)^n` with `n` taken from the dielectric model.
#[inline]
pub fn damped_coulomb(dist: f64, charge_term: f64, model: DielectricModel, is_1_4: bool) -> f64 {
    let corr_dist = (dist + ELE_DAMPING).powi(model.exponent());
    ELE_CONSTANT * charge_term / corr_dist * ele_scale(is_1_4)
}

/// dE/dr of [`damped_coulomb`].
#[inline]
pub fn damped_coulomb_derivative(
    dist: f64,
    charge_term: f64,
    model: DielectricModel,
    is_1_4: bool,
) -> f64 {
    let n = model.exponent();
    let corr_dist = (dist + ELE_DAMPING).powi(n + 1);
    -ELE_CONSTANT * f64::from(n) * charge_term / corr_dist * ele_scale(is_1_4)
}

#[inline]
pub fn harmonic(value: f64, rest_value: f64, force_constant: f64) -> f64 {
    let delta = value - rest_value;
    0.5 * force_constant * delta * delta
}

#[inline]
pub fn harmonic_derivative(value: f64, rest_value: f64, force_constant: f64) -> f64 {
    force_constant * (value - rest_value)
}
