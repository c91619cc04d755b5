use super::{Contribution, accumulate_pair_gradient, check_index};
use crate::core::forcefield::params::DielectricModel;
use crate::core::forcefield::potentials::{damped_coulomb, damped_coulomb_derivative};
use crate::engine::error::ForceFieldError;
use crate::engine::forcefield::ForceField;

const ZERO_DISTANCE_GRADIENT: f64 = 0.02;

/// MMFF damped Coulomb interaction between two charged points.
#[derive(Debug, Clone, PartialEq)]
pub struct EleContrib {
    indices: [usize; 2],
    charge_term: f64,
    model: DielectricModel,
    is_1_4: bool,
}

impl EleContrib {
    /// `charge_term` is `q1·q2/dielectric`, see [`crate::core::forcefield::params::charge_term`].
    pub fn new(
        owner: &ForceField,
        idx1: usize,
        idx2: usize,
        charge_term: f64,
        model: DielectricModel,
        is_1_4: bool,
    ) -> Result<Self, ForceFieldError> {
        Ok(Self {
            indices: [check_index(owner, idx1)?, check_index(owner, idx2)?],
            charge_term,
            model,
            is_1_4,
        })
    }

    pub fn charge_term(&self) -> f64 {
        self.charge_term
    }

    pub fn model(&self) -> DielectricModel {
        self.model
    }

    pub fn is_1_4(&self) -> bool {
        self.is_1_4
    }
}

impl Contribution for EleContrib {
    fn name(&self) -> &'static str {
        "electrostatic"
    }

    fn point_indices(&self) -> &[usize] {
        &self.indices
    }

    fn energy(&self, field: &ForceField, pos: &[f64]) -> f64 {
        let [i, j] = self.indices;
        let dist = field.pair_distance(i, j, pos);
        damped_coulomb(dist, self.charge_term, self.model, self.is_1_4)
    }

    fn accumulate_gradient(&self, field: &ForceField, pos: &[f64], grad: &mut [f64]) {
        let [i, j] = self.indices;
        let dist = field.pair_distance(i, j, pos);
        let de_dr = damped_coulomb_derivative(dist, self.charge_term, self.model, self.is_1_4);
        accumulate_pair_gradient(
            field,
            pos,
            grad,
            (i, j),
            dist,
            de_dr,
            ZERO_DISTANCE_GRADIENT,
        );
    }

    fn clone_box(&self) -> Box<dyn Contribution> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::point::shared_point;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn pair(separation: f64) -> ForceField {
        let mut field = ForceField::new(3);
        field.add_point(shared_point(&[0.0, 0.0, 0.0]));
        field.add_point(shared_point(&[0.0, separation, 0.0]));
        field
    }

    #[test]
    fn distance_dependent_dielectric_energy_at_two_angstroms() {
        let field = pair(2.0);
        let contrib = EleContrib::new(&field, 0, 1, 1.0, DielectricModel::Distance, false).unwrap();
        let energy = contrib.energy(&field, &field.scatter());
        assert!(f64_approx_equal(energy, 332.0716 / (2.05 * 2.05)));
    }

    #[test]
    fn one_four_pairs_are_scaled() {
        let field = pair(2.5);
        let pos = field.scatter();
        let full = EleContrib::new(&field, 0, 1, -0.3, DielectricModel::Constant, false).unwrap();
        let scaled = EleContrib::new(&field, 0, 1, -0.3, DielectricModel::Constant, true).unwrap();
        assert!(f64_approx_equal(
            scaled.energy(&field, &pos),
            0.75 * full.energy(&field, &pos)
        ));
    }

    #[test]
    fn like_charges_push_apart_with_balanced_gradient() {
        let field = pair(2.0);
        let contrib = EleContrib::new(&field, 0, 1, 0.5, DielectricModel::Constant, false).unwrap();
        let mut grad = vec![0.0; 6];
        contrib.accumulate_gradient(&field, &field.scatter(), &mut grad);

        // Point 1 sits at +y; repulsion lowers energy as it moves further out.
        assert!(grad[4] < 0.0);
        assert!(grad[1] > 0.0);
        for k in 0..3 {
            assert_eq!(grad[k] + grad[3 + k], 0.0);
        }
    }

    #[test]
    fn gradient_matches_finite_difference_for_both_models() {
        let field = pair(2.2);
        let pos = field.scatter();
        for model in [DielectricModel::Constant, DielectricModel::Distance] {
            let contrib = EleContrib::new(&field, 0, 1, -0.4, model, false).unwrap();
            let mut grad = vec![0.0; 6];
            contrib.accumulate_gradient(&field, &pos, &mut grad);

            let h = 1e-6;
            let mut plus = pos.clone();
            plus[4] += h;
            let mut minus = pos.clone();
            minus[4] -= h;
            let numeric =
                (contrib.energy(&field, &plus) - contrib.energy(&field, &minus)) / (2.0 * h);
            assert!((grad[4] - numeric).abs() < 1e-5);
        }
    }

    #[test]
    fn coincident_points_use_the_fixed_fallback() {
        let field = pair(0.0);
        let contrib = EleContrib::new(&field, 0, 1, 1.0, DielectricModel::Constant, false).unwrap();
        let mut grad = vec![0.0; 6];
        contrib.accumulate_gradient(&field, &field.scatter(), &mut grad);
        assert_eq!(&grad[..3], &[0.02, 0.02, 0.02]);
        assert_eq!(&grad[3..], &[-0.02, -0.02, -0.02]);
    }

    #[test]
    fn construction_rejects_an_out_of_range_index() {
        let field = pair(2.0);
        let result = EleContrib::new(&field, 5, 1, 1.0, DielectricModel::Constant, false);
        assert!(matches!(
            result,
            Err(ForceFieldError::IndexOutOfRange { index: 5, .. })
        ));
    }
}
