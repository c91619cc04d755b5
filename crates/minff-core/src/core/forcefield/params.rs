use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const WELL_DEPTH_PREFACTOR: f64 = 181.16;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum DonorAcceptor {
    #[serde(rename = "D")]
    Donor,
    #[serde(rename = "A")]
    Acceptor,
    #[default]
    #[serde(rename = "-")]
    Neither,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DielectricModel {
    #[default]
    Constant,
    #[serde(rename = "distance-dependent")]
    Distance,
}

impl DielectricModel {
    /// Power of the distance in the Coulomb denominator.
    #[inline]
    pub fn exponent(self) -> i32 {
        match self {
            Self::Constant => 1,
            Self::Distance => 2,
        }
    }
}

/// Per-atom van der Waals parameters as found in MMFF94 tables.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct MmffVdwParams {
    pub alpha_i: f64,
    pub n_i: f64,
    pub a_i: f64,
    pub g_i: f64,
    /// Tabulated R*ii. When absent it is derived from `a_i` and `alpha_i`.
    #[serde(default)]
    pub r_star: Option<f64>,
    #[serde(default)]
    pub da: DonorAcceptor,
}

/// Pairwise equilibrium distance and well depth consumed by [`super::contribs::vdw::VdwContrib`].
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct VdwPairParams {
    pub r_star_ij: f64,
    pub well_depth: f64,
}

impl VdwPairParams {
    pub fn new(r_star_ij: f64, well_depth: f64) -> Self {
        Self {
            r_star_ij,
            well_depth,
        }
    }
}

/// Van der Waals parameter lookup, built explicitly and passed to whoever needs it.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MmffVdwCollection {
    pub power: f64,
    pub b: f64,
    pub beta: f64,
    pub darad: f64,
    pub daeps: f64,
    pub atoms: HashMap<String, MmffVdwParams>,
}

impl Default for MmffVdwCollection {
    fn default() -> Self {
        Self {
            power: 0.25,
            b: 0.2,
            beta: 12.0,
            darad: 0.8,
            daeps: 0.5,
            atoms: HashMap::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

impl MmffVdwCollection {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn get(&self, atom_type: &str) -> Option<&MmffVdwParams> {
        self.atoms.get(atom_type)
    }

    /// R*ii = A_i * alpha_i^power unless the table gives it directly.
    #[inline]
    pub fn r_star_ii(&self, params: &MmffVdwParams) -> f64 {
        params
            .r_star
            .unwrap_or_else(|| params.a_i * params.alpha_i.powf(self.power))
    }
}

/// Combined R*ij before any donor/acceptor rescaling.
pub fn calc_unscaled_vdw_minimum(
    collection: &MmffVdwCollection,
    i: &MmffVdwParams,
    j: &MmffVdwParams,
) -> f64 {
    let (r_ii, r_jj) = (collection.r_star_ii(i), collection.r_star_ii(j));
    let gamma_ij = (r_ii - r_jj) / (r_ii + r_jj);
    let have_donor = i.da == DonorAcceptor::Donor || j.da == DonorAcceptor::Donor;
    let skew = if have_donor {
        0.0
    } else {
        collection.b * (1.0 - (-collection.beta * gamma_ij * gamma_ij).exp())
    };
    0.5 * (r_ii + r_jj) * (1.0 + skew)
}

/// Combined well depth for a pair at the given R*ij.
pub fn calc_unscaled_vdw_well_depth(r_star_ij: f64, i: &MmffVdwParams, j: &MmffVdwParams) -> f64 {
    let r_star_ij6 = r_star_ij.powi(6);
    let epsilon = i.g_i * j.g_i * i.alpha_i * j.alpha_i
        / (((i.alpha_i / i.n_i).sqrt() + (j.alpha_i / j.n_i).sqrt()) * r_star_ij6);
    WELL_DEPTH_PREFACTOR * epsilon
}

/// Donor/acceptor pairs get a shorter, shallower well.
pub fn scale_vdw_params(
    pair: &mut VdwPairParams,
    collection: &MmffVdwCollection,
    i: &MmffVdwParams,
    j: &MmffVdwParams,
) {
    let donor_acceptor = matches!(
        (i.da, j.da),
        (DonorAcceptor::Donor, DonorAcceptor::Acceptor)
            | (DonorAcceptor::Acceptor, DonorAcceptor::Donor)
    );
    if donor_acceptor {
        pair.r_star_ij *= collection.darad;
        pair.well_depth *= collection.daeps;
    }
}

pub fn vdw_pair_params(
    collection: &MmffVdwCollection,
    i: &MmffVdwParams,
    j: &MmffVdwParams,
) -> VdwPairParams {
    let r_star_ij = calc_unscaled_vdw_minimum(collection, i, j);
    let well_depth = calc_unscaled_vdw_well_depth(r_star_ij, i, j);
    let mut pair = VdwPairParams::new(r_star_ij, well_depth);
    scale_vdw_params(&mut pair, collection, i, j);
    pair
}

/// Charge product divided by the dielectric constant, the `chargeTerm` of the Coulomb contribution.
#[inline]
pub fn charge_term(q1: f64, q2: f64, dielectric_constant: f64) -> f64 {
    q1 * q2 / dielectric_constant
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn atom(r_star: f64, da: DonorAcceptor) -> MmffVdwParams {
        MmffVdwParams {
            alpha_i: 1.05,
            n_i: 2.9,
            a_i: 3.89,
            g_i: 1.282,
            r_star: Some(r_star),
            da,
        }
    }

    #[test]
    fn identical_atoms_combine_to_their_own_r_star() {
        let collection = MmffVdwCollection::default();
        let a = atom(3.2, DonorAcceptor::Neither);
        assert!(f64_approx_equal(
            calc_unscaled_vdw_minimum(&collection, &a, &a),
            3.2
        ));
    }

    #[test]
    fn unlike_atoms_are_skewed_towards_the_larger_radius() {
        let collection = MmffVdwCollection::default();
        let a = atom(3.0, DonorAcceptor::Neither);
        let b = atom(2.0, DonorAcceptor::Neither);
        let r = calc_unscaled_vdw_minimum(&collection, &a, &b);
        let gamma: f64 = 0.2;
        let expected = 2.5 * (1.0 + 0.2 * (1.0 - (-12.0 * gamma * gamma).exp()));
        assert!(f64_approx_equal(r, expected));
        assert!(r > 2.5);
    }

    #[test]
    fn donor_disables_the_skew_term() {
        let collection = MmffVdwCollection::default();
        let a = atom(3.0, DonorAcceptor::Donor);
        let b = atom(2.0, DonorAcceptor::Neither);
        assert!(f64_approx_equal(
            calc_unscaled_vdw_minimum(&collection, &a, &b),
            2.5
        ));
    }

    #[test]
    fn well_depth_follows_the_mmff_expression() {
        let a = atom(3.0, DonorAcceptor::Neither);
        let r: f64 = 3.0;
        let expected = 181.16 * 1.282 * 1.282 * 1.05 * 1.05
            / ((2.0 * (1.05f64 / 2.9).sqrt()) * r.powi(6));
        assert!(f64_approx_equal(
            calc_unscaled_vdw_well_depth(r, &a, &a),
            expected
        ));
    }

    #[test]
    fn donor_acceptor_pairs_are_rescaled() {
        let collection = MmffVdwCollection::default();
        let d = atom(3.0, DonorAcceptor::Donor);
        let a = atom(3.0, DonorAcceptor::Acceptor);
        let mut pair = VdwPairParams::new(3.0, 0.2);
        scale_vdw_params(&mut pair, &collection, &d, &a);
        assert!(f64_approx_equal(pair.r_star_ij, 2.4));
        assert!(f64_approx_equal(pair.well_depth, 0.1));
    }

    #[test]
    fn donor_donor_pairs_are_left_alone() {
        let collection = MmffVdwCollection::default();
        let d = atom(3.0, DonorAcceptor::Donor);
        let mut pair = VdwPairParams::new(3.0, 0.2);
        scale_vdw_params(&mut pair, &collection, &d, &d);
        assert_eq!(pair, VdwPairParams::new(3.0, 0.2));
    }

    #[test]
    fn vdw_pair_params_applies_rescaling_after_combining() {
        let collection = MmffVdwCollection::default();
        let d = atom(3.0, DonorAcceptor::Donor);
        let a = atom(3.0, DonorAcceptor::Acceptor);
        let pair = vdw_pair_params(&collection, &d, &a);
        let unscaled_well = calc_unscaled_vdw_well_depth(3.0, &d, &a);
        assert!(f64_approx_equal(pair.r_star_ij, 3.0 * 0.8));
        assert!(f64_approx_equal(pair.well_depth, unscaled_well * 0.5));
    }

    #[test]
    fn charge_term_divides_product_by_dielectric() {
        assert!(f64_approx_equal(charge_term(0.5, -0.4, 4.0), -0.05));
    }

    #[test]
    fn dielectric_model_exponents() {
        assert_eq!(DielectricModel::Constant.exponent(), 1);
        assert_eq!(DielectricModel::Distance.exponent(), 2);
    }

    #[test]
    fn load_succeeds_with_valid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("vdw.toml");
        fs::write(
            &file_path,
            r#"
            darad = 0.75

            [atoms.1]
            alpha_i = 1.05
            n_i = 2.9
            a_i = 3.89
            g_i = 1.282
            r_star = 3.94
            da = "-"

            [atoms.21]
            alpha_i = 0.15
            n_i = 0.8
            a_i = 4.2
            g_i = 1.209
            r_star = 1.08
            da = "D"
            "#,
        )
        .unwrap();

        let collection = MmffVdwCollection::load(&file_path).unwrap();
        assert_eq!(collection.darad, 0.75);
        assert_eq!(collection.beta, 12.0);
        assert_eq!(collection.get("21").map(|p| p.da), Some(DonorAcceptor::Donor));
        assert_eq!(collection.get("1").and_then(|p| p.r_star), Some(3.94));
        assert!(collection.get("2").is_none());
    }

    #[test]
    fn r_star_is_derived_from_polarizability_when_not_tabulated() {
        let collection = MmffVdwCollection::default();
        let derived = MmffVdwParams {
            r_star: None,
            ..atom(0.0, DonorAcceptor::Neither)
        };
        let expected = 3.89 * 1.05f64.powf(0.25);
        assert!(f64_approx_equal(collection.r_star_ii(&derived), expected));
        assert!(f64_approx_equal(
            calc_unscaled_vdw_minimum(&collection, &derived, &derived),
            expected
        ));
    }

    #[test]
    fn derived_r_star_follows_the_collection_power() {
        let collection = MmffVdwCollection {
            power: 0.5,
            ..MmffVdwCollection::default()
        };
        let derived = MmffVdwParams {
            r_star: None,
            ..atom(0.0, DonorAcceptor::Neither)
        };
        assert!(f64_approx_equal(
            collection.r_star_ii(&derived),
            3.89 * 1.05f64.sqrt()
        ));
    }

    #[test]
    fn tabulated_r_star_takes_precedence() {
        let collection = MmffVdwCollection::default();
        let tabulated = atom(3.2, DonorAcceptor::Neither);
        assert!(f64_approx_equal(collection.r_star_ii(&tabulated), 3.2));
    }

    #[test]
    fn load_derives_r_star_for_rows_without_one() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("vdw.toml");
        fs::write(
            &file_path,
            r#"
            [atoms.5]
            alpha_i = 0.25
            n_i = 0.8
            a_i = 4.2
            g_i = 1.209
            "#,
        )
        .unwrap();

        let collection = MmffVdwCollection::load(&file_path).unwrap();
        let params = collection.get("5").unwrap();
        assert_eq!(params.r_star, None);
        assert!(f64_approx_equal(
            collection.r_star_ii(params),
            4.2 * 0.25f64.powf(0.25)
        ));
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = MmffVdwCollection::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("malformed.toml");
        fs::write(&file_path, "this is not toml").unwrap();
        let result = MmffVdwCollection::load(&file_path);
        assert!(matches!(result, Err(ParamLoadError::Toml { .. })));
    }
}
