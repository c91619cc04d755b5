use crate::error::{CliError, Result};
use minff::core::forcefield::contribs::{
    AngleBendContrib, BondStretchContrib, Contribution, DistanceConstraintContrib, EleContrib,
    VdwContrib,
};
use minff::core::forcefield::params::{DielectricModel, VdwPairParams};
use minff::core::models::point::{self, LabeledPoint, shared_point};
use minff::engine::forcefield::ForceField;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

fn default_dimension() -> usize {
    3
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PointSpec {
    #[serde(default)]
    pub label: String,
    pub coords: Vec<f64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    tag = "type",
    deny_unknown_fields
)]
pub enum ContributionSpec {
    Vdw {
        i: usize,
        j: usize,
        r_star: f64,
        well_depth: f64,
    },
    Electrostatic {
        i: usize,
        j: usize,
        charge_term: f64,
        #[serde(default)]
        dielectric: DielectricModel,
        #[serde(default)]
        one_four: bool,
    },
    BondStretch {
        i: usize,
        j: usize,
        rest_length: f64,
        force_constant: f64,
    },
    AngleBend {
        i: usize,
        vertex: usize,
        k: usize,
        /// Degrees.
        rest_angle: f64,
        force_constant: f64,
    },
    DistanceConstraint {
        i: usize,
        j: usize,
        min: f64,
        max: f64,
        force_constant: f64,
    },
}

impl ContributionSpec {
    fn build(&self, field: &ForceField) -> Result<Box<dyn Contribution>> {
        let contrib: Box<dyn Contribution> = match *self {
            Self::Vdw {
                i,
                j,
                r_star,
                well_depth,
            } => Box::new(VdwContrib::new(
                field,
                i,
                j,
                VdwPairParams::new(r_star, well_depth),
            )?),
            Self::Electrostatic {
                i,
                j,
                charge_term,
                dielectric,
                one_four,
            } => Box::new(EleContrib::new(
                field,
                i,
                j,
                charge_term,
                dielectric,
                one_four,
            )?),
            Self::BondStretch {
                i,
                j,
                rest_length,
                force_constant,
            } => Box::new(BondStretchContrib::new(
                field,
                i,
                j,
                rest_length,
                force_constant,
            )?),
            Self::AngleBend {
                i,
                vertex,
                k,
                rest_angle,
                force_constant,
            } => Box::new(AngleBendContrib::new(
                field,
                i,
                vertex,
                k,
                rest_angle.to_radians(),
                force_constant,
            )?),
            Self::DistanceConstraint {
                i,
                j,
                min,
                max,
                force_constant,
            } => Box::new(DistanceConstraintContrib::new(
                field,
                i,
                j,
                min,
                max,
                force_constant,
            )?),
        };
        Ok(contrib)
    }
}

/// An alternative coordinate set for every point of the system.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConformerSpec {
    pub coords: Vec<Vec<f64>>,
}

/// A point system as described in a TOML file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SystemDescription {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default)]
    pub fixed: Vec<usize>,
    #[serde(default)]
    pub points: Vec<PointSpec>,
    #[serde(default)]
    pub contributions: Vec<ContributionSpec>,
    #[serde(default)]
    pub conformers: Vec<ConformerSpec>,
}

impl SystemDescription {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading system description from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        content.parse::<Self>().map_err(|e| match e {
            CliError::Other(source) => CliError::FileParsing {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    fn coordinate_sets(&self) -> Vec<Vec<&[f64]>> {
        let base = self.points.iter().map(|p| p.coords.as_slice()).collect();
        if self.conformers.is_empty() {
            return vec![base];
        }
        self.conformers
            .iter()
            .map(|c| c.coords.iter().map(Vec::as_slice).collect())
            .collect()
    }

    /// Builds one initialized force field per conformer, or a single one for
    /// the base coordinates when the system has no conformers.
    pub fn build_force_fields(&self) -> Result<Vec<ForceField>> {
        if self.dimension == 0 {
            return Err(CliError::System("dimension must be positive".to_string()));
        }
        let sets = self.coordinate_sets();
        let mut fields = Vec::with_capacity(sets.len());
        for (index, coords) in sets.into_iter().enumerate() {
            if coords.len() != self.points.len() {
                return Err(CliError::System(format!(
                    "conformer {} has {} coordinate set(s), the system has {} point(s)",
                    index + 1,
                    coords.len(),
                    self.points.len()
                )));
            }
            fields.push(self.build_force_field(&coords)?);
        }
        info!(
            points = self.points.len(),
            contributions = self.contributions.len(),
            fields = fields.len(),
            "Built force field(s) from system description."
        );
        Ok(fields)
    }

    fn build_force_field(&self, coords: &[&[f64]]) -> Result<ForceField> {
        let mut field = ForceField::new(self.dimension);
        for c in coords {
            field.add_point(shared_point(c));
        }
        for &index in &self.fixed {
            field.add_fixed_point(index);
        }
        for spec in &self.contributions {
            let contrib = spec.build(&field)?;
            field.add_contribution(contrib);
        }
        field.initialize()?;
        Ok(field)
    }

    /// Current coordinates of `field`, labelled with the system's point labels.
    pub fn labeled_points(&self, field: &ForceField) -> Vec<LabeledPoint> {
        self.points
            .iter()
            .zip(field.points())
            .map(|(spec, p)| LabeledPoint::new(spec.label.clone(), point::read(p).as_slice()))
            .collect()
    }
}

impl std::str::FromStr for SystemDescription {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CliError::Other(e.into()))
    }
}
