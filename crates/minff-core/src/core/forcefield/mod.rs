//! # Force Field Module
//!
//! Energy terms for the minimization engine.
//!
//! ## Overview
//!
//! A force field is modelled as an ordered list of independent, additive
//! contributions. Each contribution reads a flattened position buffer and either
//! returns its energy or adds its gradient into a caller-owned buffer. The
//! engine sums them; nothing here knows about the optimizer.
//!
//! ## Key Components
//!
//! - [`potentials`] - Pure functional forms (buffered 14-7 van der Waals, damped Coulomb, harmonic)
//! - [`params`] - Per-atom van der Waals parameters and the MMFF combining rules
//! - [`contribs`] - The [`contribs::Contribution`] capability and its concrete variants
//! - [`term`] - Per-contribution energy breakdown reporting
//!
//! ## Usage
//!
//! ```ignore
//! use minff::core::forcefield::contribs::vdw::VdwContrib;
//! use minff::core::forcefield::params::VdwPairParams;
//!
//! let contrib = VdwContrib::new(&field, 0, 1, VdwPairParams::new(4.0, 0.1))?;
//! field.add_contribution(Box::new(contrib));
//! ```

pub mod contribs;
pub mod params;
pub(crate) mod potentials;
pub mod term;
