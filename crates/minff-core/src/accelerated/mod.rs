//! Accelerated backend variant.
//!
//! [`forcefield::AcceleratedForceField`] satisfies the same [`crate::engine::EnergyEngine`]
//! contract as the contribution-based engine but delegates evaluation and
//! minimization to a native context created through a [`context::ContextFactory`].
//! [`reference`] provides a CPU implementation of that capability.

pub mod context;
pub mod forcefield;
pub mod reference;
pub mod units;
