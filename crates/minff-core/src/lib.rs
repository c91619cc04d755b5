//! # minff Core Library
//!
//! A contribution-based potential-energy minimization engine. Given a set of
//! N-dimensional points and a list of pluggable energy terms, it evaluates the
//! total energy and its gradient and drives a quasi-Newton optimizer to a local
//! minimum.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same layered split as the rest of our tooling:
//!
//! - **[`core`]: The Foundation.** Shared point storage, pure potential
//!   functions, parameter types with their combining rules, the concrete
//!   energy contributions, and point-file I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful [`engine::forcefield::ForceField`]
//!   with its lazily filled distance cache, the minimization adapter that feeds
//!   a stabilized gradient to the solver, and the BFGS solver itself.
//!
//! - **[`accelerated`]: Native Backend.** An alternative engine evaluating
//!   through an opaque native physics context while honouring the same
//!   energy/gradient/minimize contract (feature `accelerated`).
//!
//! - **[`workflows`]: The Public API.** High-level entry points such as batch
//!   minimization of independent engines.

#[cfg(feature = "accelerated")]
pub mod accelerated;
pub mod core;
pub mod engine;
pub mod workflows;
