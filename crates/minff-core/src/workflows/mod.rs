//! # Workflows Module
//!
//! High-level entry points built on top of the engines. Workflows take care of
//! fanning work out across independent engines, logging and progress reporting,
//! so callers only deal with engines and options.
//!
//! - **Batch minimization** ([`batch`]) - minimizes many independent engines,
//!   in parallel when the `parallel` feature is enabled.

pub mod batch;
