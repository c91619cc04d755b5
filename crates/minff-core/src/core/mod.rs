//! # Core Module
//!
//! Stateless building blocks shared by every engine implementation.
//!
//! - **Point Storage** ([`models`]) - Shared, aliasable position vectors
//! - **Energy Terms** ([`forcefield`]) - Potentials, parameters and contribution variants
//! - **File I/O** ([`io`]) - Reading and writing point sets
//!
//! Nothing in here owns engine state. Contributions receive the engine they
//! belong to as a borrow at evaluation time, which keeps them free of
//! back-pointers and makes copying an engine a plain clone.

pub mod forcefield;
pub mod io;
pub mod models;
