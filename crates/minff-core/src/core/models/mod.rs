//! # Models Module
//!
//! Data structures describing the positions an engine works on.
//!
//! Points are shared between the engine and whichever external owner produced
//! them (a conformer, a trajectory frame, a test fixture). Neither side assumes
//! exclusive ownership; the storage lives as long as its longest holder.

pub mod point;
