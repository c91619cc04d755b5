//! Reading and writing point files.
//!
//! Formats implement [`traits::PointFile`], which supplies path-based helpers
//! on top of reader/writer primitives.

pub mod traits;
pub mod xyz;
