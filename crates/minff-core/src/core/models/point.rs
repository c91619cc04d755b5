use nalgebra::DVector;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A fixed-length position vector. The length is the engine dimension.
pub type Point = DVector<f64>;

/// Position storage shared between an engine and external owners.
///
/// The engine only ever holds clones of the `Arc`, so writes made through
/// [`crate::engine::forcefield::ForceField::gather`] are visible to every
/// other holder of the same point.
pub type SharedPoint = Arc<RwLock<Point>>;

pub fn shared_point(coords: &[f64]) -> SharedPoint {
    Arc::new(RwLock::new(Point::from_column_slice(coords)))
}

/// Read access that survives a poisoned lock; a panicked writer cannot leave
/// a partially written `f64`, so the stored coordinates are still usable.
#[inline]
pub fn read(point: &SharedPoint) -> RwLockReadGuard<'_, Point> {
    point.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[inline]
pub fn write(point: &SharedPoint) -> RwLockWriteGuard<'_, Point> {
    point.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Copies the coordinates of every point into a new point-major buffer.
pub fn flatten(points: &[SharedPoint]) -> Vec<f64> {
    points
        .iter()
        .flat_map(|p| read(p).iter().copied().collect::<Vec<_>>())
        .collect()
}

/// A point with a display label, as stored in point files.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub label: String,
    pub coords: Point,
}

impl LabeledPoint {
    pub fn new(label: impl Into<String>, coords: &[f64]) -> Self {
        Self {
            label: label.into(),
            coords: Point::from_column_slice(coords),
        }
    }
}
