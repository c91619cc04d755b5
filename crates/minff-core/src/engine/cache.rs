/// Marker stored for pairs whose distance has not been computed yet.
pub const UNKNOWN_DISTANCE: f64 = -1.0;

/// Symmetric pairwise distance table packed as upper triangle plus diagonal.
///
/// The pair `(i, j)` with `i <= j` lives at `i + j * (j + 1) / 2`; callers may
/// pass either order.
#[derive(Debug, Default, Clone)]
pub struct DistanceCache {
    data: Vec<f64>,
}

impl DistanceCache {
    pub fn new(num_points: usize) -> Self {
        Self {
            data: vec![UNKNOWN_DISTANCE; num_points * (num_points + 1) / 2],
        }
    }

    #[inline]
    pub fn index(i: usize, j: usize) -> usize {
        let (i, j) = if j < i { (j, i) } else { (i, j) };
        i + j * (j + 1) / 2
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn reset(&mut self) {
        self.data.fill(UNKNOWN_DISTANCE);
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.data
            .get(Self::index(i, j))
            .copied()
            .filter(|d| *d >= 0.0)
    }

    pub fn insert(&mut self, i: usize, j: usize, distance: f64) {
        if let Some(slot) = self.data.get_mut(Self::index(i, j)) {
            *slot = distance;
        }
    }

    pub fn known_entries(&self) -> usize {
        self.data.iter().filter(|d| **d >= 0.0).count()
    }
}
