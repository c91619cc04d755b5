/// Positions and energy captured during a minimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub positions: Vec<f64>,
    pub energy: f64,
}

impl Snapshot {
    pub fn new(positions: Vec<f64>, energy: f64) -> Self {
        Self { positions, energy }
    }
}

/// What the solver reported. `status` is passed through untouched:
/// 0 means converged, anything else is the solver's own non-convergence code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizeOutcome {
    pub status: i32,
    pub iterations: usize,
    pub energy: f64,
}

impl MinimizeOutcome {
    pub fn converged(&self) -> bool {
        self.status == 0
    }
}
