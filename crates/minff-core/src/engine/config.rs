use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeOptions {
    pub max_iterations: usize,
    pub force_tolerance: f64,
    pub energy_tolerance: f64,
    /// Record a snapshot every this many iterations; 0 disables snapshots.
    pub snapshot_frequency: usize,
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            force_tolerance: 1e-4,
            energy_tolerance: 1e-6,
            snapshot_frequency: 0,
        }
    }
}

impl MinimizeOptions {
    pub fn new(max_iterations: usize, force_tolerance: f64, energy_tolerance: f64) -> Self {
        Self {
            max_iterations,
            force_tolerance,
            energy_tolerance,
            snapshot_frequency: 0,
        }
    }
}

#[derive(Default)]
pub struct MinimizeOptionsBuilder {
    max_iterations: Option<usize>,
    force_tolerance: Option<f64>,
    energy_tolerance: Option<f64>,
    snapshot_frequency: Option<usize>,
}

impl MinimizeOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn force_tolerance(mut self, tolerance: f64) -> Self {
        self.force_tolerance = Some(tolerance);
        self
    }
    pub fn energy_tolerance(mut self, tolerance: f64) -> Self {
        self.energy_tolerance = Some(tolerance);
        self
    }
    pub fn snapshot_frequency(mut self, frequency: usize) -> Self {
        self.snapshot_frequency = Some(frequency);
        self
    }

    pub fn build(self) -> Result<MinimizeOptions, ConfigError> {
        let defaults = MinimizeOptions::default();
        let force_tolerance = check_tolerance(
            "force_tolerance",
            self.force_tolerance.unwrap_or(defaults.force_tolerance),
        )?;
        let energy_tolerance = check_tolerance(
            "energy_tolerance",
            self.energy_tolerance.unwrap_or(defaults.energy_tolerance),
        )?;
        Ok(MinimizeOptions {
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            force_tolerance,
            energy_tolerance,
            snapshot_frequency: self
                .snapshot_frequency
                .unwrap_or(defaults.snapshot_frequency),
        })
    }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidParameter {
            name,
            reason: format!("expected a finite, non-negative number, got {}", value),
        });
    }
    Ok(value)
}
