use crate::cli::MinimizeArgs;
use crate::error::{CliError, Result};
use minff::engine::config::{MinimizeOptions, MinimizeOptionsBuilder};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMinimizationConfig {
    #[serde(rename = "max-iterations")]
    max_iterations: Option<usize>,
    #[serde(rename = "force-tolerance")]
    force_tolerance: Option<f64>,
    #[serde(rename = "energy-tolerance")]
    energy_tolerance: Option<f64>,
    #[serde(rename = "snapshot-frequency")]
    snapshot_frequency: Option<usize>,
}

/// Configuration file contents before CLI overrides are applied.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialMinimizeConfig {
    minimization: Option<PartialMinimizationConfig>,
}

impl PartialMinimizeConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `path` if given, otherwise starts from an empty configuration.
    pub fn from_optional_file(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Precedence, highest first: dedicated flags, `--set` values, file, defaults.
    pub fn merge_with_cli(mut self, args: &MinimizeArgs) -> Result<MinimizeOptions> {
        self.apply_set_values(&args.set_values)?;
        let file = self.minimization.take().unwrap_or_default();

        let mut builder = MinimizeOptionsBuilder::new();
        if let Some(max) = args.max_iterations.or(file.max_iterations) {
            builder = builder.max_iterations(max);
        }
        if let Some(tol) = args.force_tolerance.or(file.force_tolerance) {
            builder = builder.force_tolerance(tol);
        }
        if let Some(tol) = args.energy_tolerance.or(file.energy_tolerance) {
            builder = builder.energy_tolerance(tol);
        }
        if let Some(freq) = file.snapshot_frequency {
            builder = builder.snapshot_frequency(freq);
        }

        builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let section = self.minimization.get_or_insert_with(Default::default);

            match key {
                "minimization.max-iterations" => {
                    section.max_iterations = Some(parse_value(key, value_str, "integer")?);
                }
                "minimization.force-tolerance" => {
                    section.force_tolerance = Some(parse_value(key, value_str, "float")?);
                }
                "minimization.energy-tolerance" => {
                    section.energy_tolerance = Some(parse_value(key, value_str, "float")?);
                }
                "minimization.snapshot-frequency" => {
                    section.snapshot_frequency = Some(parse_value(key, value_str, "integer")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}
