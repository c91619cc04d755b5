use crate::cli::MinimizeArgs;
use crate::config::PartialMinimizeConfig;
use crate::error::{CliError, Result};
use crate::system::SystemDescription;
use crate::utils::progress::CliProgressHandler;
use minff::core::io::traits::PointFile;
use minff::core::io::xyz::{XyzFile, XyzMetadata};
use minff::engine::progress::ProgressReporter;
use minff::engine::state::MinimizeOutcome;
use minff::workflows;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(args: MinimizeArgs) -> Result<()> {
    let partial_config = PartialMinimizeConfig::from_optional_file(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let options = partial_config.merge_with_cli(&args)?;

    info!("Loading system from {:?}", &args.input);
    let system = SystemDescription::from_file(&args.input)?;
    let mut fields = system.build_force_fields()?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Minimizing {} structure(s)...", fields.len());
    let results = workflows::batch::minimize_all(&mut fields, &options, &reporter);

    let total = results.len();
    let mut failures = 0;
    for (i, (field, result)) in fields.iter().zip(results).enumerate() {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(index = i, error = %e, "Skipping output for failed structure.");
                failures += 1;
                continue;
            }
        };

        let output_path = generate_output_path(&args.output, i + 1, total);
        let metadata = XyzMetadata::new(describe(&outcome));
        XyzFile::write_to_path(&system.labeled_points(field), &metadata, &output_path).map_err(
            |e| CliError::FileParsing {
                path: output_path.clone(),
                source: e.into(),
            },
        )?;

        let mark = if outcome.converged() { "✓" } else { "!" };
        println!(
            "{} Structure {} (Energy: {:.4} kcal/mol, {} iteration(s)) written to: {}",
            mark,
            i + 1,
            outcome.energy,
            outcome.iterations,
            output_path.display()
        );
    }

    if failures > 0 {
        return Err(CliError::Other(anyhow::anyhow!(
            "{} of {} structure(s) failed to minimize",
            failures,
            total
        )));
    }
    Ok(())
}

fn describe(outcome: &MinimizeOutcome) -> String {
    format!(
        "energy={:.6} status={} iterations={}",
        outcome.energy, outcome.status, outcome.iterations
    )
}

/// `out.xyz` stays as-is for a single structure and becomes `out_3.xyz` for
/// the third of several.
fn generate_output_path(base: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    base.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    const DIMER: &str = r#"
        fixed = [0]

        [[points]]
        label = "A"
        coords = [0.0, 0.0, 0.0]

        [[points]]
        label = "B"
        coords = [1.6, 0.0, 0.0]

        [[contributions]]
        type = "bond-stretch"
        i = 0
        j = 1
        rest-length = 1.1
        force-constant = 200.0
    "#;

    fn args(input: PathBuf, output: PathBuf) -> MinimizeArgs {
        MinimizeArgs {
            input,
            output,
            config: None,
            max_iterations: None,
            force_tolerance: None,
            energy_tolerance: None,
            set_values: Vec::new(),
        }
    }

    #[test]
    fn single_structure_keeps_the_output_path() {
        let base = Path::new("/tmp/out.xyz");
        assert_eq!(generate_output_path(base, 1, 1), PathBuf::from("/tmp/out.xyz"));
    }

    #[test]
    fn several_structures_get_numbered_paths() {
        let base = Path::new("/tmp/out.xyz");
        assert_eq!(generate_output_path(base, 2, 3), PathBuf::from("/tmp/out_2.xyz"));
        assert_eq!(
            generate_output_path(Path::new("result"), 1, 2),
            PathBuf::from("result_1")
        );
    }

    #[test]
    #[serial]
    fn run_writes_the_relaxed_structure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("dimer.toml");
        let output = dir.path().join("dimer.xyz");
        fs::write(&input, DIMER).unwrap();

        run(args(input, output.clone())).unwrap();

        let (points, metadata) = XyzFile::read_from_path(&output).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].coords.as_slice(), &[0.0, 0.0, 0.0]);
        assert!((points[1].coords[0] - 1.1).abs() < 1e-3);
        assert!(metadata.comment.contains("status=0"));
    }

    #[test]
    #[serial]
    fn run_writes_one_file_per_conformer() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("dimer.toml");
        let output = dir.path().join("dimer.xyz");
        let mut text = DIMER.to_string();
        text.push_str(
            r#"
            [[conformers]]
            coords = [[0.0, 0.0, 0.0], [0.0, 0.9, 0.0]]
            [[conformers]]
            coords = [[0.0, 0.0, 0.0], [0.0, 0.0, 2.0]]
            "#,
        );
        fs::write(&input, text).unwrap();

        run(args(input, output)).unwrap();

        for (name, axis) in [("dimer_1.xyz", 1), ("dimer_2.xyz", 2)] {
            let (points, _) = XyzFile::read_from_path(dir.path().join(name)).unwrap();
            assert!((points[1].coords[axis] - 1.1).abs() < 1e-3, "{name}");
        }
    }
}
