use crate::engine::EnergyEngine;
use crate::engine::config::MinimizeOptions;
use crate::engine::error::ForceFieldError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::MinimizeOutcome;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimizes every engine independently and returns the results in input order.
///
/// Engines share no state, so a failure in one does not affect the others.
#[instrument(skip_all, name = "batch_minimize_workflow")]
pub fn minimize_all<E>(
    engines: &mut [E],
    options: &MinimizeOptions,
    reporter: &ProgressReporter,
) -> Vec<Result<MinimizeOutcome, ForceFieldError>>
where
    E: EnergyEngine + Send,
{
    reporter.report(Progress::BatchStart {
        total: engines.len() as u64,
    });
    info!(engines = engines.len(), "Starting batch minimization.");

    #[cfg(not(feature = "parallel"))]
    let iterator = engines.iter_mut().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = engines.par_iter_mut().enumerate();

    let results: Vec<_> = iterator
        .map(|(index, engine)| {
            let result = engine.minimize_with_options(options);
            match &result {
                Ok(outcome) => reporter.report(Progress::EngineFinished {
                    index,
                    status: outcome.status,
                    energy: outcome.energy,
                }),
                Err(e) => {
                    warn!(index, error = %e, "Engine failed to minimize.");
                    reporter.report(Progress::Message(format!("Engine {index} failed: {e}")));
                }
            }
            result
        })
        .collect();

    let converged = results
        .iter()
        .filter(|r| r.as_ref().is_ok_and(|o| o.converged()))
        .count();
    info!(
        converged,
        total = results.len(),
        "Batch minimization finished."
    );
    reporter.report(Progress::BatchFinish);
    results
}
