//! Projection of many scenarios over one model.
//!
//! Scenarios share the read-only [`ModelState`] and write disjoint result buffers, so
//! they run on rayon workers without locking. A failing scenario does not stop the
//! others; all failures are reported together once every scenario has run.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::config::Threading;
use super::error::{BatchError, ProjectionResult};
use super::math_output::{MathOutput, ShortCircuitMathOutput};
use super::output::short_circuit::{ShortCircuitOutputDataset, sc_output_all};
use super::output::{OutputDataset, output_all};
use super::phase::PhaseMode;
use super::state::ModelState;

/// Runs `job(scenario, result)` for every result buffer.
pub fn run_batch<D, F>(threading: Threading, results: &mut [D], job: F) -> Result<(), BatchError>
where
    D: Send,
    F: Fn(usize, &mut D) -> ProjectionResult<()> + Sync,
{
    debug!(scenarios = results.len(), ?threading, "running batch projection");
    let run = |(scenario, result): (usize, &mut D)| job(scenario, result).err().map(|err| (scenario, err.to_string()));

    let failures: Vec<(usize, String)> = match threading {
        Threading::Sequential => results.iter_mut().enumerate().filter_map(run).collect(),
        Threading::Auto => results.par_iter_mut().enumerate().filter_map(run).collect(),
        Threading::Fixed(n) => {
            let pool = ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(|| results.par_iter_mut().enumerate().filter_map(run).collect())
        }
    };

    if failures.is_empty() {
        return Ok(());
    }
    for (scenario, message) in &failures {
        warn!(scenario, %message, "scenario projection failed");
    }
    let (failed_scenarios, messages) = failures.into_iter().unzip();
    Err(BatchError::ScenarioFailures {
        failed_scenarios,
        messages,
    })
}

fn check_count(scenarios: usize, results: usize) -> Result<(), BatchError> {
    if scenarios != results {
        return Err(BatchError::ScenarioCountMismatch { scenarios, results });
    }
    Ok(())
}

/// Projects the power-flow output of every scenario into its dataset.
pub fn project_batch<S: PhaseMode>(
    state: &ModelState,
    scenarios: &[Vec<MathOutput<S>>],
    results: &mut [OutputDataset<S>],
    threading: Threading,
) -> Result<(), BatchError> {
    check_count(scenarios.len(), results.len())?;
    run_batch(threading, results, |scenario, dataset| {
        output_all(state, &scenarios[scenario], dataset)
    })
}

/// Projects the short-circuit output of every scenario into its dataset.
pub fn project_short_circuit_batch<S: PhaseMode>(
    state: &ModelState,
    scenarios: &[Vec<ShortCircuitMathOutput<S>>],
    results: &mut [ShortCircuitOutputDataset],
    threading: Threading,
) -> Result<(), BatchError> {
    check_count(scenarios.len(), results.len())?;
    run_batch(threading, results, |scenario, dataset| {
        sc_output_all(state, &scenarios[scenario], dataset)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::error::ProjectionError;

    fn job(scenario: usize, out: &mut usize) -> ProjectionResult<()> {
        if scenario % 3 == 2 {
            return Err(ProjectionError::MissingCaseForEnum {
                context: "test",
                enum_name: "Scenario",
                value: scenario as i64,
            });
        }
        *out = scenario * 10;
        Ok(())
    }

    #[test]
    fn failures_are_collected_per_scenario() {
        for threading in [Threading::Sequential, Threading::Auto, Threading::Fixed(2)] {
            let mut results = vec![0usize; 7];
            let err = run_batch(threading, &mut results, job).unwrap_err();
            match err {
                BatchError::ScenarioFailures {
                    failed_scenarios,
                    messages,
                } => {
                    assert_eq!(failed_scenarios, vec![2, 5]);
                    assert_eq!(messages.len(), 2);
                    assert!(messages[0].contains("Scenario #2"));
                }
                other => panic!("unexpected error {other}"),
            }
            assert_eq!(results, vec![0, 10, 0, 30, 40, 0, 60]);
        }
    }

    #[test]
    fn all_scenarios_succeed() {
        let mut results = vec![0usize; 2];
        run_batch(Threading::Auto, &mut results, job).unwrap();
        assert_eq!(results, vec![0, 10]);
    }

    #[test]
    fn scenario_count_must_match() {
        let state = ModelState::default();
        let scenarios: Vec<Vec<MathOutput<crate::basic::phase::Symmetric>>> = vec![Vec::new(); 2];
        let mut results = vec![OutputDataset::for_model(&state)];
        let err = project_batch(&state, &scenarios, &mut results, Threading::Sequential).unwrap_err();
        assert!(matches!(
            err,
            BatchError::ScenarioCountMismatch {
                scenarios: 2,
                results: 1
            }
        ));
    }
}
