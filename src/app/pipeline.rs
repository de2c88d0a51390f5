//! Shared "fit pipeline" logic used by every subcommand that fits.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! stack source -> acquisition -> bisection fit -> outcome (+ optional truth)
//!
//! The command handlers can then focus on presentation (printing vs exports).

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::data::{PhantomSpec, generate_phantom};
use crate::domain::{Acquisition, Field, SolverConfig};
use crate::error::AppError;
use crate::fit::{FitOutcome, fit_rate_field};
use crate::io::{read_stack_json, write_stack_json};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Human-readable description of where the stack came from.
    pub source: String,
    pub acquisition: Acquisition,
    pub outcome: FitOutcome,
    /// Ground-truth time constants, when the input was synthetic.
    pub truth: Option<Field>,
}

/// Load a stack file and fit it.
pub fn run_stack(path: &Path, config: &SolverConfig) -> Result<RunOutput, AppError> {
    let acquisition = read_stack_json(path)?;
    Ok(run_acquisition(path.display().to_string(), acquisition, config, None))
}

/// Generate a phantom (optionally saving its stack) and fit it.
pub fn run_phantom(
    spec: &PhantomSpec,
    config: &SolverConfig,
    save_stack: Option<&Path>,
) -> Result<RunOutput, AppError> {
    let phantom = generate_phantom(spec)?;
    if let Some(path) = save_stack {
        write_stack_json(path, &phantom.acquisition)?;
        info!(path = %path.display(), "saved phantom stack");
    }

    let source = format!(
        "phantom {}x{} (noise sigma={}, seed={})",
        spec.height, spec.width, spec.noise_sigma, spec.seed
    );
    Ok(run_acquisition(
        source,
        phantom.acquisition,
        config,
        Some(phantom.true_time_constant),
    ))
}

/// Fit an acquisition that is already in memory.
pub fn run_acquisition(
    source: String,
    acquisition: Acquisition,
    config: &SolverConfig,
    truth: Option<Field>,
) -> RunOutput {
    let (h, w) = acquisition.shape();
    info!(
        source = %source,
        samples = acquisition.n_samples(),
        height = h,
        width = w,
        "fitting rate field"
    );

    let started = Instant::now();
    let outcome = fit_rate_field(&acquisition, config);
    info!(
        termination = outcome.termination.display_name(),
        iterations = outcome.iterations,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fit finished"
    );

    RunOutput {
        source,
        acquisition,
        outcome,
        truth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Termination;

    #[test]
    fn phantom_run_keeps_ground_truth() {
        let spec = PhantomSpec::with_shape(6, 6);
        let run = run_phantom(&spec, &SolverConfig::default(), None).unwrap();

        assert_eq!(run.outcome.termination, Termination::Converged);
        let truth = run.truth.expect("phantom runs carry ground truth");
        assert_eq!(truth.shape(), (6, 6));
        assert!(run.source.starts_with("phantom 6x6"));
    }

    #[test]
    fn missing_stack_file_is_an_input_error() {
        let err = run_stack(Path::new("/definitely/not/here.json"), &SolverConfig::default())
            .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INVALID_INPUT);
    }
}
