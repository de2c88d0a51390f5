//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimation code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{Acquisition, SolverConfig};
use crate::fit::FitOutcome;
use crate::report::{FieldSummary, RecoveryError, summarize_field};

/// Format the full run summary (inputs, solver settings, termination, maps).
pub fn format_run_summary(
    source: &str,
    acq: &Acquisition,
    outcome: &FitOutcome,
    config: &SolverConfig,
) -> String {
    let (h, w) = acq.shape();
    let mut out = String::new();

    out.push_str("=== t1rho - relaxation time-constant map ===\n");
    out.push_str(&format!("Source: {source}\n"));
    out.push_str(&format!(
        "Stack: n={} | field={h}x{w} | control=[{}]\n",
        acq.n_samples(),
        control_values(acq)
    ));
    out.push_str(&format!(
        "Solver: rate=[{:e}, {:e}] | probe eps={:e} | tol={:e} | max iters={}\n",
        config.lower_bound,
        config.upper_bound,
        config.probe_epsilon,
        config.tolerance,
        config.max_iterations
    ));
    out.push_str(&format!(
        "Termination: {} after {} iterations (width norm {:.3e})\n",
        outcome.termination.display_name(),
        outcome.iterations,
        outcome.width_norm
    ));

    out.push_str("\nRate:\n");
    out.push_str(&format_summary_line(summarize_field(&outcome.rate).as_ref()));
    out.push_str("Time constant:\n");
    out.push_str(&format_summary_line(summarize_field(&outcome.time_constant).as_ref()));
    out.push_str("Amplitude:\n");
    out.push_str(&format_summary_line(summarize_field(&outcome.amplitude).as_ref()));

    out
}

/// Format the phantom recovery section.
pub fn format_recovery(err: Option<&RecoveryError>) -> String {
    match err {
        Some(e) => format!(
            "\nRecovery vs ground truth (time constant): max |err|={:.6} | rmse={:.6} | skipped={}\n",
            e.max_abs, e.rmse, e.n_skipped
        ),
        None => "\nRecovery vs ground truth: no finite locations to compare\n".to_string(),
    }
}

fn format_summary_line(summary: Option<&FieldSummary>) -> String {
    match summary {
        Some(s) => format!(
            "  finite={}/{} | min={:.6} | median={:.6} | mean={:.6} | max={:.6}\n",
            s.n_finite, s.n, s.min, s.median, s.mean, s.max
        ),
        None => "  no finite values\n".to_string(),
    }
}

/// Control value per slice, read from the first location.
fn control_values(acq: &Acquisition) -> String {
    let parts: Vec<String> = acq.control().iter().map(|x| format!("{}", x[0])).collect();
    parts.join(", ")
}
