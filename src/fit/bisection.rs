//! Field-wide derivative-sign bisection on the decay rate.
//!
//! Every location keeps its own interval `[lower, upper]`. Each iteration:
//!
//! 1. `b = (lower + upper) / 2`
//! 2. `dJ = J(b + probe_epsilon) - J(b)`
//! 3. `dJ >= 0` moves `upper` to `b`; `dJ < 0` moves `lower` to `b`
//! 4. stop when `‖upper - lower‖₂ < tolerance` over the whole field, or when
//!    the iteration counter exceeds `max_iterations`
//!
//! The result is always a full field; hitting the cap is reported through
//! [`Termination::IterationCapReached`] and a `warn!` event, never as an error.
//!
//! # Precondition
//!
//! The slope sign only identifies the half containing the minimum when the cost
//! at a location is unimodal over the initial interval. Nothing checks this. If
//! it does not hold, the location settles on some stationary point of the cost
//! with no guarantee about which one.
//!
//! A non-finite probe (degenerate control samples) satisfies neither comparison,
//! so that location's interval is left as is. The global width norm then never
//! drops below the tolerance and the run ends at the iteration cap.

use tracing::{debug, trace, warn};

use crate::domain::{Acquisition, Field, SolverConfig, Termination};
use crate::math::{amplitude_field, cost_field};

/// Per-location search intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Field,
    pub upper: Field,
}

impl Bounds {
    /// The same interval `[lower, upper]` at every location of an `h × w` field.
    pub fn uniform(h: usize, w: usize, lower: f64, upper: f64) -> Self {
        Self {
            lower: Field::from_element(h, w, lower),
            upper: Field::from_element(h, w, upper),
        }
    }

    pub fn midpoint(&self) -> Field {
        self.lower.zip_map(&self.upper, |lo, hi| (lo + hi) / 2.0)
    }

    /// `|upper - lower|` per location.
    pub fn widths(&self) -> Field {
        self.upper.zip_map(&self.lower, |hi, lo| (hi - lo).abs())
    }

    /// Euclidean norm of the width field, all locations taken as one vector.
    pub fn width_norm(&self) -> f64 {
        self.widths().norm()
    }

    /// Keep the half of each interval the slope sign points to.
    fn narrowed(&self, midpoint: &Field, slope: &Field) -> Self {
        let mut next = self.clone();
        for ((lo, hi), (&b, &dj)) in next
            .lower
            .iter_mut()
            .zip(next.upper.iter_mut())
            .zip(midpoint.iter().zip(slope.iter()))
        {
            if dj >= 0.0 {
                *hi = b;
            } else if dj < 0.0 {
                *lo = b;
            }
        }
        next
    }
}

/// State seen by an observer after each interval update.
#[derive(Debug)]
pub struct IterationEvent<'a> {
    /// 1-based iteration counter.
    pub iteration: usize,
    /// Midpoint rates probed this iteration.
    pub rate: &'a Field,
    /// Forward difference `J(b + eps) - J(b)`.
    pub slope: &'a Field,
    /// Intervals before the update.
    pub previous: &'a Bounds,
    /// Intervals after the update.
    pub current: &'a Bounds,
    /// Width norm of `current`.
    pub width_norm: f64,
}

/// Result of a solver run.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Last midpoint rate field.
    pub rate: Field,
    /// `1 / (rate + output_epsilon)`.
    pub time_constant: Field,
    /// Closed-form amplitude at `rate`.
    pub amplitude: Field,
    /// Final intervals.
    pub bounds: Bounds,
    pub iterations: usize,
    pub termination: Termination,
    pub width_norm: f64,
}

/// Estimate the decay-rate field for `acq`.
pub fn fit_rate_field(acq: &Acquisition, config: &SolverConfig) -> FitOutcome {
    fit_rate_field_observed(acq, config, |_| {})
}

/// Estimate the time-constant field for `acq`.
pub fn fit_time_constants(acq: &Acquisition, config: &SolverConfig) -> Field {
    fit_rate_field(acq, config).time_constant
}

/// Same as [`fit_rate_field`], calling `observer` after every interval update.
pub fn fit_rate_field_observed<F>(
    acq: &Acquisition,
    config: &SolverConfig,
    mut observer: F,
) -> FitOutcome
where
    F: FnMut(&IterationEvent<'_>),
{
    let (h, w) = acq.shape();
    let mut bounds = Bounds::uniform(h, w, config.lower_bound, config.upper_bound);
    let mut iterations = 0usize;

    loop {
        let rate = bounds.midpoint();
        let slope = slope_probe(&rate, acq, config.probe_epsilon);
        let next = bounds.narrowed(&rate, &slope);
        iterations += 1;

        let width_norm = next.width_norm();
        trace!(iteration = iterations, width_norm, "bisection step");
        observer(&IterationEvent {
            iteration: iterations,
            rate: &rate,
            slope: &slope,
            previous: &bounds,
            current: &next,
            width_norm,
        });
        bounds = next;

        let termination = if width_norm < config.tolerance {
            Termination::Converged
        } else if iterations > config.max_iterations {
            Termination::IterationCapReached
        } else {
            continue;
        };

        match termination {
            Termination::Converged => {
                debug!(iterations, width_norm, "rate field converged");
            }
            Termination::IterationCapReached => {
                warn!(
                    iterations,
                    width_norm,
                    tolerance = config.tolerance,
                    "iteration cap reached before convergence; returning best-effort field"
                );
            }
        }

        let time_constant = rate.map(|b| 1.0 / (b + config.output_epsilon));
        let amplitude = amplitude_field(&rate, acq);
        return FitOutcome {
            rate,
            time_constant,
            amplitude,
            bounds,
            iterations,
            termination,
            width_norm,
        };
    }
}

/// Forward-difference probe of the cost slope at every location.
fn slope_probe(rate: &Field, acq: &Acquisition, eps: f64) -> Field {
    let shifted = rate.add_scalar(eps);
    cost_field(&shifted, acq) - cost_field(rate, acq)
}
