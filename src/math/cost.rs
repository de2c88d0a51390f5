//! Residual-sum-of-squares cost for the mono-exponential model `y ≈ a·exp(-b·x)`.
//!
//! For a fixed rate `b` the amplitude has a closed form built from four
//! sample-axis means:
//!
//! ```text
//! f1     = mean(y · exp(-b·x))
//! alpha1 = mean(exp(-b·x))
//! alpha2 = mean(exp(-2·b·x))
//! f0     = mean(y)
//! a      = (f1 - alpha1·f0) / (alpha2 - alpha1²)
//! J      = Σ |y - a·exp(-b·x)|²
//! ```
//!
//! Numerical notes:
//! - When the control samples at a location are (nearly) identical,
//!   `alpha2 - alpha1²` vanishes and `a` / `J` become non-finite. This is left
//!   unguarded: non-finite values propagate to the caller unchanged.
//! - `alpha2` is computed from `exp(-2·b·x)` directly rather than by squaring,
//!   so the denominator carries the same rounding as the reference formulation.

use rayon::prelude::*;

use crate::domain::{Acquisition, Field};

/// Sample-axis means at one location for one candidate rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleMoments {
    pub f1: f64,
    pub alpha1: f64,
    pub alpha2: f64,
    pub f0: f64,
}

impl SampleMoments {
    /// Accumulate the four means over `(x, y)` samples for rate `b`.
    pub fn collect(b: f64, samples: impl Iterator<Item = (f64, f64)>) -> Self {
        let mut n = 0usize;
        let mut f1 = 0.0;
        let mut alpha1 = 0.0;
        let mut alpha2 = 0.0;
        let mut f0 = 0.0;
        for (x, y) in samples {
            let decay = (-b * x).exp();
            f1 += y * decay;
            alpha1 += decay;
            alpha2 += (-2.0 * b * x).exp();
            f0 += y;
            n += 1;
        }
        let n = n as f64;
        Self {
            f1: f1 / n,
            alpha1: alpha1 / n,
            alpha2: alpha2 / n,
            f0: f0 / n,
        }
    }

    /// Closed-form amplitude implied by these moments.
    pub fn amplitude(&self) -> f64 {
        (self.f1 - self.alpha1 * self.f0) / (self.alpha2 - self.alpha1 * self.alpha1)
    }
}

/// Amplitude at a single location.
pub fn amplitude_at(b: f64, samples: impl Iterator<Item = (f64, f64)>) -> f64 {
    SampleMoments::collect(b, samples).amplitude()
}

/// Cost `J` at a single location.
pub fn cost_at(b: f64, samples: impl Iterator<Item = (f64, f64)> + Clone) -> f64 {
    let a = amplitude_at(b, samples.clone());
    samples
        .map(|(x, y)| {
            let residual = (y - a * (-b * x).exp()).abs();
            residual * residual
        })
        .sum()
}

/// Per-location cost field `J(b, x, y)`.
///
/// # Panics
/// Panics if `rate` does not have the acquisition's shape.
pub fn cost_field(rate: &Field, acq: &Acquisition) -> Field {
    map_locations(rate, acq, |b, p| cost_at(b, acq.samples_at(p)))
}

/// Per-location closed-form amplitude field for candidate rates `rate`.
///
/// # Panics
/// Panics if `rate` does not have the acquisition's shape.
pub fn amplitude_field(rate: &Field, acq: &Acquisition) -> Field {
    map_locations(rate, acq, |b, p| amplitude_at(b, acq.samples_at(p)))
}

fn map_locations<F>(rate: &Field, acq: &Acquisition, kernel: F) -> Field
where
    F: Fn(f64, usize) -> f64 + Sync,
{
    assert_eq!(
        rate.shape(),
        acq.shape(),
        "rate field shape must match the acquisition"
    );
    let (h, w) = rate.shape();

    // Locations are independent; order is restored by the indexed collect.
    let values: Vec<f64> = rate
        .as_slice()
        .par_iter()
        .enumerate()
        .map(|(p, &b)| kernel(b, p))
        .collect();

    Field::from_vec(h, w, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TIMES: [f64; 4] = [0.0, 0.01, 0.03, 0.05];

    fn mono_exp(a0: f64, b0: f64) -> Vec<(f64, f64)> {
        TIMES.iter().map(|&x| (x, a0 * (-b0 * x).exp())).collect()
    }

    fn uniform_acquisition(a0: f64, b0: f64, h: usize, w: usize) -> Acquisition {
        let signal = TIMES
            .iter()
            .map(|&x| Field::from_element(h, w, a0 * (-b0 * x).exp()))
            .collect();
        Acquisition::from_control_values(&TIMES, signal).unwrap()
    }

    #[test]
    fn amplitude_is_exact_at_true_rate() {
        let samples = mono_exp(2.5, 30.0);
        let a = amplitude_at(30.0, samples.iter().copied());
        assert_relative_eq!(a, 2.5, max_relative = 1e-9);
    }

    #[test]
    fn cost_vanishes_at_true_rate_and_grows_away_from_it() {
        let samples = mono_exp(1.0, 25.0);
        let at_truth = cost_at(25.0, samples.iter().copied());
        let below = cost_at(15.0, samples.iter().copied());
        let above = cost_at(40.0, samples.iter().copied());
        assert!(at_truth < 1e-20, "cost at the true rate should be ~0, got {at_truth}");
        assert!(below > at_truth);
        assert!(above > at_truth);
    }

    #[test]
    fn moments_match_hand_computation() {
        let samples = [(0.0, 1.0), (1.0, 3.0)];
        let m = SampleMoments::collect(0.0, samples.iter().copied());
        assert_eq!(m.f0, 2.0);
        assert_eq!(m.alpha1, 1.0);
        assert_eq!(m.alpha2, 1.0);
        assert_eq!(m.f1, 2.0);
    }

    #[test]
    fn cost_field_is_bit_identical_across_calls() {
        let acq = uniform_acquisition(1.0, 0.04, 3, 5);
        let rate = Field::from_fn(3, 5, |r, c| 0.01 + 0.3 * r as f64 + 0.07 * c as f64);
        let first = cost_field(&rate, &acq);
        let second = cost_field(&rate, &acq);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn field_kernels_agree_with_scalar_forms() {
        let acq = uniform_acquisition(3.0, 20.0, 2, 2);
        let rate = Field::from_row_slice(2, 2, &[5.0, 20.0, 35.0, 80.0]);
        let cost = cost_field(&rate, &acq);
        let amp = amplitude_field(&rate, &acq);
        for p in 0..rate.len() {
            assert_eq!(cost[p], cost_at(rate[p], acq.samples_at(p)));
            assert_eq!(amp[p], amplitude_at(rate[p], acq.samples_at(p)));
        }
    }

    #[test]
    fn identical_control_samples_give_non_finite_cost() {
        let signal = vec![Field::from_element(2, 2, 1.0), Field::from_element(2, 2, 0.8)];
        let acq = Acquisition::from_control_values(&[0.0, 0.0], signal).unwrap();
        let rate = Field::from_element(2, 2, 10.0);
        let cost = cost_field(&rate, &acq);
        assert!(cost.iter().all(|j| !j.is_finite()));
    }

    #[test]
    fn fast_and_slow_components_give_two_separate_minima() {
        // Dense early samples see the fast component, late ones the slow one.
        let samples: Vec<(f64, f64)> = [0.0_f64, 0.001, 0.003, 1.0, 2.0, 3.0]
            .iter()
            .map(|&x| (x, 0.5 * (-x).exp() + 0.5 * (-200.0 * x).exp()))
            .collect();

        let mut grid = Vec::new();
        let mut b = 0.5;
        while b <= 1000.0 {
            grid.push((b, cost_at(b, samples.iter().copied())));
            b *= 1.01;
        }
        let minima: Vec<(f64, f64)> = grid
            .windows(3)
            .filter(|w| w[1].1 < w[0].1 && w[1].1 < w[2].1)
            .map(|w| w[1])
            .collect();

        assert_eq!(minima.len(), 2, "local minima: {minima:?}");
        let (slow, fast) = (minima[0], minima[1]);
        assert!(slow.0 > 1.0 && slow.0 < 2.0);
        assert!(fast.0 > 60.0 && fast.0 < 100.0);
        assert!(slow.1 < fast.1);

        let between = cost_at(10.0, samples.iter().copied());
        assert!(between > slow.1 && between > fast.1);
    }
}
