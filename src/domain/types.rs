//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for rendering or comparisons

use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A 2D field of per-location values (H rows × W columns).
///
/// Storage is column-major, so the linear location index `p` used by the
/// per-location kernels is `row + col * H`.
pub type Field = DMatrix<f64>;

/// A validated pair of control-variable and signal stacks.
///
/// Both stacks hold N slices of identical H × W shape. Slice `k` of `control`
/// holds the control value (e.g. spin-lock time) at which slice `k` of
/// `signal` was acquired.
#[derive(Debug, Clone)]
pub struct Acquisition {
    control: Vec<Field>,
    signal: Vec<Field>,
}

impl Acquisition {
    /// Build an acquisition from per-location control slices.
    pub fn new(control: Vec<Field>, signal: Vec<Field>) -> Result<Self, AppError> {
        let Some(first) = signal.first() else {
            return Err(AppError::invalid_shape("Signal stack has no slices."));
        };
        let shape = first.shape();
        if shape.0 == 0 || shape.1 == 0 {
            return Err(AppError::invalid_shape(format!(
                "Signal slices must be non-empty, got {}x{}.",
                shape.0, shape.1
            )));
        }
        if control.len() != signal.len() {
            return Err(AppError::invalid_shape(format!(
                "Control stack has {} slices but signal stack has {}.",
                control.len(),
                signal.len()
            )));
        }
        for (k, (x, y)) in control.iter().zip(&signal).enumerate() {
            if y.shape() != shape {
                return Err(AppError::invalid_shape(format!(
                    "Signal slice {k} is {}x{}, expected {}x{}.",
                    y.nrows(),
                    y.ncols(),
                    shape.0,
                    shape.1
                )));
            }
            if x.shape() != shape {
                return Err(AppError::invalid_shape(format!(
                    "Control slice {k} is {}x{}, expected {}x{}.",
                    x.nrows(),
                    x.ncols(),
                    shape.0,
                    shape.1
                )));
            }
        }
        Ok(Self { control, signal })
    }

    /// Build an acquisition where each control value is broadcast over its slice.
    pub fn from_control_values(control: &[f64], signal: Vec<Field>) -> Result<Self, AppError> {
        let (h, w) = signal.first().map(|s| s.shape()).unwrap_or((0, 0));
        let control = control
            .iter()
            .map(|&x| Field::from_element(h, w, x))
            .collect();
        Self::new(control, signal)
    }

    /// Number of acquisitions N.
    pub fn n_samples(&self) -> usize {
        self.signal.len()
    }

    /// Field shape `(H, W)`.
    pub fn shape(&self) -> (usize, usize) {
        self.signal[0].shape()
    }

    /// Number of locations `H * W`.
    pub fn n_locations(&self) -> usize {
        self.signal[0].len()
    }

    pub fn control(&self) -> &[Field] {
        &self.control
    }

    pub fn signal(&self) -> &[Field] {
        &self.signal
    }

    /// `(x, y)` pairs at linear location `p`, in acquisition order.
    pub fn samples_at(&self, p: usize) -> impl Iterator<Item = (f64, f64)> + Clone + '_ {
        self.control
            .iter()
            .zip(&self.signal)
            .map(move |(x, y)| (x[p], y[p]))
    }
}

/// Numeric settings for the bisection solver.
///
/// Every constant the search depends on lives here so runs can be reproduced
/// (and tightened in tests) without touching the solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Initial lower bound of every location's rate interval.
    pub lower_bound: f64,
    /// Initial upper bound of every location's rate interval.
    pub upper_bound: f64,
    /// Step used for the forward-difference slope probe `J(b + eps) - J(b)`.
    pub probe_epsilon: f64,
    /// Stop once the Euclidean norm of the interval-width field drops below this.
    pub tolerance: f64,
    /// Stop once the iteration counter exceeds this.
    pub max_iterations: usize,
    /// Added to the rate before inversion into a time constant.
    pub output_epsilon: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            lower_bound: 1e-5,
            upper_bound: 1e5,
            probe_epsilon: 1e-9,
            tolerance: 1e-3,
            max_iterations: 1000,
            output_epsilon: 1e-9,
        }
    }
}

impl SolverConfig {
    /// Check that the settings describe a meaningful search.
    ///
    /// The solver terminates for any settings (the iteration cap is always
    /// honoured); validation exists to reject user mistakes early.
    pub fn validate(&self) -> Result<(), AppError> {
        let finite = [
            ("lower_bound", self.lower_bound),
            ("upper_bound", self.upper_bound),
            ("probe_epsilon", self.probe_epsilon),
            ("tolerance", self.tolerance),
            ("output_epsilon", self.output_epsilon),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(AppError::invalid_input(format!(
                    "Solver setting {name} must be finite, got {value}."
                )));
            }
        }
        if self.lower_bound >= self.upper_bound {
            return Err(AppError::invalid_input(format!(
                "Invalid rate interval: lower_bound={} must be < upper_bound={}.",
                self.lower_bound, self.upper_bound
            )));
        }
        if self.probe_epsilon <= 0.0 {
            return Err(AppError::invalid_input("probe_epsilon must be > 0."));
        }
        if self.tolerance <= 0.0 {
            return Err(AppError::invalid_input("tolerance must be > 0."));
        }
        if self.output_epsilon < 0.0 {
            return Err(AppError::invalid_input("output_epsilon must be >= 0."));
        }
        Ok(())
    }
}

/// How a solver run ended. Both variants carry a complete field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The interval-width norm fell below the tolerance.
    Converged,
    /// The iteration counter exceeded `max_iterations`.
    IterationCapReached,
}

impl Termination {
    pub fn display_name(self) -> &'static str {
        match self {
            Termination::Converged => "converged",
            Termination::IterationCapReached => "max-iterations-exceeded",
        }
    }
}

/// Which quantity a stored field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    /// Decay rate `b`.
    Rate,
    /// Time constant `1 / b`.
    TimeConstant,
}

impl Quantity {
    pub fn display_name(self) -> &'static str {
        match self {
            Quantity::Rate => "rate",
            Quantity::TimeConstant => "time constant",
        }
    }

    /// Heatmap window used when none is given: 20 to 60 ms, or the
    /// matching rates.
    pub fn default_window(self) -> (f64, f64) {
        match self {
            Quantity::Rate => (1.0 / 0.06, 1.0 / 0.02),
            Quantity::TimeConstant => (0.02, 0.06),
        }
    }
}

/// Optional linear intensity rescaling stored alongside raw image data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rescale {
    pub slope: f64,
    pub intercept: f64,
}

impl Default for Rescale {
    fn default() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
        }
    }
}

/// A stack file (JSON): N row-major slices plus their control values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackFile {
    pub height: usize,
    pub width: usize,
    pub control: Vec<f64>,
    pub slices: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescale: Option<Rescale>,
}

/// A saved field file (JSON).
///
/// `values` is row-major; non-finite entries are stored as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFile {
    pub tool: String,
    pub generated: String,
    pub quantity: Quantity,
    pub height: usize,
    pub width: usize,
    pub termination: Termination,
    pub iterations: usize,
    pub width_norm: f64,
    pub values: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_control_fills_every_location() {
        let signal = vec![Field::zeros(2, 3), Field::zeros(2, 3)];
        let acq = Acquisition::from_control_values(&[0.0, 0.5], signal).unwrap();
        assert_eq!(acq.n_samples(), 2);
        assert_eq!(acq.shape(), (2, 3));
        assert!(acq.control()[1].iter().all(|&x| x == 0.5));
    }

    #[test]
    fn mismatched_slices_are_rejected() {
        let signal = vec![Field::zeros(2, 2), Field::zeros(2, 3)];
        let err = Acquisition::from_control_values(&[0.0, 1.0], signal).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INVALID_SHAPE);
    }

    #[test]
    fn control_count_must_match_signal_count() {
        let signal = vec![Field::zeros(2, 2); 3];
        assert!(Acquisition::from_control_values(&[0.0, 1.0], signal).is_err());
    }

    #[test]
    fn empty_stack_is_rejected() {
        assert!(Acquisition::from_control_values(&[], Vec::new()).is_err());
    }

    #[test]
    fn samples_at_walks_the_sample_axis() {
        let signal = vec![
            Field::from_row_slice(1, 2, &[1.0, 2.0]),
            Field::from_row_slice(1, 2, &[3.0, 4.0]),
        ];
        let acq = Acquisition::from_control_values(&[0.0, 0.1], signal).unwrap();
        let pairs: Vec<_> = acq.samples_at(1).collect();
        assert_eq!(pairs, vec![(0.0, 2.0), (0.1, 4.0)]);
    }

    #[test]
    fn default_solver_config_is_valid() {
        assert!(SolverConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_interval_is_invalid() {
        let config = SolverConfig {
            lower_bound: 10.0,
            upper_bound: 1.0,
            ..SolverConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_json_keeps_defaults() {
        let config: SolverConfig = serde_json::from_str(r#"{ "tolerance": 1e-6 }"#).unwrap();
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.max_iterations, 1000);
    }
}
