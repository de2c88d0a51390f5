//! Rate-field estimation.
//!
//! Responsibilities:
//!
//! - hold the per-location search intervals
//! - drive the derivative-sign bisection to convergence or the iteration cap
//! - invert the converged rates into time constants

pub mod bisection;

pub use bisection::*;
