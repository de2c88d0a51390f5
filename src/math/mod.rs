//! Mathematical kernels: the closed-form amplitude and the per-location cost.

pub mod cost;

pub use cost::*;
