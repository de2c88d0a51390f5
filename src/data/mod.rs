//! Synthetic input generation.

pub mod phantom;

pub use phantom::*;
