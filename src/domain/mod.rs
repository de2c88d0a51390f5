//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the field / acquisition containers (`Field`, `Acquisition`)
//! - solver settings and outcomes (`SolverConfig`, `Termination`)
//! - on-disk documents (`StackFile`, `FieldFile`)

pub mod types;

pub use types::*;
