//! `t1rho-map` library crate.
//!
//! Estimates a per-location exponential decay rate (and its time constant)
//! from a stack of images acquired at different control values.
//!
//! The binary (`t1rho`) is a thin wrapper around this library so that:
//!
//! - the estimation core is testable without spawning processes
//! - stack loading, rendering, and exports stay outside the core
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
