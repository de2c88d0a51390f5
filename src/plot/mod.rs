//! Terminal rendering of fitted fields.

pub mod ascii;

pub use ascii::*;
