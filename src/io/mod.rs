//! Input/output helpers.
//!
//! - stack JSON read/write (`stack`)
//! - field JSON read/write (`field`)
//! - CSV export (`export`)

pub mod export;
pub mod field;
pub mod stack;

pub use export::*;
pub use field::*;
pub use stack::*;
