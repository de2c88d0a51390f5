//! Read/write stack JSON files.
//!
//! A stack file is the portable form of an acquisition:
//! - the field shape
//! - one control value per slice (broadcast over the slice)
//! - the slices themselves, row-major
//! - an optional linear intensity rescale (`slope · v + intercept`)
//!
//! The schema is defined by `domain::StackFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::debug;

use crate::domain::{Acquisition, Field, StackFile};
use crate::error::AppError;

/// Read a stack JSON file and turn it into an acquisition.
pub fn read_stack_json(path: &Path) -> Result<Acquisition, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to open stack JSON '{}': {e}", path.display()))
    })?;
    let stack: StackFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::invalid_input(format!("Invalid stack JSON: {e}")))?;
    debug!(
        path = %path.display(),
        slices = stack.slices.len(),
        height = stack.height,
        width = stack.width,
        "loaded stack"
    );
    stack_to_acquisition(&stack)
}

/// Write an acquisition as a stack JSON file.
pub fn write_stack_json(path: &Path, acq: &Acquisition) -> Result<(), AppError> {
    let stack = acquisition_to_stack(acq)?;
    let file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create stack JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer(BufWriter::new(file), &stack)
        .map_err(|e| AppError::invalid_input(format!("Failed to write stack JSON: {e}")))?;
    Ok(())
}

/// Validate a stack document, apply its rescale, and build the acquisition.
pub fn stack_to_acquisition(stack: &StackFile) -> Result<Acquisition, AppError> {
    if stack.height == 0 || stack.width == 0 {
        return Err(AppError::invalid_input(format!(
            "Stack shape must be non-empty, got {}x{}.",
            stack.height, stack.width
        )));
    }
    if stack.control.len() != stack.slices.len() {
        return Err(AppError::invalid_input(format!(
            "Stack has {} control values but {} slices.",
            stack.control.len(),
            stack.slices.len()
        )));
    }
    let expected = stack.height.checked_mul(stack.width).ok_or_else(|| {
        AppError::invalid_input(format!(
            "Stack shape {}x{} is too large.",
            stack.height, stack.width
        ))
    })?;
    let rescale = stack.rescale.unwrap_or_default();

    let mut signal = Vec::with_capacity(stack.slices.len());
    for (k, values) in stack.slices.iter().enumerate() {
        if values.len() != expected {
            return Err(AppError::invalid_input(format!(
                "Slice {k} has {} values, expected {expected} ({}x{}).",
                values.len(),
                stack.height,
                stack.width
            )));
        }
        let slice = Field::from_row_slice(stack.height, stack.width, values)
            .map(|v| rescale.slope * v + rescale.intercept);
        signal.push(slice);
    }

    Acquisition::from_control_values(&stack.control, signal)
}

/// Convert a broadcast-control acquisition into a stack document.
///
/// Fails if any control slice is not a single repeated value, since the file
/// format stores one control value per slice.
pub fn acquisition_to_stack(acq: &Acquisition) -> Result<StackFile, AppError> {
    let (height, width) = acq.shape();

    let mut control = Vec::with_capacity(acq.n_samples());
    for (k, slice) in acq.control().iter().enumerate() {
        let x = slice[0];
        if slice.iter().any(|&v| v.to_bits() != x.to_bits()) {
            return Err(AppError::invalid_input(format!(
                "Control slice {k} varies across locations; stack files need one value per slice."
            )));
        }
        control.push(x);
    }

    let slices = acq.signal().iter().map(row_major).collect();

    Ok(StackFile {
        height,
        width,
        control,
        slices,
        rescale: None,
    })
}

/// Flatten a field row by row.
pub fn row_major(field: &Field) -> Vec<f64> {
    field.transpose().as_slice().to_vec()
}
