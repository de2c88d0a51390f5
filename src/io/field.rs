//! Read/write field JSON files.
//!
//! Field JSON is the portable representation of a fitted map:
//! - which quantity it holds (rate or time constant)
//! - how the solver run ended (termination, iterations, width norm)
//! - the values, row-major, with non-finite entries stored as `null`
//!
//! The schema is defined by `domain::FieldFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Local;

use crate::domain::{Field, FieldFile, Quantity};
use crate::error::AppError;
use crate::fit::FitOutcome;
use crate::io::stack::row_major;

/// Build the JSON document for one quantity of a fit outcome.
pub fn field_file(outcome: &FitOutcome, quantity: Quantity) -> FieldFile {
    let field = match quantity {
        Quantity::Rate => &outcome.rate,
        Quantity::TimeConstant => &outcome.time_constant,
    };
    let (height, width) = field.shape();
    let values = row_major(field)
        .into_iter()
        .map(|v| v.is_finite().then_some(v))
        .collect();

    FieldFile {
        tool: "t1rho".to_string(),
        generated: Local::now().to_rfc3339(),
        quantity,
        height,
        width,
        termination: outcome.termination,
        iterations: outcome.iterations,
        width_norm: outcome.width_norm,
        values,
    }
}

/// Write a field JSON file.
pub fn write_field_json(
    path: &Path,
    outcome: &FitOutcome,
    quantity: Quantity,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create field JSON '{}': {e}", path.display()))
    })?;

    serde_json::to_writer_pretty(BufWriter::new(file), &field_file(outcome, quantity))
        .map_err(|e| AppError::invalid_input(format!("Failed to write field JSON: {e}")))?;

    Ok(())
}

/// Read a field JSON file.
pub fn read_field_json(path: &Path) -> Result<FieldFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to open field JSON '{}': {e}", path.display()))
    })?;
    let doc: FieldFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::invalid_input(format!("Invalid field JSON: {e}")))?;
    check_field_shape(&doc)?;
    Ok(doc)
}

fn check_field_shape(doc: &FieldFile) -> Result<(), AppError> {
    let expected = doc.height.checked_mul(doc.width);
    if expected != Some(doc.values.len()) {
        return Err(AppError::invalid_input(format!(
            "Field JSON has {} values, expected {}x{}.",
            doc.values.len(),
            doc.height,
            doc.width
        )));
    }
    Ok(())
}

/// Rebuild the in-memory field; `null` entries come back as NaN.
pub fn field_from_file(doc: &FieldFile) -> Field {
    let values: Vec<f64> = doc.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    Field::from_row_slice(doc.height, doc.width, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Termination;
    use crate::fit::Bounds;

    fn outcome() -> FitOutcome {
        let rate = Field::from_row_slice(2, 2, &[20.0, 25.0, f64::NAN, 50.0]);
        FitOutcome {
            time_constant: rate.map(|b| 1.0 / b),
            amplitude: Field::from_element(2, 2, 1.0),
            bounds: Bounds::uniform(2, 2, 1e-5, 1e5),
            iterations: 30,
            termination: Termination::Converged,
            width_norm: 5e-4,
            rate,
        }
    }

    #[test]
    fn non_finite_values_become_null() {
        let doc = field_file(&outcome(), Quantity::Rate);
        assert_eq!(doc.values, vec![Some(20.0), Some(25.0), None, Some(50.0)]);
        assert_eq!(doc.quantity, Quantity::Rate);
    }

    #[test]
    fn document_rebuilds_the_field() {
        let doc = field_file(&outcome(), Quantity::TimeConstant);
        let field = field_from_file(&doc);
        assert_eq!(field[(0, 1)], 1.0 / 25.0);
        assert!(field[(1, 0)].is_nan());
    }

    #[test]
    fn document_survives_json() {
        let doc = field_file(&outcome(), Quantity::Rate);
        let text = serde_json::to_string(&doc).unwrap();
        let back: FieldFile = serde_json::from_str(&text).unwrap();
        assert_eq!(back.values, doc.values);
        assert_eq!(back.termination, Termination::Converged);
    }

    #[test]
    fn oversized_shape_is_rejected() {
        let mut doc = field_file(&outcome(), Quantity::Rate);
        doc.height = usize::MAX / 2 + 1;
        doc.width = 2;
        let err = check_field_shape(&doc).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INVALID_INPUT);
    }

    #[test]
    fn value_count_must_match_shape() {
        let mut doc = field_file(&outcome(), Quantity::Rate);
        assert!(check_field_shape(&doc).is_ok());
        doc.values.pop();
        assert!(check_field_shape(&doc).is_err());
    }
}
