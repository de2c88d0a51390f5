//! Export a field to CSV.
//!
//! One line per image row, comma-separated, so the map opens directly in a
//! spreadsheet or `numpy.loadtxt(..., delimiter=",")`. Non-finite values are
//! written as `nan` / `inf` / `-inf`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::Field;
use crate::error::AppError;

/// Write a field to a CSV file.
pub fn write_field_csv(path: &Path, field: &Field) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;
    let mut out = BufWriter::new(file);

    out.write_all(format_field_csv(field).as_bytes())
        .map_err(|e| AppError::invalid_input(format!("Failed to write export CSV: {e}")))?;
    out.flush()
        .map_err(|e| AppError::invalid_input(format!("Failed to write export CSV: {e}")))?;

    Ok(())
}

/// Render a field as CSV text.
pub fn format_field_csv(field: &Field) -> String {
    let mut text = String::new();
    for row in field.row_iter() {
        let cells: Vec<String> = row.iter().map(|&v| format_cell(v)).collect();
        text.push_str(&cells.join(","));
        text.push('\n');
    }
    text
}

fn format_cell(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v.is_infinite() {
        if v > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else {
        format!("{v:.10}")
    }
}
