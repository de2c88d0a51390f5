//! Reporting utilities: field statistics and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::Field;

/// Summary statistics over the finite values of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub n: usize,
    pub n_finite: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Summarize a field. Returns `None` when no value is finite.
pub fn summarize_field(field: &Field) -> Option<FieldSummary> {
    let mut finite: Vec<f64> = field.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.total_cmp(b));

    let n_finite = finite.len();
    let mean = finite.iter().sum::<f64>() / n_finite as f64;
    let mid = n_finite / 2;
    let median = if n_finite % 2 == 1 {
        finite[mid]
    } else {
        (finite[mid - 1] + finite[mid]) / 2.0
    };

    Some(FieldSummary {
        n: field.len(),
        n_finite,
        min: finite[0],
        max: finite[n_finite - 1],
        mean,
        median,
    })
}

/// Error of an estimated field against ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryError {
    pub max_abs: f64,
    pub rmse: f64,
    /// Locations where the estimate or the truth is non-finite.
    pub n_skipped: usize,
}

pub fn recovery_error(estimate: &Field, truth: &Field) -> Option<RecoveryError> {
    let mut max_abs: f64 = 0.0;
    let mut sse = 0.0;
    let mut n = 0usize;
    let mut n_skipped = 0usize;
    for (&e, &t) in estimate.iter().zip(truth.iter()) {
        if !(e.is_finite() && t.is_finite()) {
            n_skipped += 1;
            continue;
        }
        let d = e - t;
        max_abs = max_abs.max(d.abs());
        sse += d * d;
        n += 1;
    }
    if n == 0 {
        return None;
    }
    Some(RecoveryError {
        max_abs,
        rmse: (sse / n as f64).sqrt(),
        n_skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_ignores_non_finite_values() {
        let field = Field::from_row_slice(2, 3, &[3.0, 1.0, f64::NAN, 2.0, 4.0, f64::INFINITY]);
        let s = summarize_field(&field).unwrap();
        assert_eq!(s.n, 6);
        assert_eq!(s.n_finite, 4);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
    }

    #[test]
    fn all_nan_field_has_no_summary() {
        let field = Field::from_element(2, 2, f64::NAN);
        assert!(summarize_field(&field).is_none());
    }

    #[test]
    fn recovery_error_against_truth() {
        let truth = Field::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let estimate = Field::from_row_slice(1, 3, &[1.0, 2.5, f64::NAN]);
        let err = recovery_error(&estimate, &truth).unwrap();
        assert_eq!(err.max_abs, 0.5);
        assert_eq!(err.n_skipped, 1);
        assert!((err.rmse - (0.125_f64).sqrt()).abs() < 1e-15);
    }
}
