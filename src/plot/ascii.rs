//! ASCII heatmap rendering for terminal output.
//!
//! This is intentionally "dumb" (fixed character ramp, fixed display window),
//! optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Values are clamped into `[vmin, vmax]` and mapped onto a 10-step ramp.
//! Non-finite values render as `?`. Fields larger than the requested size are
//! resampled by nearest neighbour.

use crate::domain::Field;

/// Low-to-high intensity ramp.
const RAMP: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Marker for NaN / infinite values.
const NON_FINITE: char = '?';

/// Render `field` as text no larger than `width` × `height` cells.
pub fn render_ascii_field(
    field: &Field,
    vmin: f64,
    vmax: f64,
    width: usize,
    height: usize,
) -> String {
    let (n_rows, n_cols) = field.shape();
    let rows = n_rows.min(height.max(1));
    let cols = n_cols.min(width.max(1));

    let mut out = String::new();
    out.push_str(&format!(
        "Map: {n_rows}x{n_cols} | window=[{vmin:.3}, {vmax:.3}]\n"
    ));

    for r in 0..rows {
        let src_r = resample_index(r, rows, n_rows);
        for c in 0..cols {
            let src_c = resample_index(c, cols, n_cols);
            out.push(shade(field[(src_r, src_c)], vmin, vmax));
        }
        out.push('\n');
    }

    let ramp: String = RAMP.iter().collect();
    out.push_str(&format!("Ramp: '{ramp}' low->high, '{NON_FINITE}' non-finite\n"));
    out
}

/// Nearest source index for display cell `i` of `n_out` over `n_in` samples.
fn resample_index(i: usize, n_out: usize, n_in: usize) -> usize {
    if n_out == n_in {
        return i;
    }
    let pos = (i as f64 + 0.5) * n_in as f64 / n_out as f64;
    (pos.floor() as usize).min(n_in - 1)
}

fn shade(v: f64, vmin: f64, vmax: f64) -> char {
    if !v.is_finite() {
        return NON_FINITE;
    }
    let span = (vmax - vmin).max(1e-12);
    let u = ((v - vmin) / span).clamp(0.0, 1.0);
    let idx = (u * (RAMP.len() as f64 - 1.0)).round() as usize;
    RAMP[idx.min(RAMP.len() - 1)]
}
