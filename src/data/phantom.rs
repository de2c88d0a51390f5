//! Synthetic relaxation phantoms.
//!
//! A phantom is a uniform background with circular inclusions, each region
//! carrying its own time constant. Signals follow `a · exp(-x / T)` with
//! optional additive Gaussian noise, so every run has a known ground truth to
//! compare the fitted field against.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{Acquisition, Field};
use crate::error::AppError;

/// A circular region with its own time constant.
///
/// `row`, `col`, and `radius` are fractions of the field height / width / the
/// smaller of the two, so one description works for any phantom size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inclusion {
    pub row: f64,
    pub col: f64,
    pub radius: f64,
    pub time_constant: f64,
}

/// Everything needed to generate a phantom deterministically.
#[derive(Debug, Clone, PartialEq)]
pub struct PhantomSpec {
    pub height: usize,
    pub width: usize,
    /// Control values (e.g. spin-lock times, seconds), one per acquisition.
    pub control: Vec<f64>,
    /// Signal at `x = 0`.
    pub amplitude: f64,
    pub background_time_constant: f64,
    pub inclusions: Vec<Inclusion>,
    /// Standard deviation of additive Gaussian noise (0 disables noise).
    pub noise_sigma: f64,
    pub seed: u64,
}

impl PhantomSpec {
    /// Default layout (40 ms background, 30 ms and 55 ms discs) at a given size.
    pub fn with_shape(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            control: vec![0.0, 0.01, 0.03, 0.05],
            amplitude: 1000.0,
            background_time_constant: 0.04,
            inclusions: vec![
                Inclusion {
                    row: 0.33,
                    col: 0.33,
                    radius: 0.18,
                    time_constant: 0.03,
                },
                Inclusion {
                    row: 0.67,
                    col: 0.67,
                    radius: 0.18,
                    time_constant: 0.055,
                },
            ],
            noise_sigma: 0.0,
            seed: 42,
        }
    }
}

impl Default for PhantomSpec {
    fn default() -> Self {
        Self::with_shape(32, 32)
    }
}

/// A generated phantom: the acquisition plus its ground truth.
#[derive(Debug, Clone)]
pub struct Phantom {
    pub acquisition: Acquisition,
    pub true_rate: Field,
    pub true_time_constant: Field,
}

pub fn generate_phantom(spec: &PhantomSpec) -> Result<Phantom, AppError> {
    validate(spec)?;

    let true_time_constant = Field::from_fn(spec.height, spec.width, |r, c| {
        region_time_constant(spec, r, c)
    });
    let true_rate = true_time_constant.map(|t| 1.0 / t);

    let noise = if spec.noise_sigma > 0.0 {
        Some(
            Normal::new(0.0, spec.noise_sigma)
                .map_err(|e| AppError::internal(format!("Noise distribution error: {e}")))?,
        )
    } else {
        None
    };
    let mut rng = StdRng::seed_from_u64(spec.seed);

    let signal: Vec<Field> = spec
        .control
        .iter()
        .map(|&x| {
            let mut slice = true_rate.map(|b| spec.amplitude * (-b * x).exp());
            if let Some(noise) = &noise {
                for v in slice.iter_mut() {
                    *v += noise.sample(&mut rng);
                }
            }
            slice
        })
        .collect();

    let acquisition = Acquisition::from_control_values(&spec.control, signal)?;
    Ok(Phantom {
        acquisition,
        true_rate,
        true_time_constant,
    })
}

fn validate(spec: &PhantomSpec) -> Result<(), AppError> {
    if spec.height == 0 || spec.width == 0 {
        return Err(AppError::invalid_input(format!(
            "Phantom shape must be non-empty, got {}x{}.",
            spec.height, spec.width
        )));
    }
    if spec.control.is_empty() {
        return Err(AppError::invalid_input("Phantom needs at least one control value."));
    }
    if spec.control.iter().any(|x| !x.is_finite()) {
        return Err(AppError::invalid_input("Phantom control values must be finite."));
    }
    if !(spec.amplitude.is_finite() && spec.amplitude > 0.0) {
        return Err(AppError::invalid_input("Phantom amplitude must be finite and > 0."));
    }
    let time_constants = std::iter::once(spec.background_time_constant)
        .chain(spec.inclusions.iter().map(|inc| inc.time_constant));
    for t in time_constants {
        if !(t.is_finite() && t > 0.0) {
            return Err(AppError::invalid_input(format!(
                "Phantom time constants must be finite and > 0, got {t}."
            )));
        }
    }
    if !(spec.noise_sigma.is_finite() && spec.noise_sigma >= 0.0) {
        return Err(AppError::invalid_input("Noise sigma must be finite and >= 0."));
    }
    Ok(())
}

/// Time constant at pixel `(r, c)`; later inclusions win where discs overlap.
fn region_time_constant(spec: &PhantomSpec, r: usize, c: usize) -> f64 {
    let scale = spec.height.min(spec.width) as f64;
    let y = r as f64 + 0.5;
    let x = c as f64 + 0.5;

    spec.inclusions
        .iter()
        .rev()
        .find(|inc| {
            let dy = y - inc.row * spec.height as f64;
            let dx = x - inc.col * spec.width as f64;
            let radius = inc.radius * scale;
            dy * dy + dx * dx <= radius * radius
        })
        .map(|inc| inc.time_constant)
        .unwrap_or(spec.background_time_constant)
}
