//! Command-line parsing for the relaxation mapper.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimation code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::Quantity;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "t1rho", version, about = "Per-pixel exponential relaxation mapping")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a stack JSON file and print the resulting map.
    Fit(FitArgs),
    /// Generate a synthetic phantom, fit it, and compare against ground truth.
    Phantom(PhantomArgs),
    /// Render a previously exported field JSON.
    Render(RenderArgs),
}

/// Solver settings. Flags override values loaded from `--config`.
#[derive(Debug, Args, Clone, Default)]
pub struct SolverArgs {
    /// JSON file with solver settings (missing keys keep their defaults).
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Initial lower bound of the rate interval.
    #[arg(long)]
    pub lower_bound: Option<f64>,

    /// Initial upper bound of the rate interval.
    #[arg(long)]
    pub upper_bound: Option<f64>,

    /// Step of the forward-difference slope probe.
    #[arg(long)]
    pub probe_epsilon: Option<f64>,

    /// Convergence tolerance on the interval-width norm.
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Iteration cap.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Epsilon added to the rate before inversion.
    #[arg(long)]
    pub output_epsilon: Option<f64>,
}

/// Display window and size for the terminal heatmap.
#[derive(Debug, Args, Clone)]
pub struct WindowArgs {
    /// Lower end of the display window (default depends on the quantity).
    #[arg(long)]
    pub vmin: Option<f64>,

    /// Upper end of the display window (default depends on the quantity).
    #[arg(long)]
    pub vmax: Option<f64>,

    /// Heatmap width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Heatmap height (rows).
    #[arg(long, default_value_t = 40)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct DisplayArgs {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Disable the terminal heatmap.
    #[arg(long)]
    pub no_plot: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Export the map to CSV (one line per image row).
    #[arg(long, value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Export the map to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Which quantity to export.
    #[arg(long, value_enum, default_value_t = Quantity::TimeConstant)]
    pub quantity: Quantity,
}

/// Options for fitting a stack file.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Stack JSON file (shape, control values, row-major slices).
    #[arg(long, value_name = "JSON")]
    pub stack: PathBuf,

    #[command(flatten)]
    pub solver: SolverArgs,

    #[command(flatten)]
    pub display: DisplayArgs,

    #[command(flatten)]
    pub export: ExportArgs,
}

/// Options for the synthetic phantom.
#[derive(Debug, Args, Clone)]
pub struct PhantomArgs {
    /// Phantom height (rows).
    #[arg(long = "rows", default_value_t = 32)]
    pub rows: usize,

    /// Phantom width (columns).
    #[arg(long = "cols", default_value_t = 32)]
    pub cols: usize,

    /// Control values, comma-separated (e.g. spin-lock times in seconds).
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.0, 0.01, 0.03, 0.05])]
    pub control: Vec<f64>,

    /// Signal amplitude at zero control value.
    #[arg(long, default_value_t = 1000.0)]
    pub amplitude: f64,

    /// Background time constant.
    #[arg(long, default_value_t = 0.04)]
    pub background: f64,

    /// Standard deviation of additive Gaussian noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Save the generated stack as JSON (readable by `t1rho fit`).
    #[arg(long, value_name = "JSON")]
    pub save_stack: Option<PathBuf>,

    #[command(flatten)]
    pub solver: SolverArgs,

    #[command(flatten)]
    pub display: DisplayArgs,

    #[command(flatten)]
    pub export: ExportArgs,
}

/// Options for rendering a saved field.
#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Field JSON file produced by `--export-json`.
    #[arg(long, value_name = "JSON")]
    pub field: PathBuf,

    #[command(flatten)]
    pub window: WindowArgs,
}
