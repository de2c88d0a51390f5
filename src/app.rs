//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - installs the log subscriber
//! - resolves solver settings (config file + flag overrides)
//! - runs the fit pipeline
//! - prints reports/heatmaps
//! - writes optional exports

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Cli, Command, DisplayArgs, ExportArgs, FitArgs, PhantomArgs, RenderArgs, SolverArgs, WindowArgs,
};
use crate::data::PhantomSpec;
use crate::domain::{Quantity, SolverConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `t1rho` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Phantom(args) => handle_phantom(args),
        Command::Render(args) => handle_render(args),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second install (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = solver_config_from_args(&args.solver)?;
    resolve_window(&args.display.window, Quantity::TimeConstant)?;

    let run = pipeline::run_stack(&args.stack, &config)?;
    present(&run, &config, &args.display, &args.export)
}

fn handle_phantom(args: PhantomArgs) -> Result<(), AppError> {
    let config = solver_config_from_args(&args.solver)?;
    resolve_window(&args.display.window, Quantity::TimeConstant)?;

    let spec = phantom_spec_from_args(&args);
    let run = pipeline::run_phantom(&spec, &config, args.save_stack.as_deref())?;
    present(&run, &config, &args.display, &args.export)
}

fn handle_render(args: RenderArgs) -> Result<(), AppError> {
    let doc = crate::io::read_field_json(&args.field)?;
    let (vmin, vmax) = resolve_window(&args.window, doc.quantity)?;
    let field = crate::io::field_from_file(&doc);

    println!(
        "Field: {} | {} after {} iterations (width norm {:.3e}) | generated {}",
        doc.quantity.display_name(),
        doc.termination.display_name(),
        doc.iterations,
        doc.width_norm,
        doc.generated
    );
    let w = &args.window;
    println!(
        "{}",
        crate::plot::render_ascii_field(&field, vmin, vmax, w.width, w.height)
    );
    Ok(())
}

fn present(
    run: &pipeline::RunOutput,
    config: &SolverConfig,
    display: &DisplayArgs,
    export: &ExportArgs,
) -> Result<(), AppError> {
    print!(
        "{}",
        crate::report::format_run_summary(&run.source, &run.acquisition, &run.outcome, config)
    );

    if let Some(truth) = &run.truth {
        let err = crate::report::recovery_error(&run.outcome.time_constant, truth);
        print!("{}", crate::report::format_recovery(err.as_ref()));
    }

    if !display.no_plot {
        let w = &display.window;
        let (vmin, vmax) = resolve_window(w, Quantity::TimeConstant)?;
        let map = &run.outcome.time_constant;
        println!();
        print!(
            "{}",
            crate::plot::render_ascii_field(map, vmin, vmax, w.width, w.height)
        );
    }

    let field = match export.quantity {
        Quantity::Rate => &run.outcome.rate,
        Quantity::TimeConstant => &run.outcome.time_constant,
    };
    if let Some(path) = &export.export_csv {
        crate::io::write_field_csv(path, field)?;
    }
    if let Some(path) = &export.export_json {
        crate::io::write_field_json(path, &run.outcome, export.quantity)?;
    }

    Ok(())
}

/// Resolve solver settings: defaults, then `--config`, then individual flags.
pub fn solver_config_from_args(args: &SolverArgs) -> Result<SolverConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => read_solver_config(path)?,
        None => SolverConfig::default(),
    };

    if let Some(v) = args.lower_bound {
        config.lower_bound = v;
    }
    if let Some(v) = args.upper_bound {
        config.upper_bound = v;
    }
    if let Some(v) = args.probe_epsilon {
        config.probe_epsilon = v;
    }
    if let Some(v) = args.tolerance {
        config.tolerance = v;
    }
    if let Some(v) = args.max_iterations {
        config.max_iterations = v;
    }
    if let Some(v) = args.output_epsilon {
        config.output_epsilon = v;
    }

    config.validate()?;
    Ok(config)
}

fn read_solver_config(path: &Path) -> Result<SolverConfig, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to open solver config '{}': {e}", path.display()))
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::invalid_input(format!("Invalid solver config JSON: {e}")))
}

pub fn phantom_spec_from_args(args: &PhantomArgs) -> PhantomSpec {
    PhantomSpec {
        control: args.control.clone(),
        amplitude: args.amplitude,
        background_time_constant: args.background,
        noise_sigma: args.noise,
        seed: args.seed,
        ..PhantomSpec::with_shape(args.rows, args.cols)
    }
}

/// Fill in missing window ends from the quantity's default and validate.
fn resolve_window(window: &WindowArgs, quantity: Quantity) -> Result<(f64, f64), AppError> {
    let (default_min, default_max) = quantity.default_window();
    let vmin = window.vmin.unwrap_or(default_min);
    let vmax = window.vmax.unwrap_or(default_max);
    if !(vmin.is_finite() && vmax.is_finite() && vmax > vmin) {
        return Err(AppError::invalid_input(format!(
            "Invalid display window: vmin={vmin}, vmax={vmax} (must be finite and vmax>vmin)."
        )));
    }
    Ok((vmin, vmax))
}
