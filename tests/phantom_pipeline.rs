use std::path::PathBuf;

use approx::assert_abs_diff_eq;

use t1rho_map::app::pipeline::{run_acquisition, run_phantom, run_stack};
use t1rho_map::data::{PhantomSpec, generate_phantom};
use t1rho_map::domain::{Quantity, SolverConfig, Termination};
use t1rho_map::io::{
    field_from_file, read_field_json, write_field_csv, write_field_json, write_stack_json,
};
use t1rho_map::report::recovery_error;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("t1rho-{}-{name}", std::process::id()))
}

#[test]
fn noise_free_phantom_is_recovered() {
    let spec = PhantomSpec::with_shape(16, 16);
    let run = run_phantom(&spec, &SolverConfig::default(), None).unwrap();

    assert_eq!(run.outcome.termination, Termination::Converged);
    let truth = run.truth.as_ref().unwrap();
    let err = recovery_error(&run.outcome.time_constant, truth).unwrap();
    assert_eq!(err.n_skipped, 0);
    assert!(err.max_abs < 1e-4, "max abs error {}", err.max_abs);

    // Amplitude at the converged rate matches the synthetic S0.
    for &a in run.outcome.amplitude.iter() {
        assert_abs_diff_eq!(a, spec.amplitude, epsilon = 1e-2);
    }
}

#[test]
fn saved_stack_fits_like_the_in_memory_phantom() {
    let path = temp_path("stack.json");
    let spec = PhantomSpec {
        noise_sigma: 2.0,
        seed: 7,
        ..PhantomSpec::with_shape(8, 10)
    };
    let config = SolverConfig::default();

    let direct = run_phantom(&spec, &config, Some(&path)).unwrap();
    let reloaded = run_stack(&path, &config).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(reloaded.acquisition.shape(), (8, 10));
    assert_eq!(reloaded.outcome.iterations, direct.outcome.iterations);
    assert_eq!(reloaded.outcome.rate, direct.outcome.rate);
    assert!(reloaded.truth.is_none());
}

#[test]
fn exported_field_renders_back_to_the_same_values() {
    let json = temp_path("field.json");
    let csv = temp_path("field.csv");

    let phantom = generate_phantom(&PhantomSpec::with_shape(5, 7)).unwrap();
    let run = run_acquisition("test".into(), phantom.acquisition, &SolverConfig::default(), None);

    write_field_json(&json, &run.outcome, Quantity::TimeConstant).unwrap();
    write_field_csv(&csv, &run.outcome.time_constant).unwrap();

    let doc = read_field_json(&json).unwrap();
    let text = std::fs::read_to_string(&csv).unwrap();
    let _ = std::fs::remove_file(&json);
    let _ = std::fs::remove_file(&csv);

    assert_eq!(doc.quantity, Quantity::TimeConstant);
    assert_eq!(doc.iterations, run.outcome.iterations);
    assert_eq!(field_from_file(&doc), run.outcome.time_constant);
    assert_eq!(text.lines().count(), 5);
    assert!(text.lines().all(|l| l.split(',').count() == 7));
}

#[test]
fn constant_control_stack_survives_write_and_read() {
    let path = temp_path("roundtrip.json");
    let phantom = generate_phantom(&PhantomSpec::with_shape(3, 4)).unwrap();

    write_stack_json(&path, &phantom.acquisition).unwrap();
    let back = t1rho_map::io::read_stack_json(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(back.n_samples(), 4);
    assert_eq!(back.signal(), phantom.acquisition.signal());
    assert_eq!(back.control(), phantom.acquisition.control());
}
