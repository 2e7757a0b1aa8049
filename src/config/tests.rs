// src/config/tests.rs

use super::*;

#[test_log::test]
fn resolves_a_valid_gradient_selection() {
    let cfg = KernelConfig::resolve("desenho", "prefill", "500", "2048").unwrap();
    assert_eq!(
        cfg,
        KernelConfig {
            algorithm: Algorithm::Desenho,
            accelerator: Accelerator::Prefill,
            width: 500,
            height: 2048,
        }
    );
}

#[test_log::test]
fn algorithm_names_are_case_insensitive_and_have_aliases() {
    assert_eq!("FLAMAS".parse::<Algorithm>().unwrap(), Algorithm::Flamas);
    assert_eq!("fire".parse::<Algorithm>().unwrap(), Algorithm::Flamas);
    assert_eq!("Gradient".parse::<Algorithm>().unwrap(), Algorithm::Desenho);
}

#[test_log::test]
fn unknown_algorithm_exits_with_status_1() {
    let err = KernelConfig::resolve("plasma", "scalar", "600", "600").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownAlgorithm(ref name) if name == "plasma"));
    assert_eq!(err.exit_code(), 1);
}

#[test_log::test]
fn accelerator_must_exist_and_fit_the_algorithm() {
    let err = KernelConfig::resolve("flamas", "gpu", "600", "600").unwrap_err();
    assert_eq!(err.exit_code(), 2);

    // prefill only has a gradient implementation
    let err = KernelConfig::resolve("flamas", "prefill", "600", "600").unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("flamas"));
}

#[test_log::test]
fn legacy_accelerator_names_map_to_implementations() {
    let accel = |alg: &str, acc: &str| {
        KernelConfig::resolve(alg, acc, "500", "500")
            .unwrap()
            .accelerator
    };
    assert_eq!(accel("desenho", "python"), Accelerator::Scalar);
    assert_eq!(accel("desenho", "Numba"), Accelerator::Rayon);
    assert_eq!(accel("desenho", "cython"), Accelerator::Prefill);
    assert_eq!(accel("flamas", "python"), Accelerator::Scalar);
    assert_eq!(accel("flamas", "numba"), Accelerator::Rayon);
    assert_eq!(accel("flamas", "cython"), Accelerator::Scalar);
}

#[test_log::test]
fn width_499_is_rejected_and_500_accepted() {
    let err = KernelConfig::resolve("desenho", "scalar", "499", "600").unwrap_err();
    assert_eq!(err.exit_code(), 3);

    let cfg = KernelConfig::resolve("desenho", "scalar", "500", "600").unwrap();
    assert_eq!(cfg.width, 500);
}

#[test_log::test]
fn dimension_bounds_are_inclusive() {
    assert!(KernelConfig::resolve("flamas", "rayon", "2048", "500").is_ok());
    assert_eq!(
        KernelConfig::resolve("flamas", "rayon", "2049", "600")
            .unwrap_err()
            .exit_code(),
        3
    );
    assert_eq!(
        KernelConfig::resolve("flamas", "rayon", "600", "abc")
            .unwrap_err()
            .exit_code(),
        3
    );
}

#[test_log::test]
fn validation_order_reports_algorithm_before_dimensions() {
    let err = KernelConfig::resolve("nope", "nope", "1", "1").unwrap_err();
    assert_eq!(err.exit_code(), 1);
    let err = KernelConfig::resolve("desenho", "nope", "1", "1").unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[test_log::test]
fn partial_json_falls_back_to_defaults() {
    let cfg: Config = serde_json::from_str(r#"{ "pipeline": { "queue_bound": 4 } }"#).unwrap();
    assert_eq!(cfg.pipeline.queue_bound, Some(4));
    assert_eq!(cfg.display, DisplayConfig::default());
    assert_eq!(cfg.shutdown.poll_ms, 1);
    assert_eq!(cfg.fire.seed, None);
}

#[test_log::test]
fn missing_config_file_exits_with_status_4() {
    let err = Config::load(Path::new("/nonexistent/framegen.json")).unwrap_err();
    assert_eq!(err.exit_code(), 4);
}

#[test_log::test]
fn tick_periods_never_collapse_to_zero() {
    let display = DisplayConfig {
        tick_ms: 0,
        ..DisplayConfig::default()
    };
    assert_eq!(display.tick(), Duration::from_millis(1));
    assert_eq!(ShutdownConfig { poll_ms: 0 }.poll(), Duration::from_millis(1));
}
