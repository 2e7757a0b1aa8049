//! Process-level tests driving the built binary.

use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_framegen");

fn framegen(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("failed to run framegen")
}

fn exit_code(args: &[&str]) -> Option<i32> {
    framegen(args).status.code()
}

#[test]
fn unknown_algorithm_exits_with_1() {
    assert_eq!(exit_code(&["espiral", "scalar", "800", "600"]), Some(1));
}

#[test]
fn accelerator_not_valid_for_algorithm_exits_with_2() {
    assert_eq!(exit_code(&["flamas", "prefill", "800", "600"]), Some(2));
    assert_eq!(exit_code(&["desenho", "gpu", "800", "600"]), Some(2));
}

#[test]
fn dimensions_out_of_range_exit_with_3() {
    assert_eq!(exit_code(&["desenho", "scalar", "499", "600"]), Some(3));
    assert_eq!(exit_code(&["desenho", "scalar", "800", "2049"]), Some(3));
    assert_eq!(exit_code(&["desenho", "scalar", "wide", "600"]), Some(3));
}

#[test]
fn algorithm_is_checked_before_dimensions() {
    assert_eq!(exit_code(&["espiral", "gpu", "1", "1"]), Some(1));
}

#[test]
fn missing_positionals_are_a_usage_error() {
    assert_eq!(exit_code(&["desenho"]), Some(64));
}

#[test]
fn unreadable_config_file_exits_with_4() {
    assert_eq!(
        exit_code(&[
            "desenho",
            "scalar",
            "500",
            "500",
            "--config",
            "/nonexistent/framegen.json"
        ]),
        Some(4)
    );
}

#[test]
fn headless_run_stops_after_max_frames() {
    let output = framegen(&[
        "flamas",
        "rayon",
        "500",
        "500",
        "--display",
        "headless",
        "--max-frames",
        "5",
        "--seed",
        "42",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(0), "{stderr}");
    assert!(stderr.contains("algorithm=flamas"), "{stderr}");
    assert!(stderr.contains("framegen exited successfully"), "{stderr}");
}

#[test]
fn console_run_quits_on_q() -> Result<(), rexpect::error::Error> {
    let mut p = rexpect::spawn(&format!("{BIN} desenho prefill 500 500"), Some(30_000))?;
    p.exp_string("App: starting event loop")?;
    p.send("q")?;
    p.flush()?;
    p.exp_string("framegen exited successfully")?;
    p.exp_eof()?;
    Ok(())
}
