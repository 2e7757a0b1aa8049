// src/main.rs

pub mod app;
pub mod cli;
pub mod color;
pub mod config;
pub mod display;
pub mod kernel;
pub mod palette;
pub mod pipeline;
pub mod raster;
pub mod signals;

use crate::{
    app::{App, DisplayLoop, ShutdownCoordinator},
    cli::{Cli, DisplayKind},
    config::{Config, ConfigError, KernelConfig, RUNTIME_FAULT_EXIT_CODE},
    display::{ConsoleDisplayDriver, DisplayDriver, DisplayManager, HeadlessDisplayDriver},
    pipeline::{completion_channel, frame_queue, FrameProducer},
};

use anyhow::Context;
use log::{error, info, warn};

/// Main entry point for `framegen`.
fn main() {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let cli = Cli::parse_or_exit();

    let (kernel_config, config) = match resolve(&cli) {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = run(&cli, kernel_config, config) {
        error!("framegen failed: {:#}. Root cause: {:?}", e, e.root_cause());
        eprintln!("Error: {e:#}");
        std::process::exit(RUNTIME_FAULT_EXIT_CODE);
    }
}

/// Validates the positionals and loads the tunables. Nothing is started yet.
fn resolve(cli: &Cli) -> Result<(KernelConfig, Config), ConfigError> {
    let kernel_config =
        KernelConfig::resolve(&cli.algorithm, &cli.accelerator, &cli.width, &cli.height)?;
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    Ok((kernel_config, config))
}

fn run(cli: &Cli, kernel_config: KernelConfig, config: Config) -> anyhow::Result<()> {
    info!(
        "Starting framegen: algorithm={}, accelerator={}, size={}x{}",
        kernel_config.algorithm, kernel_config.accelerator, kernel_config.width, kernel_config.height
    );

    signals::install().context("Failed to install signal handlers")?;

    let driver: Box<dyn DisplayDriver> = match cli.display {
        DisplayKind::Console => {
            if cli.max_frames.is_some() {
                warn!("--max-frames only applies to the headless display, ignoring");
            }
            Box::new(ConsoleDisplayDriver::new().context("Failed to open console display")?)
        }
        DisplayKind::Headless => {
            let driver = HeadlessDisplayDriver::new();
            Box::new(match cli.max_frames {
                Some(n) => driver.close_after(n),
                None => driver,
            })
        }
    };
    let display = DisplayManager::new(driver, &config.display.title)?;

    let kernel = kernel::build_kernel(&kernel_config, config.fire.seed);
    let (frame_tx, frame_rx) = frame_queue(config.pipeline.queue_bound);
    let (done_tx, done_rx) = completion_channel();
    let producer = FrameProducer::spawn(
        kernel,
        kernel_config.width as usize,
        kernel_config.height as usize,
        frame_tx,
        done_tx,
    )?;

    let app = App::new(
        display,
        DisplayLoop::new(frame_rx, config.display.status_prefix.clone()),
        ShutdownCoordinator::new(producer, done_rx),
        &config,
        signals::termination_requested,
    )?;
    let completion = app.run()?;

    info!(
        "framegen exited successfully after {} frames.",
        completion.frames
    );
    Ok(())
}
