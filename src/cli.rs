// src/cli.rs
//! Command-line surface.
//!
//! Positionals are taken as raw strings; validation and exit codes belong to
//! [`KernelConfig::resolve`](crate::config::KernelConfig::resolve).

use crate::config::{Config, USAGE_EXIT_CODE};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DisplayKind {
    /// Truecolor half-block rendering in the current terminal
    Console,
    /// No output; frames are counted and dropped
    Headless,
}

#[derive(Debug, Parser)]
#[command(
    name = "framegen",
    version,
    about = "Procedural frame generator (gradient or fire)"
)]
pub struct Cli {
    /// Algorithm: desenho (gradient) or flamas (fire)
    pub algorithm: String,
    /// Kernel implementation: scalar, rayon, prefill (gradient only).
    /// python, numba and cython are accepted as aliases
    pub accelerator: String,
    /// Frame width in pixels, 500..=2048
    pub width: String,
    /// Frame height in pixels, 500..=2048
    pub height: String,

    /// Presentation surface
    #[arg(long, value_enum, default_value = "console")]
    pub display: DisplayKind,
    /// Seed for the fire kernel's ignition
    #[arg(long)]
    pub seed: Option<u64>,
    /// Close after this many frames have been presented (headless only)
    #[arg(long)]
    pub max_frames: Option<u64>,
    /// Bound the frame queue to this many frames
    #[arg(long)]
    pub queue_bound: Option<usize>,
    /// JSON file with runtime tunables
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parses `std::env::args`. Help and version print and exit 0; any other
    /// parse failure prints usage and exits with the usage status.
    pub fn parse_or_exit() -> Self {
        match Cli::try_parse() {
            Ok(cli) => cli,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
                _ => {
                    let _ = e.print();
                    std::process::exit(USAGE_EXIT_CODE);
                }
            },
        }
    }

    /// Applies flag overrides on top of file-loaded tunables.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(seed) = self.seed {
            config.fire.seed = Some(seed);
        }
        if let Some(bound) = self.queue_bound {
            config.pipeline.queue_bound = Some(bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn parses_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "framegen",
            "flamas",
            "rayon",
            "640",
            "480",
            "--display",
            "headless",
            "--seed",
            "9",
            "--max-frames",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.algorithm, "flamas");
        assert_eq!(cli.accelerator, "rayon");
        assert_eq!((cli.width.as_str(), cli.height.as_str()), ("640", "480"));
        assert_eq!(cli.display, DisplayKind::Headless);
        assert_eq!(cli.seed, Some(9));
        assert_eq!(cli.max_frames, Some(3));
        assert_eq!(cli.queue_bound, None);
    }

    #[test_log::test]
    fn dimensions_are_not_validated_by_the_parser() {
        let cli = Cli::try_parse_from(["framegen", "desenho", "scalar", "abc", "99999"]).unwrap();
        assert_eq!(cli.width, "abc");
        assert_eq!(cli.height, "99999");
        assert_eq!(cli.display, DisplayKind::Console);
    }

    #[test_log::test]
    fn missing_positionals_are_a_usage_error() {
        let err = Cli::try_parse_from(["framegen", "desenho"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test_log::test]
    fn flags_override_file_values() {
        let mut config = Config::default();
        config.fire.seed = Some(1);
        let cli = Cli::try_parse_from([
            "framegen",
            "flamas",
            "scalar",
            "500",
            "500",
            "--seed",
            "2",
            "--queue-bound",
            "4",
        ])
        .unwrap();
        cli.apply_overrides(&mut config);
        assert_eq!(config.fire.seed, Some(2));
        assert_eq!(config.pipeline.queue_bound, Some(4));
    }
}
