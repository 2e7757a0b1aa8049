// src/config.rs

//! Configuration for a generator run.
//!
//! Two layers live here:
//!
//! - [`KernelConfig`]: the immutable (algorithm, accelerator, width, height)
//!   tuple chosen once at startup. It is resolved from raw strings and every
//!   validation failure maps to a distinct process exit status.
//! - [`Config`]: runtime tunables (tick periods, queue bound, fire seed) that
//!   can be loaded from a JSON file. Every field has a default, so a missing
//!   file section or field is never an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Smallest accepted width or height, inclusive.
pub const MIN_DIMENSION: u32 = 500;
/// Largest accepted width or height, inclusive.
pub const MAX_DIMENSION: u32 = 2048;

/// Exit status for command-line usage errors (missing positionals, bad flags).
pub const USAGE_EXIT_CODE: i32 = 64;
/// Exit status when the producer faults at runtime.
pub const RUNTIME_FAULT_EXIT_CODE: i32 = 70;

/// Errors raised while resolving the run configuration.
///
/// All of them are reported before any thread starts and are never retried.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("invalid accelerator '{accelerator}' for algorithm {algorithm}")]
    InvalidAccelerator {
        algorithm: Algorithm,
        accelerator: String,
    },

    #[error(
        "width and height must be values between {} and {} (got {width}x{height})",
        MIN_DIMENSION,
        MAX_DIMENSION
    )]
    DimensionsOutOfRange { width: String, height: String },

    #[error("config file '{path}': {reason}")]
    File { path: String, reason: String },
}

impl ConfigError {
    /// Process exit status reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::UnknownAlgorithm(_) => 1,
            ConfigError::InvalidAccelerator { .. } => 2,
            ConfigError::DimensionsOutOfRange { .. } => 3,
            ConfigError::File { .. } => 4,
        }
    }
}

/// The procedural image to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Vertical gradient, direct color.
    Desenho,
    /// Diffusion fire, palette indexed.
    Flamas,
}

impl Algorithm {
    /// Accelerators that implement this algorithm.
    pub fn accelerators(self) -> &'static [Accelerator] {
        match self {
            Algorithm::Desenho => &[Accelerator::Scalar, Accelerator::Rayon, Accelerator::Prefill],
            Algorithm::Flamas => &[Accelerator::Scalar, Accelerator::Rayon],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Desenho => "desenho",
            Algorithm::Flamas => "flamas",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "desenho" | "gradient" => Ok(Algorithm::Desenho),
            "flamas" | "fire" => Ok(Algorithm::Flamas),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Interchangeable implementations of a kernel. All of them produce
/// bit-identical output for the same inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accelerator {
    /// Plain sequential loops.
    Scalar,
    /// Row-parallel loops on the rayon pool.
    Rayon,
    /// Gradient only: a one-time initialization pass writes every channel,
    /// later frames only rewrite the blue channel.
    Prefill,
}

impl Accelerator {
    pub fn name(self) -> &'static str {
        match self {
            Accelerator::Scalar => "scalar",
            Accelerator::Rayon => "rayon",
            Accelerator::Prefill => "prefill",
        }
    }

    /// Parses an accelerator name for `algorithm`.
    ///
    /// The legacy names `python`, `numba` and `cython` are accepted too.
    /// `cython` selects the two-pass implementation where one exists and
    /// the scalar one otherwise.
    fn parse(s: &str, algorithm: Algorithm) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "scalar" | "python" => Some(Accelerator::Scalar),
            "rayon" | "numba" => Some(Accelerator::Rayon),
            "prefill" => Some(Accelerator::Prefill),
            "cython" => match algorithm {
                Algorithm::Desenho => Some(Accelerator::Prefill),
                Algorithm::Flamas => Some(Accelerator::Scalar),
            },
            _ => None,
        }
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved kernel selection. Built once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelConfig {
    pub algorithm: Algorithm,
    pub accelerator: Accelerator,
    pub width: u32,
    pub height: u32,
}

impl KernelConfig {
    /// Validates the four raw command-line values.
    ///
    /// Checks run in order: algorithm, accelerator, dimensions. The first
    /// failure wins.
    pub fn resolve(
        algorithm: &str,
        accelerator: &str,
        width: &str,
        height: &str,
    ) -> Result<Self, ConfigError> {
        let algorithm: Algorithm = algorithm.parse()?;

        let accelerator = Accelerator::parse(accelerator, algorithm)
            .filter(|acc| algorithm.accelerators().contains(acc))
            .ok_or_else(|| ConfigError::InvalidAccelerator {
                algorithm,
                accelerator: accelerator.to_string(),
            })?;

        let out_of_range = || ConfigError::DimensionsOutOfRange {
            width: width.to_string(),
            height: height.to_string(),
        };
        let parse_dim = |raw: &str| {
            raw.trim()
                .parse::<u32>()
                .ok()
                .filter(|v| (MIN_DIMENSION..=MAX_DIMENSION).contains(v))
        };
        let w = parse_dim(width).ok_or_else(out_of_range)?;
        let h = parse_dim(height).ok_or_else(out_of_range)?;

        Ok(KernelConfig {
            algorithm,
            accelerator,
            width: w,
            height: h,
        })
    }
}

// --- Runtime tunables ---

/// Runtime tunables. Deserialized from JSON; every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub shutdown: ShutdownConfig,
    pub pipeline: PipelineConfig,
    pub fire: FireConfig,
}

impl Config {
    /// Loads tunables from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file_err = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| file_err(e.to_string()))
    }
}

/// Settings for the consumer side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Period of the display polling tick, in milliseconds.
    pub tick_ms: u64,
    /// Label shown before the frame sequence number in the status line.
    pub status_prefix: String,
    /// Window title requested from the driver at startup.
    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            tick_ms: 10,
            status_prefix: "Frame".to_string(),
            title: "Image Generator".to_string(),
        }
    }
}

impl DisplayConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Settings for the shutdown handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Period of the completion-channel poll while terminating, in milliseconds.
    pub poll_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        ShutdownConfig { poll_ms: 1 }
    }
}

impl ShutdownConfig {
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

/// Settings for the frame handoff.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum queued frames. `None` keeps the queue unbounded; a bound makes
    /// the producer block when the display falls behind.
    pub queue_bound: Option<usize>,
}

/// Settings for the fire kernel.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FireConfig {
    /// Seed for ignition. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests;
