// src/kernel/mod.rs
//! Pluggable pixel-computation kernels.
//!
//! A kernel fills a [`Raster`] for one frame. The producer only talks to the
//! [`Kernel`] trait, so any accelerator implementation of an algorithm can be
//! swapped in without touching the pipeline.
//!
//! ## Lifecycle
//! 1. `prepare(width, height)` - allocate auxiliary state (heat grid)
//! 2. `initialize(raster, 0)` - only if `needs_initialization()`
//! 3. `advance(raster, frame)` - once per frame, forever

pub mod fire;
pub mod gradient;

pub use fire::{FireKernel, HeatGrid};
pub use gradient::GradientKernel;

use crate::config::{Algorithm, KernelConfig};
use crate::palette::Palette;
use crate::raster::{ColorMode, Raster};
use anyhow::Result;
use std::sync::Arc;

/// A frame-filling computation.
///
/// Implementations must be deterministic given their inputs, except for
/// explicitly random state they own (fire ignition).
pub trait Kernel: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Storage layout of the raster this kernel writes.
    fn color_mode(&self) -> ColorMode;

    /// Allocates any auxiliary state for a `width × height` run.
    fn prepare(&mut self, _width: usize, _height: usize) -> Result<()> {
        Ok(())
    }

    /// Whether `initialize` must run once before the first `advance`.
    fn needs_initialization(&self) -> bool {
        false
    }

    /// One-time pass run with frame 0 before the loop starts.
    fn initialize(&mut self, raster: &mut Raster, frame: u64) -> Result<()> {
        self.advance(raster, frame)
    }

    /// Computes one frame into `raster`.
    fn advance(&mut self, raster: &mut Raster, frame: u64) -> Result<()>;

    /// Palette for indexed rasters.
    fn palette(&self) -> Option<Arc<Palette>> {
        None
    }
}

/// Builds the kernel selected by `config`.
///
/// `fire_seed` fixes the ignition sequence of the fire kernel; `None` seeds
/// from OS entropy.
pub fn build_kernel(config: &KernelConfig, fire_seed: Option<u64>) -> Box<dyn Kernel> {
    match config.algorithm {
        Algorithm::Desenho => Box::new(GradientKernel::new(config.accelerator)),
        Algorithm::Flamas => Box::new(FireKernel::new(config.accelerator, fire_seed)),
    }
}
