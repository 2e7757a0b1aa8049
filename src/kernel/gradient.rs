// src/kernel/gradient.rs
//! Vertical gradient kernel.
//!
//! Every pixel on row `y` becomes `(0, 0, y / (frame + 1))` with integer
//! division. The blue value is truncated to 8 bits, so rows past 255 wrap.
//! This is a throughput workload: the picture fades to black within a few
//! frames and stays there.

use super::Kernel;
use crate::config::Accelerator;
use crate::raster::{ColorMode, Raster};
use anyhow::Result;
use rayon::prelude::*;

/// Stateless gradient kernel.
#[derive(Debug, Clone, Copy)]
pub struct GradientKernel {
    accelerator: Accelerator,
}

impl GradientKernel {
    pub fn new(accelerator: Accelerator) -> Self {
        Self { accelerator }
    }
}

/// Blue channel for row `y` at `frame`.
#[inline]
pub fn blue_at(y: usize, frame: u64) -> u8 {
    (y as u64 / frame.saturating_add(1)) as u8
}

impl Kernel for GradientKernel {
    fn name(&self) -> &'static str {
        "gradient"
    }

    fn color_mode(&self) -> ColorMode {
        ColorMode::Direct
    }

    fn needs_initialization(&self) -> bool {
        self.accelerator == Accelerator::Prefill
    }

    fn initialize(&mut self, raster: &mut Raster, frame: u64) -> Result<()> {
        let width = raster.width();
        fill_scalar(raster.direct_mut()?, width, frame);
        Ok(())
    }

    fn advance(&mut self, raster: &mut Raster, frame: u64) -> Result<()> {
        let width = raster.width();
        let pixels = raster.direct_mut()?;
        match self.accelerator {
            Accelerator::Scalar => fill_scalar(pixels, width, frame),
            Accelerator::Rayon => fill_rayon(pixels, width, frame),
            Accelerator::Prefill => fill_blue_only(pixels, width, frame),
        }
        Ok(())
    }
}

fn fill_scalar(pixels: &mut [[u8; 3]], width: usize, frame: u64) {
    let height = pixels.len() / width;
    for y in 0..height {
        for x in 0..width {
            pixels[y * width + x] = [0, 0, blue_at(y, frame)];
        }
    }
}

fn fill_rayon(pixels: &mut [[u8; 3]], width: usize, frame: u64) {
    pixels
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| row.fill([0, 0, blue_at(y, frame)]));
}

// Red and green were zeroed by the initialization pass and nothing else
// writes them.
fn fill_blue_only(pixels: &mut [[u8; 3]], width: usize, frame: u64) {
    for (y, row) in pixels.chunks_mut(width).enumerate() {
        let b = blue_at(y, frame);
        for px in row {
            px[2] = b;
        }
    }
}
