// src/kernel/fire.rs
//! Diffusion fire kernel.
//!
//! Each frame:
//! 1. Ignition: every cell of the bottom row gets a fresh uniform value in
//!    `[0, 2048)`.
//! 2. Diffusion: rows `1..height-2` are rewritten top-down from the three
//!    cells below them and the cell two rows down, scaled by `32/129`.
//!    Columns wrap around; row indices are taken modulo `height`.
//! 3. Quantization: `grid % 256` becomes the palette index of each pixel.
//!
//! Rows 0 and `height-2` are never written by diffusion. The bottom row only
//! changes through ignition.

use super::Kernel;
use crate::config::Accelerator;
use crate::palette::{Palette, FIRE_PALETTE};
use crate::raster::{ColorMode, Raster};
use anyhow::{ensure, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::Arc;

/// Exclusive upper bound of an ignition value.
pub const IGNITION_LIMIT: u32 = 2048;

const DIFFUSION_NUMERATOR: u32 = 32;
const DIFFUSION_DENOMINATOR: u32 = 129;

/// Per-cell heat energy, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeatGrid {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl HeatGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[u32] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u32] {
        &mut self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}

/// Stateful fire kernel. Owns the heat grid and the ignition RNG.
pub struct FireKernel {
    accelerator: Accelerator,
    grid: HeatGrid,
    // Previous-generation copy used by the parallel diffusion.
    scratch: Vec<u32>,
    rng: StdRng,
    palette: Arc<Palette>,
}

impl FireKernel {
    pub fn new(accelerator: Accelerator, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            accelerator,
            grid: HeatGrid::default(),
            scratch: Vec::new(),
            rng,
            palette: Arc::clone(&*FIRE_PALETTE),
        }
    }

    pub fn grid(&self) -> &HeatGrid {
        &self.grid
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut HeatGrid {
        &mut self.grid
    }

    /// Fills the bottom row with fresh random heat.
    pub fn ignite(&mut self) {
        let Some(bottom) = self.grid.height.checked_sub(1) else {
            return;
        };
        let rng = &mut self.rng;
        for cell in self.grid.row_mut(bottom) {
            *cell = rng.random_range(0..IGNITION_LIMIT);
        }
    }

    /// Runs one diffusion pass with the configured accelerator.
    pub fn diffuse(&mut self) {
        match self.accelerator {
            Accelerator::Rayon => diffuse_rayon(&mut self.grid, &mut self.scratch),
            Accelerator::Scalar | Accelerator::Prefill => diffuse_scalar(&mut self.grid),
        }
    }

    /// Writes `grid % 256` into `indices`.
    pub fn quantize(&self, indices: &mut [u8]) {
        match self.accelerator {
            Accelerator::Rayon => indices
                .par_iter_mut()
                .zip(self.grid.cells.par_iter())
                .for_each(|(out, heat)| *out = (heat % 256) as u8),
            Accelerator::Scalar | Accelerator::Prefill => {
                for (out, heat) in indices.iter_mut().zip(self.grid.cells.iter()) {
                    *out = (heat % 256) as u8;
                }
            }
        }
    }
}

impl Kernel for FireKernel {
    fn name(&self) -> &'static str {
        "fire"
    }

    fn color_mode(&self) -> ColorMode {
        ColorMode::Indexed
    }

    fn prepare(&mut self, width: usize, height: usize) -> Result<()> {
        ensure!(
            width > 0 && height > 0,
            "heat grid dimensions must be non-zero (got {}x{})",
            width,
            height
        );
        debug!("FireKernel: allocating {}x{} heat grid", width, height);
        self.grid = HeatGrid::new(width, height);
        self.scratch = vec![0; width * height];
        Ok(())
    }

    fn advance(&mut self, raster: &mut Raster, _frame: u64) -> Result<()> {
        ensure!(
            raster.width() == self.grid.width && raster.height() == self.grid.height,
            "heat grid is {}x{} but raster is {}x{}",
            self.grid.width,
            self.grid.height,
            raster.width(),
            raster.height()
        );
        self.ignite();
        self.diffuse();
        self.quantize(raster.indexed_mut()?);
        Ok(())
    }

    fn palette(&self) -> Option<Arc<Palette>> {
        Some(Arc::clone(&self.palette))
    }
}

#[inline]
fn diffused(sources: &[u32], width: usize, height: usize, x: usize, y: usize) -> u32 {
    let below = ((y + 1) % height) * width;
    let below2 = ((y + 2) % height) * width;
    let left = (x + width - 1) % width;
    let right = (x + 1) % width;
    let sum = sources[below + x]
        + sources[below + left]
        + sources[below + right]
        + sources[below2 + x];
    sum * DIFFUSION_NUMERATOR / DIFFUSION_DENOMINATOR
}

/// In-place top-down pass. Row `y` only reads rows below it, which this pass
/// has not written yet, so every row sees the previous generation.
pub fn diffuse_scalar(grid: &mut HeatGrid) {
    let (width, height) = (grid.width, grid.height);
    for y in 1..height.saturating_sub(2) {
        for x in 0..width {
            let v = diffused(&grid.cells, width, height, x, y);
            grid.cells[y * width + x] = v;
        }
    }
}

/// Row-parallel pass reading from a snapshot of the previous generation.
pub fn diffuse_rayon(grid: &mut HeatGrid, scratch: &mut Vec<u32>) {
    let (width, height) = (grid.width, grid.height);
    let end = height.saturating_sub(2);
    if end <= 1 {
        return;
    }
    scratch.clear();
    scratch.extend_from_slice(&grid.cells);
    let previous: &[u32] = scratch;

    grid.cells[width..end * width]
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(i, row)| {
            let y = i + 1;
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = diffused(previous, width, height, x, y);
            }
        });
}
