// src/raster.rs

//! Raster buffers written by kernels and the displayable images built from them.
//!
//! A [`Raster`] is the producer's private, mutable working buffer. An
//! [`Image`] is an immutable snapshot of a raster taken after a kernel pass;
//! it owns its own pixel storage, so the producer can keep mutating the
//! raster while earlier images are still queued or on screen.

use crate::color::Rgb;
use crate::palette::Palette;
use anyhow::{bail, ensure, Result};
use std::sync::Arc;

/// How a raster stores its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Three 8-bit channels per pixel.
    Direct,
    /// One 8-bit palette index per pixel.
    Indexed,
}

/// Pixel storage, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterData {
    Direct(Vec<[u8; 3]>),
    Indexed(Vec<u8>),
}

/// A `width × height` pixel buffer with fixed dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: RasterData,
}

impl Raster {
    /// Allocates a zeroed raster.
    pub fn new(mode: ColorMode, width: usize, height: usize) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "raster dimensions must be non-zero (got {}x{})",
            width,
            height
        );
        let len = width
            .checked_mul(height)
            .ok_or_else(|| anyhow::anyhow!("raster {}x{} overflows", width, height))?;
        let data = match mode {
            ColorMode::Direct => RasterData::Direct(vec![[0; 3]; len]),
            ColorMode::Indexed => RasterData::Indexed(vec![0; len]),
        };
        Ok(Raster {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mode(&self) -> ColorMode {
        match self.data {
            RasterData::Direct(_) => ColorMode::Direct,
            RasterData::Indexed(_) => ColorMode::Indexed,
        }
    }

    pub fn data(&self) -> &RasterData {
        &self.data
    }

    /// Direct-color pixels, or an error if this raster is indexed.
    pub fn direct_mut(&mut self) -> Result<&mut [[u8; 3]]> {
        match &mut self.data {
            RasterData::Direct(px) => Ok(px.as_mut_slice()),
            RasterData::Indexed(_) => bail!("expected a direct-color raster, got an indexed one"),
        }
    }

    /// Palette indices, or an error if this raster is direct-color.
    pub fn indexed_mut(&mut self) -> Result<&mut [u8]> {
        match &mut self.data {
            RasterData::Indexed(px) => Ok(px.as_mut_slice()),
            RasterData::Direct(_) => bail!("expected an indexed raster, got a direct-color one"),
        }
    }

    /// Direct-color pixel at `(x, y)`; `None` when out of range or indexed.
    pub fn direct_at(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        match &self.data {
            RasterData::Direct(px) if x < self.width && y < self.height => {
                Some(px[y * self.width + x])
            }
            _ => None,
        }
    }

    /// Palette index at `(x, y)`; `None` when out of range or direct-color.
    pub fn index_at(&self, x: usize, y: usize) -> Option<u8> {
        match &self.data {
            RasterData::Indexed(px) if x < self.width && y < self.height => {
                Some(px[y * self.width + x])
            }
            _ => None,
        }
    }
}

/// Pixels of a displayable image.
#[derive(Debug, Clone)]
pub enum ImagePixels {
    /// Packed RGB, three bytes per pixel.
    Rgb(Box<[u8]>),
    /// Palette indices with the palette attached.
    Indexed {
        indices: Box<[u8]>,
        palette: Arc<Palette>,
    },
}

/// An immutable, presentation-ready snapshot of a raster.
#[derive(Debug, Clone)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: ImagePixels,
}

impl Image {
    /// Copies `raster` into a new image. Indexed rasters require a palette.
    pub fn from_raster(raster: &Raster, palette: Option<&Arc<Palette>>) -> Result<Self> {
        let pixels = match (raster.data(), palette) {
            (RasterData::Direct(px), _) => {
                let packed: Vec<u8> = px.iter().flatten().copied().collect();
                ImagePixels::Rgb(packed.into_boxed_slice())
            }
            (RasterData::Indexed(px), Some(palette)) => ImagePixels::Indexed {
                indices: px.clone().into_boxed_slice(),
                palette: Arc::clone(palette),
            },
            (RasterData::Indexed(_), None) => {
                bail!("indexed raster cannot be converted without a palette")
            }
        };
        Ok(Image {
            width: raster.width(),
            height: raster.height(),
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &ImagePixels {
        &self.pixels
    }

    /// Resolved color at `(x, y)`, or `None` when out of range.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y * self.width + x;
        Some(match &self.pixels {
            ImagePixels::Rgb(bytes) => Rgb(bytes[i * 3], bytes[i * 3 + 1], bytes[i * 3 + 2]),
            ImagePixels::Indexed { indices, palette } => palette[indices[i]],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::FIRE_PALETTE;

    #[test_log::test]
    fn allocates_exactly_width_by_height() {
        let raster = Raster::new(ColorMode::Direct, 500, 700).unwrap();
        match raster.data() {
            RasterData::Direct(px) => assert_eq!(px.len(), 500 * 700),
            RasterData::Indexed(_) => panic!("expected direct storage"),
        }
        let raster = Raster::new(ColorMode::Indexed, 2048, 500).unwrap();
        assert_eq!(raster.mode(), ColorMode::Indexed);
        assert_eq!(raster.index_at(2047, 499), Some(0));
        assert_eq!(raster.index_at(2048, 0), None);
    }

    #[test_log::test]
    fn rejects_empty_dimensions() {
        assert!(Raster::new(ColorMode::Indexed, 0, 10).is_err());
    }

    #[test_log::test]
    fn mode_mismatch_is_an_error() {
        let mut raster = Raster::new(ColorMode::Indexed, 4, 4).unwrap();
        assert!(raster.direct_mut().is_err());
        assert!(raster.indexed_mut().is_ok());
    }

    #[test_log::test]
    fn image_is_a_snapshot_not_a_view() {
        let mut raster = Raster::new(ColorMode::Direct, 3, 2).unwrap();
        raster.direct_mut().unwrap()[4] = [1, 2, 3];
        let image = Image::from_raster(&raster, None).unwrap();

        raster.direct_mut().unwrap()[4] = [9, 9, 9];

        assert_eq!(image.pixel(1, 1), Some(Rgb(1, 2, 3)));
        assert_eq!(image.pixel(3, 0), None);
    }

    #[test_log::test]
    fn indexed_image_resolves_through_palette() {
        let mut raster = Raster::new(ColorMode::Indexed, 2, 2).unwrap();
        raster.indexed_mut().unwrap()[3] = 255;
        let image = Image::from_raster(&raster, Some(&*FIRE_PALETTE)).unwrap();
        assert_eq!(image.pixel(1, 1), Some(Rgb(255, 255, 255)));
        assert_eq!(image.pixel(0, 0), Some(Rgb::BLACK));
    }

    #[test_log::test]
    fn indexed_image_without_palette_fails() {
        let raster = Raster::new(ColorMode::Indexed, 2, 2).unwrap();
        assert!(Image::from_raster(&raster, None).is_err());
    }
}
