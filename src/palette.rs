// src/palette.rs

//! The 256-entry fire palette.
//!
//! Index `x` is a heat bucket. Hue grows from red towards yellow (`x / 3`
//! degrees) while lightness ramps from black to white over the first half of
//! the table, so everything from index 128 up is white.

use crate::color::Rgb;
use once_cell::sync::Lazy;
use std::ops::Index;
use std::sync::Arc;

/// Number of entries in a palette.
pub const PALETTE_SIZE: usize = 256;

/// Fire palette, built on first use and shared read-only afterwards.
pub static FIRE_PALETTE: Lazy<Arc<Palette>> = Lazy::new(|| Arc::new(build_fire_palette()));

/// An ordered table of 256 RGB triples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [Rgb; PALETTE_SIZE],
}

impl Palette {
    pub fn entries(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.entries
    }
}

impl Index<u8> for Palette {
    type Output = Rgb;

    fn index(&self, idx: u8) -> &Rgb {
        &self.entries[idx as usize]
    }
}

/// Builds the fire palette.
pub fn build_fire_palette() -> Palette {
    let mut entries = [Rgb::BLACK; PALETTE_SIZE];
    for (x, entry) in entries.iter_mut().enumerate() {
        let hue = (x / 3) as f64;
        let lightness = (x * 2).min(256) as f64 / 256.0 * 100.0;
        *entry = Rgb::from_hsl(hue, 100.0, lightness);
    }
    Palette { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn has_256_entries_with_distinct_ends() {
        let palette = build_fire_palette();
        assert_eq!(palette.entries().len(), 256);
        assert_eq!(palette[0], Rgb::BLACK);
        assert_eq!(palette[255], Rgb(255, 255, 255));
        assert_ne!(palette[0], palette[255]);
    }

    #[test_log::test]
    fn is_deterministic() {
        assert_eq!(build_fire_palette(), build_fire_palette());
        assert_eq!(**FIRE_PALETTE, build_fire_palette());
    }

    #[test_log::test]
    fn half_lightness_entry_is_orange() {
        // x = 64: hue 21 degrees, lightness 50%
        assert_eq!(build_fire_palette()[64], Rgb(255, 89, 0));
    }

    #[test_log::test]
    fn upper_half_is_saturated_white() {
        let palette = build_fire_palette();
        assert!(palette.entries()[128..].iter().all(|c| *c == Rgb(255, 255, 255)));
    }

    #[test_log::test]
    fn dark_entries_are_red_dominant() {
        let palette = build_fire_palette();
        for x in 1..64u8 {
            let Rgb(r, g, b) = palette[x];
            assert!(r >= g && g >= b, "entry {x}: {:?}", palette[x]);
        }
    }
}
