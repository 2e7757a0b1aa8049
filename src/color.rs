// src/color.rs

//! RGB triples and the HSL to RGB transform used to build palettes.

use serde::{Deserialize, Serialize};

/// An 8-bit per channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Converts a hue/saturation/lightness color to RGB.
    ///
    /// `hue` is in degrees, `saturation` and `lightness` in percent. Channels
    /// are rounded half-up, matching the usual CSS `hsl()` resolution.
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Rgb {
        let h = hue / 360.0;
        let s = saturation / 100.0;
        let l = lightness / 100.0;

        if s == 0.0 {
            let v = to_channel(l);
            return Rgb(v, v, v);
        }

        let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let m1 = 2.0 * l - m2;

        Rgb(
            to_channel(hue_to_component(m1, m2, h + 1.0 / 3.0)),
            to_channel(hue_to_component(m1, m2, h)),
            to_channel(hue_to_component(m1, m2, h - 1.0 / 3.0)),
        )
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.0, c.1, c.2]
    }
}

fn hue_to_component(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

fn to_channel(v: f64) -> u8 {
    // Truncation after +0.5 is round-half-up for non-negative values.
    (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lightness_extremes_are_black_and_white() {
        assert_eq!(Rgb::from_hsl(40.0, 100.0, 0.0), Rgb::BLACK);
        assert_eq!(Rgb::from_hsl(85.0, 100.0, 100.0), Rgb(255, 255, 255));
    }

    #[test]
    fn primary_hues_at_half_lightness() {
        assert_eq!(Rgb::from_hsl(0.0, 100.0, 50.0), Rgb(255, 0, 0));
        assert_eq!(Rgb::from_hsl(120.0, 100.0, 50.0), Rgb(0, 255, 0));
        assert_eq!(Rgb::from_hsl(240.0, 100.0, 50.0), Rgb(0, 0, 255));
    }

    #[test]
    fn zero_saturation_is_gray() {
        assert_eq!(Rgb::from_hsl(200.0, 0.0, 50.0), Rgb(128, 128, 128));
    }
}
