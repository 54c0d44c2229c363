//! Hex ↔ normalized RGB conversion.
//!
//! Lottie stores colors as `[r, g, b]` fractions. Host code speaks `#rrggbb`.
//! Both directions round, so a round trip may drift by one unit per channel.

use serde::{Deserialize, Serialize};

pub type NormalizedRgb = [f64; 3];

/// A color with 0..=255 channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

fn to_unit(n: f64) -> f64 {
    ((n / 255.0) * 1000.0).round() / 1000.0
}

fn from_unit(n: f64) -> u8 {
    (n * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Input is not validated: parsing stops at the first non-hex digit and an
/// empty prefix decodes as black.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let data = digits
        .chars()
        .map_while(|c| c.to_digit(16))
        .fold(0u32, |acc, d| acc.wrapping_mul(16).wrapping_add(d));
    Rgb {
        r: ((data >> 16) & 255) as f64,
        g: ((data >> 8) & 255) as f64,
        b: (data & 255) as f64,
    }
}

pub fn rgb_to_normalized(rgb: Rgb) -> NormalizedRgb {
    [to_unit(rgb.r), to_unit(rgb.g), to_unit(rgb.b)]
}

pub fn to_normalized_triple(hex: &str) -> NormalizedRgb {
    rgb_to_normalized(hex_to_rgb(hex))
}

pub fn to_hex(color: NormalizedRgb) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        from_unit(color[0]),
        from_unit(color[1]),
        from_unit(color[2])
    )
}
