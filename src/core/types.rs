//! Core value types shared by buffers, operations and requests.

use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGBA color value as it appears in operation requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default)]
    pub a: u8,
}

/// The color read from outside a buffer's bounds.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

impl Color {
    /// Create a new color from RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from RGB components (alpha = 255).
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Format as "#RRGGBBAA".
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba([color.r, color.g, color.b, color.a])
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self { r, g, b, a }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Clamp a computed channel value to [0, 255] and truncate it.
///
/// Every arithmetic result is stored through this function.
#[inline]
pub fn clip(value: f64) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Slack added before truncating a value carried through float weights or a
/// color-space round trip.
///
/// Such values can land a hair below the integer they represent, e.g. 25 reads
/// of 90 at a 5x5 box weight of `0.04f32` sum to `89.999998`. The slack is far
/// below any real fractional part of an 8-bit result.
pub const CLIP_EPSILON: f64 = 1e-4;

/// [`clip`] after absorbing float representation error with [`CLIP_EPSILON`].
#[inline]
pub fn clip_settled(value: f64) -> u8 {
    clip(value + CLIP_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        assert_eq!(clip(-3.0), 0);
        assert_eq!(clip(300.0), 255);
        assert_eq!(clip(127.9), 127);
        assert_eq!(clip(f64::NAN), 0);
    }

    #[test]
    fn test_clip_settled_absorbs_float_noise_only() {
        assert_eq!(clip_settled(89.999998), 90);
        assert_eq!(clip_settled(10.5555), 10);
        assert_eq!(clip_settled(254.99999), 255);
        assert_eq!(clip_settled(300.0), 255);
        assert_eq!(clip_settled(-0.00001), 0);
    }

    #[test]
    fn test_color_rgba_conversion() {
        let color = Color::new(1, 2, 3, 4);
        let pixel: Rgba<u8> = color.into();
        assert_eq!(pixel, Rgba([1, 2, 3, 4]));
        assert_eq!(Color::from(pixel), color);
        assert_eq!(color.to_hex(), "#01020304");
    }

    #[test]
    fn test_color_deserialize_without_alpha() {
        let color: Color = serde_json::from_str(r#"{"r":10,"g":20,"b":30}"#).unwrap();
        assert_eq!(color, Color::new(10, 20, 30, 0));
    }
}
