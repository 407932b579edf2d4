//! Point-wise color operations.
//!
//! Every function here maps one input pixel to one output pixel. Alpha passes
//! through unchanged unless a tint is configured with [`AlphaMode::Additive`].

use crate::core::buffer::PixelBuffer;
use crate::core::config::AlphaMode;
use crate::core::error::OperationError;
use crate::core::types::{clip, clip_settled, Color};
use crate::execution::executor::Band;
use crate::filters::operation::{Operation, Tint};
use crate::filters::registry::{Category, OperationMetadata, OperationRegistry};
use image::Rgba;
use palette::{encoding, Hsv, IntoColor, Srgb};

/// Register point-wise color operations.
pub fn register(registry: &mut OperationRegistry) {
    registry.register(
        OperationMetadata::new("brightness", "Brightness", Category::Color, "Scale every channel by a level")
            .parameter("level"),
        |request, _| Ok(Operation::Brightness { level: request.require_level()? }),
    );
    registry.register(
        OperationMetadata::new("contrast", "Contrast", Category::Color, "Stretch channels away from mid-grey")
            .parameter("level"),
        |request, _| Ok(Operation::Contrast { factor: request.require_level()? }),
    );
    registry.register(
        OperationMetadata::new("saturation", "Saturation", Category::Color, "Scale HSV saturation")
            .parameter("level"),
        |request, _| Ok(Operation::Saturation { level: request.require_level()? }),
    );
    registry.register(
        OperationMetadata::new("tint", "Tint", Category::Color, "Add a color, then scale saturation by intensity")
            .parameter("tint")
            .parameter("level"),
        |request, defaults| {
            let color = request
                .tint
                .ok_or_else(|| OperationError::missing(&request.kind, "tint"))?;
            let tint = Tint::new(color, request.require_level()?).with_alpha(defaults.tint_alpha);
            Ok(Operation::Tint(tint))
        },
    );
    registry.register(
        OperationMetadata::new("greyscale", "Greyscale", Category::Color, "Collapse to weighted luma"),
        |_, _| Ok(Operation::Greyscale),
    );
    registry.register(
        OperationMetadata::new("negative", "Negative", Category::Color, "Invert every color channel"),
        |_, _| Ok(Operation::Negative),
    );
    registry.register(
        OperationMetadata::new("sepia", "Sepia", Category::Color, "Apply the sepia color-mixing matrix"),
        |_, _| Ok(Operation::Sepia),
    );
}

/// Sepia color-mixing matrix, one row per output channel.
pub const SEPIA: [[f64; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Luma weights for greyscale conversion.
pub const LUMA: [f64; 3] = [0.299, 0.587, 0.114];

/// Apply `f` to every pixel of `band`, reading from the full `source`.
///
/// Stops early, leaving the remaining rows transparent, once the band is
/// cancelled. The executor discards cancelled output.
pub fn map_band<F>(source: &PixelBuffer, band: &Band, f: F) -> PixelBuffer
where
    F: Fn(Rgba<u8>) -> Rgba<u8>,
{
    let region = band.region();
    let mut output = PixelBuffer::with_region(region);

    for y in region.y..region.bottom() {
        if band.is_cancelled() {
            break;
        }
        for x in region.x..region.right() {
            output.set(x, y, f(source.get(x as i64, y as i64)));
        }
    }

    output
}

/// `channel * level`, clipped.
pub fn brightness(pixel: Rgba<u8>, level: f64) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let scale = |v: u8| clip(v as f64 * level);
    Rgba([scale(r), scale(g), scale(b), a])
}

/// `factor * (channel - 128) + 128`, clipped.
pub fn contrast(pixel: Rgba<u8>, factor: f64) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let adjust = |v: u8| clip(factor * (v as f64 - 128.0) + 128.0);
    Rgba([adjust(r), adjust(g), adjust(b), a])
}

/// Scale HSV saturation by `level`.
pub fn saturation(pixel: Rgba<u8>, level: f64) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let [r, g, b] = rescale_saturation([r, g, b], level);
    Rgba([r, g, b, a])
}

/// Add `color` to the pixel, then scale the sum's saturation by `intensity`.
pub fn tint(pixel: Rgba<u8>, color: Color, intensity: f64, alpha: AlphaMode) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let add = |v: u8, t: u8| clip(v as f64 + t as f64);
    let [r, g, b] = rescale_saturation([add(r, color.r), add(g, color.g), add(b, color.b)], intensity);

    let a = match alpha {
        AlphaMode::Preserve => a,
        AlphaMode::Additive => add(a, color.a),
    };
    Rgba([r, g, b, a])
}

/// Weighted luma replicated to all three color channels.
pub fn greyscale(pixel: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let grey = clip(LUMA[0] * r as f64 + LUMA[1] * g as f64 + LUMA[2] * b as f64);
    Rgba([grey, grey, grey, a])
}

/// `255 - channel`.
pub fn negative(pixel: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    Rgba([255 - r, 255 - g, 255 - b, a])
}

/// Mix channels through [`SEPIA`], clipping each independently.
pub fn sepia(pixel: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let rgb = [r as f64, g as f64, b as f64];
    let mix = |row: &[f64; 3]| clip(row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2]);
    Rgba([mix(&SEPIA[0]), mix(&SEPIA[1]), mix(&SEPIA[2]), a])
}

/// Round-trip through HSV with the saturation scaled in the 0-255 domain.
///
/// Saturation is quantised to 8 bits before and after scaling, so the result
/// stays in `[0, 1]` for any `level`. Channels are truncated on the way back.
fn rescale_saturation([r, g, b]: [u8; 3], level: f64) -> [u8; 3] {
    let rgb: Srgb<f64> = Srgb::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let mut hsv: Hsv<encoding::Srgb, f64> = rgb.into_color();

    let saturation = clip(hsv.saturation * 255.0);
    let scaled = clip(saturation as f64 * level);
    hsv.saturation = scaled as f64 / 255.0;

    let out: Srgb<f64> = hsv.into_color();
    [to_channel(out.red), to_channel(out.green), to_channel(out.blue)]
}

#[inline]
fn to_channel(value: f64) -> u8 {
    clip_settled(value * 255.0)
}
