//! Geometric whole-image transforms.
//!
//! These remap coordinates across the whole image and are never tiled. Outputs
//! are anchored at the origin.

use crate::core::buffer::PixelBuffer;
use crate::filters::operation::Operation;
use crate::filters::registry::{Category, OperationMetadata, OperationRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Register mirror and rotate.
pub fn register(registry: &mut OperationRegistry) {
    for (id, name, axis) in [
        ("mirror_vertical", "Mirror Vertical", MirrorAxis::Vertical),
        ("mirror_horizontal", "Mirror Horizontal", MirrorAxis::Horizontal),
    ] {
        registry.register(
            OperationMetadata::new(id, name, Category::Geometric, &format!("Reflect across the {} axis", axis)),
            move |_, _| Ok(Operation::Mirror(axis)),
        );
    }

    for angle in [RotationAngle::Deg90, RotationAngle::Deg180, RotationAngle::Deg270] {
        let id = format!("rotate_{}", angle);
        let name = format!("Rotate {}", angle);
        let description = format!("Rotate {} degrees clockwise", angle);
        registry.register(
            OperationMetadata::new(&id, &name, Category::Geometric, &description),
            move |_, _| Ok(Operation::Rotate(angle)),
        );
    }
}

/// Axis a mirror reflects across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorAxis {
    /// Reflect across the vertical axis, swapping left and right.
    Vertical,
    /// Reflect across the horizontal axis, swapping top and bottom.
    Horizontal,
}

impl fmt::Display for MirrorAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorAxis::Vertical => f.write_str("vertical"),
            MirrorAxis::Horizontal => f.write_str("horizontal"),
        }
    }
}

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationAngle {
    /// A quarter turn.
    #[serde(rename = "90")]
    Deg90,
    /// A half turn.
    #[serde(rename = "180")]
    Deg180,
    /// Three quarter turns.
    #[serde(rename = "270")]
    Deg270,
}

impl RotationAngle {
    /// Parse a whole-degree angle.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            90 => Some(RotationAngle::Deg90),
            180 => Some(RotationAngle::Deg180),
            270 => Some(RotationAngle::Deg270),
            _ => None,
        }
    }

    /// The angle in degrees.
    pub fn degrees(&self) -> u32 {
        match self {
            RotationAngle::Deg90 => 90,
            RotationAngle::Deg180 => 180,
            RotationAngle::Deg270 => 270,
        }
    }
}

impl fmt::Display for RotationAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

/// Reflect `source` across `axis`.
///
/// Vertical: `out(x, y) = in(width - 1 - x, y)`.
/// Horizontal: `out(x, y) = in(x, height - 1 - y)`.
pub fn mirror(source: &PixelBuffer, axis: MirrorAxis) -> PixelBuffer {
    let region = source.region();
    let (ox, oy) = (region.x as i64, region.y as i64);
    let (last_x, last_y) = (region.width as i64 - 1, region.height as i64 - 1);

    PixelBuffer::from_fn(region.width, region.height, |x, y| {
        let (x, y) = (x as i64, y as i64);
        match axis {
            MirrorAxis::Vertical => source.get(ox + last_x - x, oy + y),
            MirrorAxis::Horizontal => source.get(ox + x, oy + last_y - y),
        }
    })
}

/// Swap rows and columns: `out(x, y) = in(y, x)`.
pub fn transpose(source: &PixelBuffer) -> PixelBuffer {
    let region = source.region();
    let (ox, oy) = (region.x as i64, region.y as i64);

    PixelBuffer::from_fn(region.height, region.width, |x, y| {
        source.get(ox + y as i64, oy + x as i64)
    })
}

/// Rotate `source` clockwise.
///
/// 90 is a transpose followed by a vertical mirror, 180 mirrors both axes and
/// 270 applies 90 then 180.
pub fn rotate(source: &PixelBuffer, angle: RotationAngle) -> PixelBuffer {
    match angle {
        RotationAngle::Deg90 => mirror(&transpose(source), MirrorAxis::Vertical),
        RotationAngle::Deg180 => mirror(&mirror(source, MirrorAxis::Horizontal), MirrorAxis::Vertical),
        RotationAngle::Deg270 => rotate(&rotate(source, RotationAngle::Deg90), RotationAngle::Deg180),
    }
}
