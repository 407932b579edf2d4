//! The closed set of image operations.
//!
//! An [`Operation`] is a pure function from one [`PixelBuffer`] to a freshly
//! allocated one. Point-wise and kernel variants are tileable and run on the
//! [`TiledExecutor`]; mirror and rotate remap the whole image directly.

use crate::core::buffer::PixelBuffer;
use crate::core::config::AlphaMode;
use crate::core::error::{ExecutionResult, OperationResult};
use crate::core::kernel::{Kernel, KernelKind};
use crate::core::types::Color;
use crate::execution::executor::{Band, TiledExecutor};
use crate::filters::builtin::{color, convolution, transform};
use image::Rgba;
use std::fmt;
use std::sync::Arc;

pub use crate::filters::builtin::transform::{MirrorAxis, RotationAngle};

/// Tint parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    /// Color added to every pixel.
    pub color: Color,
    /// Saturation scale applied after the addition.
    pub intensity: f64,
    /// Alpha handling.
    pub alpha: AlphaMode,
}

impl Tint {
    /// Create a tint that preserves alpha.
    pub fn new(color: Color, intensity: f64) -> Self {
        Self {
            color,
            intensity,
            alpha: AlphaMode::Preserve,
        }
    }

    /// Set the alpha handling.
    pub fn with_alpha(mut self, alpha: AlphaMode) -> Self {
        self.alpha = alpha;
        self
    }
}

/// An image operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Multiply every channel by `level`.
    Brightness { level: f64 },
    /// Scale channel distance from 128 by `factor`.
    Contrast { factor: f64 },
    /// Scale HSV saturation by `level`.
    Saturation { level: f64 },
    /// Add a color, then rescale saturation.
    Tint(Tint),
    Greyscale,
    Negative,
    Sepia,
    /// Convolve with a generated kernel.
    Kernel(Arc<Kernel>),
    Mirror(MirrorAxis),
    /// Rotate clockwise; swaps dimensions for quarter turns.
    Rotate(RotationAngle),
}

impl Operation {
    /// Build a convolution operation, generating its kernel.
    pub fn kernel(kind: KernelKind, size: u32) -> OperationResult<Self> {
        Ok(Operation::Kernel(Arc::new(Kernel::generate(kind, size)?)))
    }

    /// Stable identifier, matching the registry's request types.
    pub fn id(&self) -> &'static str {
        match self {
            Operation::Brightness { .. } => "brightness",
            Operation::Contrast { .. } => "contrast",
            Operation::Saturation { .. } => "saturation",
            Operation::Tint(_) => "tint",
            Operation::Greyscale => "greyscale",
            Operation::Negative => "negative",
            Operation::Sepia => "sepia",
            Operation::Kernel(kernel) => kernel.kind().id(),
            Operation::Mirror(MirrorAxis::Vertical) => "mirror_vertical",
            Operation::Mirror(MirrorAxis::Horizontal) => "mirror_horizontal",
            Operation::Rotate(RotationAngle::Deg90) => "rotate_90",
            Operation::Rotate(RotationAngle::Deg180) => "rotate_180",
            Operation::Rotate(RotationAngle::Deg270) => "rotate_270",
        }
    }

    /// Whether the operation can be computed band by band.
    pub fn is_tileable(&self) -> bool {
        !matches!(self, Operation::Mirror(_) | Operation::Rotate(_))
    }

    /// Evaluate a point-wise variant on one pixel.
    ///
    /// Kernel and geometric variants depend on more than one pixel and return
    /// the input unchanged.
    pub fn map_pixel(&self, pixel: Rgba<u8>) -> Rgba<u8> {
        match self {
            Operation::Brightness { level } => color::brightness(pixel, *level),
            Operation::Contrast { factor } => color::contrast(pixel, *factor),
            Operation::Saturation { level } => color::saturation(pixel, *level),
            Operation::Tint(tint) => color::tint(pixel, tint.color, tint.intensity, tint.alpha),
            Operation::Greyscale => color::greyscale(pixel),
            Operation::Negative => color::negative(pixel),
            Operation::Sepia => color::sepia(pixel),
            Operation::Kernel(_) | Operation::Mirror(_) | Operation::Rotate(_) => pixel,
        }
    }

    /// Apply the operation, tiling it on `executor` where possible.
    ///
    /// Only tiled execution can fail, with the executor's error.
    pub fn apply(&self, input: &Arc<PixelBuffer>, executor: &TiledExecutor) -> ExecutionResult<PixelBuffer> {
        match self {
            Operation::Mirror(axis) => Ok(transform::mirror(input, *axis)),
            Operation::Rotate(angle) => Ok(transform::rotate(input, *angle)),
            Operation::Kernel(kernel) => {
                let kernel = Arc::clone(kernel);
                executor.run(Arc::clone(input), move |source, band| {
                    convolution::convolve(source, band, &kernel)
                })
            }
            _ => {
                let operation = self.clone();
                executor.run(Arc::clone(input), move |source, band| {
                    color::map_band(source, band, |pixel| operation.map_pixel(pixel))
                })
            }
        }
    }

    /// Apply the operation single-threaded over the whole buffer.
    pub fn apply_direct(&self, input: &PixelBuffer) -> PixelBuffer {
        let whole = Band::standalone(input.region());
        match self {
            Operation::Mirror(axis) => transform::mirror(input, *axis),
            Operation::Rotate(angle) => transform::rotate(input, *angle),
            Operation::Kernel(kernel) => convolution::convolve(input, &whole, kernel),
            _ => color::map_band(input, &whole, |pixel| self.map_pixel(pixel)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Brightness { level } | Operation::Saturation { level } => {
                write!(f, "{}({})", self.id(), level)
            }
            Operation::Contrast { factor } => write!(f, "{}({})", self.id(), factor),
            Operation::Tint(tint) => write!(f, "tint({}, {})", tint.color, tint.intensity),
            Operation::Kernel(kernel) => write!(f, "{}({})", self.id(), kernel.size()),
            _ => f.write_str(self.id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ExecutorConfig;
    use crate::core::error::OperationError;
    use proptest::prelude::*;

    fn executor(bands: usize) -> TiledExecutor {
        TiledExecutor::with_config(ExecutorConfig::new().with_bands(bands))
    }

    fn catalog() -> Vec<Operation> {
        let mut operations = vec![
            Operation::Brightness { level: 1.3 },
            Operation::Contrast { factor: 0.7 },
            Operation::Saturation { level: 1.8 },
            Operation::Tint(Tint::new(Color::new(20, 0, 40, 10), 0.6)),
            Operation::Greyscale,
            Operation::Negative,
            Operation::Sepia,
        ];
        for kind in KernelKind::ALL {
            operations.push(Operation::kernel(kind, 3).unwrap());
        }
        operations.push(Operation::kernel(KernelKind::GaussianBlur, 5).unwrap());
        operations
    }

    fn buffer_strategy() -> impl Strategy<Value = PixelBuffer> {
        (1u32..12, 1u32..12).prop_flat_map(|(w, h)| {
            prop::collection::vec(any::<u8>(), (w * h * 4) as usize).prop_map(move |data| {
                PixelBuffer::from_fn(w, h, |x, y| {
                    let i = ((y * w + x) * 4) as usize;
                    Rgba([data[i], data[i + 1], data[i + 2], data[i + 3]])
                })
            })
        })
    }

    #[test]
    fn test_ids_and_display() {
        assert_eq!(Operation::Rotate(RotationAngle::Deg270).id(), "rotate_270");
        assert_eq!(Operation::kernel(KernelKind::VerticalEdge, 3).unwrap().id(), "edges_vertical");
        assert_eq!(Operation::Brightness { level: 1.5 }.to_string(), "brightness(1.5)");
        assert_eq!(Operation::kernel(KernelKind::Emboss, 5).unwrap().to_string(), "emboss(5)");
    }

    #[test]
    fn test_tileability() {
        assert!(Operation::Sepia.is_tileable());
        assert!(Operation::kernel(KernelKind::BoxBlur, 3).unwrap().is_tileable());
        assert!(!Operation::Mirror(MirrorAxis::Vertical).is_tileable());
        assert!(!Operation::Rotate(RotationAngle::Deg90).is_tileable());
    }

    #[test]
    fn test_unsupported_kernel_size() {
        let err = Operation::kernel(KernelKind::Sharpen, 4).unwrap_err();
        assert!(matches!(err, OperationError::UnsupportedKernel { size: 4, .. }));
    }

    #[test]
    fn test_apply_allocates_fresh_output() {
        let input = Arc::new(PixelBuffer::filled(4, 4, Rgba([10, 20, 30, 255])));
        let output = Operation::Negative.apply(&input, &executor(2)).unwrap();
        assert_eq!(output.get(0, 0), Rgba([245, 235, 225, 255]));
        assert_eq!(input.get(0, 0), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let input = Arc::new(PixelBuffer::new(5, 2));
        let output = Operation::Rotate(RotationAngle::Deg90).apply(&input, &executor(1)).unwrap();
        assert_eq!((output.width(), output.height()), (2, 5));
    }

    #[test]
    fn test_tiled_matches_direct_for_catalog() {
        let input = Arc::new(PixelBuffer::from_fn(17, 23, |x, y| {
            Rgba([(x * 15) as u8, (y * 11) as u8, ((x + y) * 7) as u8, (200 + x) as u8])
        }));
        for operation in catalog() {
            let reference = operation.apply_direct(&input);
            for bands in [1, 2, 5, 23, 40] {
                let tiled = operation.apply(&input, &executor(bands)).unwrap();
                assert_eq!(tiled, reference, "{} with {} band(s)", operation, bands);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_tiled_equals_reference(buffer in buffer_strategy(), bands in 1usize..16, pick in 0usize..16) {
            let operations = catalog();
            let operation = &operations[pick % operations.len()];
            let input = Arc::new(buffer);
            let tiled = operation.apply(&input, &executor(bands)).unwrap();
            prop_assert_eq!(tiled, operation.apply_direct(&input));
        }

        #[test]
        fn prop_negative_is_involution(buffer in buffer_strategy()) {
            let twice = Operation::Negative.apply_direct(&Operation::Negative.apply_direct(&buffer));
            prop_assert_eq!(twice, buffer);
        }

        #[test]
        fn prop_four_quarter_turns_are_identity(buffer in buffer_strategy()) {
            let rotate = Operation::Rotate(RotationAngle::Deg90);
            let mut output = buffer.clone();
            for _ in 0..4 {
                output = rotate.apply_direct(&output);
            }
            prop_assert_eq!(output, buffer);
        }

        #[test]
        fn prop_mirror_is_involution(buffer in buffer_strategy(), vertical in any::<bool>()) {
            let axis = if vertical { MirrorAxis::Vertical } else { MirrorAxis::Horizontal };
            let mirror = Operation::Mirror(axis);
            prop_assert_eq!(mirror.apply_direct(&mirror.apply_direct(&buffer)), buffer);
        }
    }
}
