//! Kernel convolution.

use crate::core::buffer::PixelBuffer;
use crate::core::kernel::{Kernel, KernelKind};
use crate::core::types::clip_settled;
use crate::execution::executor::Band;
use crate::filters::operation::Operation;
use crate::filters::registry::{Category, OperationMetadata, OperationRegistry};
use image::Rgba;

/// Register one convolution type per kernel kind.
pub fn register(registry: &mut OperationRegistry) {
    for kind in KernelKind::ALL {
        let description = format!("Convolve with a {} kernel", kind.display_name().to_lowercase());
        registry.register(
            OperationMetadata::new(kind.id(), kind.display_name(), Category::Convolution, &description)
                .parameter("kernelSize"),
            move |request, defaults| {
                Operation::kernel(kind, request.kernel_size.unwrap_or(defaults.kernel_size))
            },
        );
    }
}

/// Convolve the RGB channels of `band` with `kernel`.
///
/// Neighbors are read from the full `source`, so rows owned by other bands
/// contribute and no seams appear between bands. Reads beyond the image edge
/// are transparent black, which acts as zero padding. Alpha is copied from the
/// centre pixel.
pub fn convolve(source: &PixelBuffer, band: &Band, kernel: &Kernel) -> PixelBuffer {
    let region = band.region();
    let size = kernel.size();
    let c = kernel.center() as i64;
    let mut output = PixelBuffer::with_region(region);

    for y in region.y..region.bottom() {
        if band.is_cancelled() {
            break;
        }
        for x in region.x..region.right() {
            let (x, y) = (x as i64, y as i64);
            let mut sum = [0.0f64; 3];

            for j in 0..size {
                for i in 0..size {
                    let weight = kernel.weight(i, j) as f64;
                    if weight == 0.0 {
                        continue;
                    }
                    let neighbor = source.get(x + i as i64 - c, y + j as i64 - c);
                    for (acc, value) in sum.iter_mut().zip(neighbor.0) {
                        *acc += weight * value as f64;
                    }
                }
            }

            let alpha = source.get(x, y)[3];
            let [r, g, b] = sum.map(clip_settled);
            output.set(x as u32, y as u32, Rgba([r, g, b, alpha]));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::region::Region;

    fn whole(buffer: &PixelBuffer) -> Band {
        Band::standalone(buffer.region())
    }

    #[test]
    fn test_box_blur_uniform_interior_and_edges() {
        let source = PixelBuffer::filled(5, 5, Rgba([90, 90, 90, 255]));
        let kernel = Kernel::generate(KernelKind::BoxBlur, 3).unwrap();
        let output = convolve(&source, &whole(&source), &kernel);

        // Interior pixels see nine equal neighbors.
        for y in 1..4 {
            for x in 1..4 {
                assert_eq!(output.get(x, y), Rgba([90, 90, 90, 255]));
            }
        }
        // Edges see six neighbors and three zero-padded reads.
        assert_eq!(output.get(2, 0), Rgba([60, 60, 60, 255]));
        assert_eq!(output.get(0, 2), Rgba([60, 60, 60, 255]));
        // Corners see four.
        assert_eq!(output.get(0, 0), Rgba([40, 40, 40, 255]));
        assert_eq!(output.get(4, 4), Rgba([40, 40, 40, 255]));
    }

    #[test]
    fn test_fractional_sums_truncate() {
        let source = PixelBuffer::from_fn(3, 3, |x, y| {
            if (x, y) == (1, 1) {
                Rgba([15, 15, 15, 255])
            } else {
                Rgba([10, 10, 10, 255])
            }
        });
        let kernel = Kernel::generate(KernelKind::BoxBlur, 3).unwrap();
        let output = convolve(&source, &whole(&source), &kernel);
        // (8 * 10 + 15) / 9 = 10.56
        assert_eq!(output.get(1, 1), Rgba([10, 10, 10, 255]));
    }

    #[test]
    fn test_uniform_five_by_five_box_blur_is_exact() {
        let source = PixelBuffer::filled(7, 7, Rgba([90, 90, 90, 255]));
        let kernel = Kernel::generate(KernelKind::BoxBlur, 5).unwrap();
        let output = convolve(&source, &whole(&source), &kernel);
        // Each weight is 0.04f32, slightly below 1/25.
        assert_eq!(output.get(3, 3), Rgba([90, 90, 90, 255]));
    }

    #[test]
    fn test_alpha_is_preserved() {
        let source = PixelBuffer::filled(3, 3, Rgba([10, 20, 30, 77]));
        let kernel = Kernel::generate(KernelKind::Outline, 3).unwrap();
        let output = convolve(&source, &whole(&source), &kernel);
        assert!(output.pixels().all(|(_, _, p)| p[3] == 77));
        // Outline of a uniform interior cancels out.
        assert_eq!(output.get(1, 1), Rgba([0, 0, 0, 77]));
    }

    #[test]
    fn test_band_reads_neighbors_from_other_bands() {
        let source = PixelBuffer::from_fn(4, 6, |_, y| Rgba([(y * 30) as u8, 0, 0, 255]));
        let kernel = Kernel::generate(KernelKind::GaussianBlur, 3).unwrap();
        let reference = convolve(&source, &whole(&source), &kernel);

        let band = Band::standalone(Region::new(0, 3, 4, 2));
        let partial = convolve(&source, &band, &kernel);
        for (x, y, pixel) in partial.pixels() {
            assert_eq!(pixel, reference.get(x as i64, y as i64));
        }
    }

    #[test]
    fn test_sharpen_clips() {
        let source = PixelBuffer::from_fn(3, 3, |x, y| {
            if (x, y) == (1, 1) {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([50, 50, 50, 255])
            }
        });
        let kernel = Kernel::generate(KernelKind::Sharpen, 3).unwrap();
        let output = convolve(&source, &whole(&source), &kernel);
        // 5 * 200 - 4 * 50 = 800
        assert_eq!(output.get(1, 1), Rgba([255, 255, 255, 255]));
    }
}
