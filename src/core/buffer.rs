//! RGBA pixel buffers with absolute-coordinate addressing.
//!
//! A [`PixelBuffer`] covers a [`Region`] of an image. Whole images sit at the
//! origin; band buffers produced by the tiled executor sit at their band's
//! offset, so both are addressed with the same absolute coordinates.
//!
//! Reading outside the region yields transparent black instead of failing.
//! Convolution relies on this for zero padding at image edges.

use crate::core::region::Region;
use crate::core::types::TRANSPARENT;
use image::{DynamicImage, Rgba, RgbaImage};
use std::fmt;

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A rectangular grid of RGBA8 samples.
#[derive(Clone, PartialEq)]
pub struct PixelBuffer {
    region: Region,
    data: RgbaImage,
}

impl PixelBuffer {
    /// Allocate a transparent buffer anchored at the origin.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_region(Region::sized(width, height))
    }

    /// Allocate a transparent buffer covering `region`.
    pub fn with_region(region: Region) -> Self {
        Self {
            region,
            data: RgbaImage::new(region.width, region.height),
        }
    }

    /// Allocate a buffer filled with one color.
    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self {
            region: Region::sized(width, height),
            data: RgbaImage::from_pixel(width, height, color),
        }
    }

    /// Build a buffer by evaluating `f` at every coordinate.
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Self
    where
        F: FnMut(u32, u32) -> Rgba<u8>,
    {
        Self {
            region: Region::sized(width, height),
            data: RgbaImage::from_fn(width, height, f),
        }
    }

    /// Wrap a decoded RGBA image.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        Self {
            region: Region::sized(image.width(), image.height()),
            data: image,
        }
    }

    /// Convert any decoded image to RGBA8.
    pub fn from_dynamic_image(image: &DynamicImage) -> Self {
        Self::from_rgba_image(image.to_rgba8())
    }

    /// Unwrap into an RGBA image for encoding. The region offset is dropped.
    pub fn into_rgba_image(self) -> RgbaImage {
        self.data
    }

    /// The region this buffer covers.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.region.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.region.height
    }

    /// `(min_x, min_y, max_x, max_y)` with exclusive maxima.
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (self.region.x, self.region.y, self.region.right(), self.region.bottom())
    }

    /// Read the pixel at an absolute coordinate.
    ///
    /// Any coordinate outside the region, negative ones included, reads as
    /// transparent black.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Rgba<u8> {
        if !self.region.contains(x, y) {
            return TRANSPARENT;
        }
        let local_x = (x - self.region.x as i64) as u32;
        let local_y = (y - self.region.y as i64) as u32;
        *self.data.get_pixel(local_x, local_y)
    }

    /// Write the pixel at an absolute coordinate inside the region.
    ///
    /// Callers never write out of bounds; doing so panics.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        debug_assert!(
            self.region.contains(x as i64, y as i64),
            "write at ({}, {}) outside {:?}",
            x,
            y,
            self.region
        );
        self.data.put_pixel(x - self.region.x, y - self.region.y, color);
    }

    /// Iterate over `(x, y, pixel)` in absolute coordinates, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Rgba<u8>)> + '_ {
        let (ox, oy) = (self.region.x, self.region.y);
        self.data
            .enumerate_pixels()
            .map(move |(x, y, pixel)| (x + ox, y + oy, *pixel))
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.data.as_raw()
    }

    /// Mutable raw RGBA bytes, row-major.
    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Memory size of the pixel data in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.as_raw().len()
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("region", &self.region)
            .field("bytes", &self.memory_size())
            .finish()
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self::from_rgba_image(image)
    }
}
