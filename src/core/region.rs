//! Rectangular regions and row-band splitting.
//!
//! The tiled executor divides an image into horizontal bands, each a full-width
//! run of rows. Every band is a [`Region`] in absolute image coordinates, so a
//! worker can read neighbours outside its own band straight from the source.

/// Represents a rectangular region within an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// X offset from the image origin
    pub x: u32,
    /// Y offset from the image origin
    pub y: u32,
    /// Width of the region
    pub width: u32,
    /// Height of the region
    pub height: u32,
}

impl Region {
    /// Create a new region.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Create a region anchored at the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Get the right edge coordinate (exclusive).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Get the bottom edge coordinate (exclusive).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Calculate the area of this region in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check whether an absolute coordinate lies inside the region.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64 && y >= self.y as i64 && x < self.right() as i64 && y < self.bottom() as i64
    }

    /// Split into full-width horizontal bands.
    pub fn bands(&self, count: usize) -> BandIterator {
        BandIterator::new(*self, count)
    }
}

/// Iterator over the horizontal bands of a region.
///
/// Each band is `ceil(height / count)` rows tall; the last one is truncated to
/// the region. Short images therefore produce fewer than `count` bands.
pub struct BandIterator {
    region: Region,
    band_height: u32,
    current_y: u32,
}

impl BandIterator {
    /// Create a new band iterator.
    pub fn new(region: Region, count: usize) -> Self {
        let count = count.max(1) as u64;
        let band_height = (region.height as u64).div_ceil(count).max(1) as u32;
        Self {
            region,
            band_height,
            current_y: region.y,
        }
    }

    /// Height of every band except possibly the last.
    pub fn band_height(&self) -> u32 {
        self.band_height
    }

    /// Get the total number of bands.
    pub fn band_count(&self) -> usize {
        if self.region.is_empty() {
            return 0;
        }
        self.region.height.div_ceil(self.band_height) as usize
    }
}

impl Iterator for BandIterator {
    type Item = Region;

    fn next(&mut self) -> Option<Self::Item> {
        if self.region.is_empty() || self.current_y >= self.region.bottom() {
            return None;
        }

        let y = self.current_y;
        let height = self.band_height.min(self.region.bottom() - y);
        self.current_y += height;

        Some(Region::new(self.region.x, y, self.region.width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region() {
        let region = Region::new(10, 20, 100, 200);
        assert_eq!(region.right(), 110);
        assert_eq!(region.bottom(), 220);
        assert_eq!(region.area(), 20000);
        assert!(region.contains(10, 20));
        assert!(!region.contains(110, 20));
        assert!(!region.contains(-1, 25));
    }

    #[test]
    fn test_band_iterator() {
        let iter = Region::sized(64, 10).bands(4);
        assert_eq!(iter.band_height(), 3);
        assert_eq!(iter.band_count(), 4);

        let bands: Vec<_> = Region::sized(64, 10).bands(4).collect();
        assert_eq!(bands.len(), 4);
        assert_eq!(bands[0], Region::new(0, 0, 64, 3));
        assert_eq!(bands[2], Region::new(0, 6, 64, 3));
        // Last band is truncated to the image.
        assert_eq!(bands[3], Region::new(0, 9, 64, 1));
    }

    #[test]
    fn test_bands_cover_exhaustively() {
        for count in 1..12 {
            let bands: Vec<_> = Region::sized(5, 17).bands(count).collect();
            let rows: u32 = bands.iter().map(|b| b.height).sum();
            assert_eq!(rows, 17);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].bottom(), pair[1].y);
            }
        }
    }

    #[test]
    fn test_more_bands_than_rows() {
        let bands: Vec<_> = Region::sized(4, 2).bands(8).collect();
        assert_eq!(bands.len(), 2);
        assert!(bands.iter().all(|b| b.height == 1));
    }

    #[test]
    fn test_empty_region_has_no_bands() {
        assert_eq!(Region::sized(0, 10).bands(4).count(), 0);
        assert_eq!(Region::sized(10, 0).bands(4).band_count(), 0);
    }
}
