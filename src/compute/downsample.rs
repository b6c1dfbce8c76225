//! Block-average downsampling of RGB rasters onto an LED grid.
//!
//! The source is split into `target_height` row bands and `target_width`
//! column bands of `H / Ht` by `W / Wt` pixels (integer division). Rows and
//! columns left over by the division are dropped, not redistributed: a
//! 10x10 source on a 3x3 grid uses 3x3 blocks and ignores row 9 and
//! column 9. Stored fixtures depend on this exact truncation.

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use super::color::{Color16, Color24, ColorAdjust, encode16};

/// Errors raised before any pixel is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimensionError {
    #[error("Grid dimensions must be non-zero (got {width}x{height})")]
    ZeroSize { width: usize, height: usize },
    #[error("Target grid {target_width}x{target_height} is larger than source {source_width}x{source_height}")]
    TargetTooLarge {
        target_width: usize,
        target_height: usize,
        source_width: usize,
        source_height: usize,
    },
    #[error("Raster buffer holds {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
}

/// Owned interleaved RGB8 raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Wrap an interleaved RGB8 buffer.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, DimensionError> {
        RasterView::new(width, height, &data)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Raster filled with a single color.
    pub fn filled(width: usize, height: usize, color: Color24) -> Self {
        let data = [color.r, color.g, color.b].repeat(width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Overwrite one pixel. Out-of-range coordinates are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color24) {
        if x < self.width && y < self.height {
            let i = (y * self.width + x) * 3;
            self.data[i..i + 3].copy_from_slice(&[color.r, color.g, color.b]);
        }
    }

    /// Lanczos resample to `width` x `height`.
    pub fn resized(&self, width: usize, height: usize) -> Raster {
        let img = image::RgbImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
            .unwrap_or_else(|| image::RgbImage::new(self.width as u32, self.height as u32));
        let out = image::imageops::resize(
            &img,
            width as u32,
            height as u32,
            image::imageops::FilterType::Lanczos3,
        );
        Raster::from(out)
    }

    pub fn view(&self) -> RasterView<'_> {
        RasterView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

impl From<image::RgbImage> for Raster {
    fn from(img: image::RgbImage) -> Self {
        let (w, h) = img.dimensions();
        Self {
            width: w as usize,
            height: h as usize,
            data: img.into_raw(),
        }
    }
}

/// Borrowed interleaved RGB8 raster.
#[derive(Debug, Clone, Copy)]
pub struct RasterView<'a> {
    width: usize,
    height: usize,
    data: &'a [u8],
}

impl<'a> RasterView<'a> {
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, DimensionError> {
        let expected = width * height * 3;
        if data.len() != expected {
            return Err(DimensionError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let i = (y * self.width + x) * 3;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }
}

/// Block layout for one source/target pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    pub target_width: usize,
    pub target_height: usize,
    pub block_width: usize,
    pub block_height: usize,
}

impl BlockGeometry {
    /// Validate dimensions and compute block sizes.
    pub fn new(
        source_width: usize,
        source_height: usize,
        target_width: usize,
        target_height: usize,
    ) -> Result<Self, DimensionError> {
        if target_width == 0 || target_height == 0 {
            return Err(DimensionError::ZeroSize {
                width: target_width,
                height: target_height,
            });
        }
        if source_width == 0 || source_height == 0 {
            return Err(DimensionError::ZeroSize {
                width: source_width,
                height: source_height,
            });
        }
        if target_width > source_width || target_height > source_height {
            return Err(DimensionError::TargetTooLarge {
                target_width,
                target_height,
                source_width,
                source_height,
            });
        }

        Ok(Self {
            target_width,
            target_height,
            block_width: source_width / target_width,
            block_height: source_height / target_height,
        })
    }

    /// Number of source pixels averaged per cell.
    pub fn block_area(&self) -> usize {
        self.block_width * self.block_height
    }
}

/// Mean color of the block backing target cell `(x, y)`, truncated.
fn block_mean(src: &RasterView<'_>, geom: &BlockGeometry, x: usize, y: usize) -> Color24 {
    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    let x0 = x * geom.block_width;
    let y0 = y * geom.block_height;

    for sy in y0..y0 + geom.block_height {
        for sx in x0..x0 + geom.block_width {
            let (pr, pg, pb) = src.pixel(sx, sy);
            r += pr as u64;
            g += pg as u64;
            b += pb as u64;
        }
    }

    let n = geom.block_area() as u64;
    Color24::new((r / n) as u8, (g / n) as u8, (b / n) as u8)
}

/// Downsample `src` to a `target_width` x `target_height` RGB565 grid.
///
/// Output is row-major with exactly `target_width * target_height` entries.
/// `adjust` runs on each averaged color before packing.
pub fn downsample(
    src: RasterView<'_>,
    target_width: usize,
    target_height: usize,
    adjust: &ColorAdjust,
) -> Result<Vec<Color16>, DimensionError> {
    let geom = BlockGeometry::new(src.width, src.height, target_width, target_height)?;
    let mut out = vec![Color16::default(); target_width * target_height];

    let fill_row = |(y, row): (usize, &mut [Color16])| {
        for (x, cell) in row.iter_mut().enumerate() {
            let mean = block_mean(&src, &geom, x, y);
            *cell = encode16(adjust.apply(mean));
        }
    };

    #[cfg(not(target_arch = "wasm32"))]
    out.par_chunks_mut(target_width).enumerate().for_each(fill_row);

    #[cfg(target_arch = "wasm32")]
    out.chunks_mut(target_width).enumerate().for_each(fill_row);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> Raster {
        let mut r = Raster::filled(width, height, Color24::BLACK);
        for y in 0..height {
            for x in 0..width {
                r.set_pixel(x, y, Color24::new((x * 10) as u8, (y * 10) as u8, 0));
            }
        }
        r
    }

    #[test]
    fn test_output_length() {
        let src = gradient(17, 9);
        let out = downsample(src.view(), 5, 3, &ColorAdjust::IDENTITY).unwrap();
        assert_eq!(out.len(), 15);
    }

    #[test]
    fn test_remainder_dropped() {
        let geom = BlockGeometry::new(10, 10, 3, 3).unwrap();
        assert_eq!(geom.block_width, 3);
        assert_eq!(geom.block_height, 3);

        // Paint only row 9 and column 9 white; no block covers them.
        let mut src = Raster::filled(10, 10, Color24::BLACK);
        for i in 0..10 {
            src.set_pixel(9, i, Color24::new(255, 255, 255));
            src.set_pixel(i, 9, Color24::new(255, 255, 255));
        }
        let out = downsample(src.view(), 3, 3, &ColorAdjust::IDENTITY).unwrap();
        assert!(out.iter().all(|&c| c == Color16(0)));
    }

    #[test]
    fn test_block_mean_truncates() {
        // 2x1 block of (0,0,0) and (255,3,1): mean (127.5, 1.5, 0.5) -> (127, 1, 0)
        let mut src = Raster::filled(2, 1, Color24::BLACK);
        src.set_pixel(1, 0, Color24::new(255, 3, 1));
        let out = downsample(src.view(), 1, 1, &ColorAdjust::IDENTITY).unwrap();
        assert_eq!(out, vec![encode16(Color24::new(127, 1, 0))]);
    }

    #[test]
    fn test_row_major_order() {
        let src = gradient(4, 2);
        let out = downsample(src.view(), 4, 2, &ColorAdjust::IDENTITY).unwrap();
        for y in 0..2 {
            for x in 0..4 {
                let expected = encode16(Color24::new((x * 10) as u8, (y * 10) as u8, 0));
                assert_eq!(out[y * 4 + x], expected);
            }
        }
    }

    #[test]
    fn test_adjust_applied() {
        let src = Raster::filled(4, 4, Color24::new(200, 100, 50));
        let adjust = ColorAdjust::new(1.0, 1.0, 0.0);
        let out = downsample(src.view(), 2, 2, &adjust).unwrap();
        assert!(out.iter().all(|&c| c == encode16(Color24::new(124, 124, 124))));
    }

    #[test]
    fn test_target_too_large() {
        let src = Raster::filled(4, 4, Color24::BLACK);
        let err = downsample(src.view(), 5, 2, &ColorAdjust::IDENTITY).unwrap_err();
        assert!(matches!(err, DimensionError::TargetTooLarge { .. }));
    }

    #[test]
    fn test_zero_target() {
        let src = Raster::filled(4, 4, Color24::BLACK);
        let err = downsample(src.view(), 0, 2, &ColorAdjust::IDENTITY).unwrap_err();
        assert!(matches!(err, DimensionError::ZeroSize { .. }));
    }

    #[test]
    fn test_resized_allows_small_sources() {
        let src = Raster::filled(2, 2, Color24::new(10, 20, 30));
        let big = src.resized(40, 20);
        assert_eq!((big.width(), big.height()), (40, 20));
        assert_eq!(downsample(big.view(), 4, 2, &ColorAdjust::IDENTITY).unwrap().len(), 8);
    }

    #[test]
    fn test_buffer_size_checked() {
        let err = Raster::new(2, 2, vec![0; 11]).unwrap_err();
        assert_eq!(
            err,
            DimensionError::BufferSize {
                width: 2,
                height: 2,
                expected: 12,
                actual: 11
            }
        );
    }
}
