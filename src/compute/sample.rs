//! Test palette asset, generated only on request.

use std::path::Path;

use super::color::Color24;
use super::downsample::Raster;
use super::source::SourceError;

/// The 16 reference colors, row-major on a 4x4 grid.
pub const SAMPLE_PALETTE: [Color24; 16] = [
    Color24::new(255, 0, 0),
    Color24::new(0, 255, 0),
    Color24::new(0, 0, 255),
    Color24::new(255, 255, 255),
    Color24::new(255, 255, 0),
    Color24::new(255, 0, 255),
    Color24::new(0, 255, 255),
    Color24::new(0, 0, 0),
    Color24::new(128, 128, 128),
    Color24::new(255, 165, 0),
    Color24::new(255, 192, 203),
    Color24::new(0, 100, 0),
    Color24::new(0, 0, 128),
    Color24::new(255, 0, 127),
    Color24::new(204, 255, 0),
    Color24::new(135, 206, 235),
];

/// Cells per side of the palette grid.
pub const SAMPLE_GRID: usize = 4;

/// Side of one palette cell in the written asset.
pub const SAMPLE_CELL_SIZE: usize = 100;

/// Palette grid with each color blown up to `cell` x `cell` pixels.
pub fn sample_palette(cell: usize) -> Raster {
    let side = SAMPLE_GRID * cell;
    let mut raster = Raster::filled(side, side, Color24::BLACK);
    for y in 0..side {
        for x in 0..side {
            let color = SAMPLE_PALETTE[(y / cell) * SAMPLE_GRID + x / cell];
            raster.set_pixel(x, y, color);
        }
    }
    raster
}

/// Write the 400x400 palette PNG to `path`.
pub fn write_sample_palette(path: &Path) -> Result<(), SourceError> {
    let raster = sample_palette(SAMPLE_CELL_SIZE);
    let side = raster.width() as u32;
    image::save_buffer(path, raster.data(), side, side, image::ExtendedColorType::Rgb8).map_err(
        |source| SourceError::Image {
            path: path.to_path_buf(),
            source,
        },
    )?;
    log::info!("Wrote sample palette to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{ColorAdjust, downsample, encode16, load_still};

    #[test]
    fn test_palette_downsamples_to_itself() {
        let raster = sample_palette(5);
        let out = downsample(raster.view(), 4, 4, &ColorAdjust::IDENTITY).unwrap();
        let expected: Vec<_> = SAMPLE_PALETTE.iter().map(|&c| encode16(c)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_write_sample_palette() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_image.png");
        write_sample_palette(&path).unwrap();

        let loaded = load_still(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (400, 400));
        assert_eq!(&loaded.data()[..3], &[255, 0, 0]);
    }
}
