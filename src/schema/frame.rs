//! Matrix frame type.

use crate::compute::{Color16, Color24, decode16};

/// Schema tag written for plain image and video frames.
pub const FRAME_VERSION: f64 = 1.0;

/// Schema tag written for glyph frames carrying `char`/`text_color`/`bg_color`.
pub const GLYPH_FRAME_VERSION: f64 = 1.2;

/// Frame validation errors.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid frame JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Frame dimensions must be positive (got {width}x{height})")]
    InvalidDimensions { width: i64, height: i64 },
    #[error("Frame has {actual} pixels, expected {expected} for {width}x{height}")]
    PixelCount {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Pixel {index} has value {value}, outside 0..=65535")]
    PixelRange { index: usize, value: i64 },
    #[error("Frame is {found_width}x{found_height}, sequence is {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        found_width: usize,
        found_height: usize,
    },
}

/// Extra fields carried by single-character frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph {
    pub character: String,
    pub text_color: Color24,
    pub bg_color: Color24,
}

/// One RGB565 matrix frame.
///
/// Pixels are row-major (`y * width + x`) and always number exactly
/// `width * height`; the constructor enforces it and frames are immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Vec<Color16>,
    width: usize,
    height: usize,
    frame_index: Option<u64>,
    timestamp: Option<f64>,
    description: String,
    version: f64,
    glyph: Option<Glyph>,
}

impl Frame {
    /// Create a frame, validating dimensions against the pixel count.
    pub fn new(width: usize, height: usize, pixels: Vec<Color16>) -> Result<Self, FormatError> {
        if width == 0 || height == 0 {
            return Err(FormatError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        let expected = width
            .checked_mul(height)
            .ok_or(FormatError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            })?;
        if pixels.len() != expected {
            return Err(FormatError::PixelCount {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            pixels,
            width,
            height,
            frame_index: None,
            timestamp: None,
            description: String::new(),
            version: FRAME_VERSION,
            glyph: None,
        })
    }

    /// Tag as source frame `index` of a `fps` stream; timestamp keeps 2 decimals.
    pub fn with_source_index(mut self, index: u64, fps: f64) -> Self {
        self.frame_index = Some(index);
        self.timestamp = (fps > 0.0).then(|| round_centis(index as f64 / fps));
        self
    }

    pub fn with_frame_index(mut self, index: Option<u64>) -> Self {
        self.frame_index = index;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Option<f64>) -> Self {
        self.timestamp = timestamp.map(round_centis);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: f64) -> Self {
        self.version = version;
        self
    }

    /// Attach glyph metadata; bumps the schema tag to the glyph version.
    pub fn with_glyph(mut self, glyph: Glyph) -> Self {
        self.glyph = Some(glyph);
        self.version = GLYPH_FRAME_VERSION;
        self
    }

    pub fn pixels(&self) -> &[Color16] {
        &self.pixels
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn frame_index(&self) -> Option<u64> {
        self.frame_index
    }

    pub fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn version(&self) -> f64 {
        self.version
    }

    pub fn glyph(&self) -> Option<&Glyph> {
        self.glyph.as_ref()
    }

    /// Pixel at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Color16> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Expand all pixels to 24-bit color.
    pub fn to_color24(&self) -> Vec<Color24> {
        self.pixels.iter().map(|&p| decode16(p)).collect()
    }
}

/// Round to 2 decimals, ties to even.
fn round_centis(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}
