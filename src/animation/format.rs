//! JSON file format for matrix frames.
//!
//! One frame per file:
//!
//! ```text
//! {
//!   "pixels": [63488, 2016, ...],   // RGB565, row-major, width * height entries
//!   "width": 16,
//!   "height": 16,
//!   "frame_index": 12,              // multi-frame sources only
//!   "timestamp": 0.4,               // seconds, 2 decimals
//!   "description": "",
//!   "version": 1.0
//! }
//! ```
//!
//! Glyph frames (version 1.2) also carry `char`, `text_color` and `bg_color`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compute::Color16;
use crate::error::{Error, Result};
use crate::schema::{FRAME_VERSION, FormatError, Frame, Glyph};

/// File extension of frame files.
pub const FRAME_EXTENSION: &str = "json";

/// Minimum zero padding of the frame number in sequence file names.
pub const FRAME_NUMBER_WIDTH: usize = 4;

fn default_version() -> f64 {
    FRAME_VERSION
}

/// On-disk layout. Numbers are read wide so range errors can be reported
/// precisely instead of as generic JSON failures.
#[derive(Debug, Serialize, Deserialize)]
struct FrameRecord {
    pixels: Vec<i64>,
    width: i64,
    height: i64,
    #[serde(rename = "char", default, skip_serializing_if = "Option::is_none")]
    character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_color: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bg_color: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frame_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<f64>,
    #[serde(default)]
    description: String,
    #[serde(default = "default_version")]
    version: f64,
}

impl From<&Frame> for FrameRecord {
    fn from(frame: &Frame) -> Self {
        let glyph = frame.glyph();
        Self {
            pixels: frame.pixels().iter().map(|p| p.0 as i64).collect(),
            width: frame.width() as i64,
            height: frame.height() as i64,
            character: glyph.map(|g| g.character.clone()),
            text_color: glyph.map(|g| g.text_color.into()),
            bg_color: glyph.map(|g| g.bg_color.into()),
            frame_index: frame.frame_index(),
            timestamp: frame.timestamp(),
            description: frame.description().to_string(),
            version: frame.version(),
        }
    }
}

impl TryFrom<FrameRecord> for Frame {
    type Error = FormatError;

    fn try_from(record: FrameRecord) -> std::result::Result<Self, FormatError> {
        let invalid = || FormatError::InvalidDimensions {
            width: record.width,
            height: record.height,
        };
        if record.width <= 0 || record.height <= 0 {
            return Err(invalid());
        }
        let width = usize::try_from(record.width).map_err(|_| invalid())?;
        let height = usize::try_from(record.height).map_err(|_| invalid())?;

        let pixels = record
            .pixels
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                u16::try_from(value)
                    .map(Color16)
                    .map_err(|_| FormatError::PixelRange { index, value })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut frame = Frame::new(width, height, pixels)?
            .with_frame_index(record.frame_index)
            .with_timestamp(record.timestamp)
            .with_description(record.description);

        if let Some(character) = record.character {
            frame = frame.with_glyph(Glyph {
                character,
                text_color: record.text_color.unwrap_or([255, 255, 255]).into(),
                bg_color: record.bg_color.unwrap_or([0, 0, 0]).into(),
            });
        }

        Ok(frame.with_version(record.version))
    }
}

/// Serialize a frame to pretty-printed JSON (2-space indent).
pub fn encode_frame(frame: &Frame) -> std::result::Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(&FrameRecord::from(frame))?)
}

/// Serialize a frame into a writer.
pub fn write_frame<W: Write>(frame: &Frame, w: W) -> std::result::Result<(), FormatError> {
    serde_json::to_writer_pretty(w, &FrameRecord::from(frame))?;
    Ok(())
}

/// Parse and validate a frame.
pub fn decode_frame(text: &str) -> std::result::Result<Frame, FormatError> {
    let record: FrameRecord = serde_json::from_str(text)?;
    Frame::try_from(record)
}

/// Read and validate a frame file (UTF-8).
pub fn read_frame_file(path: &Path) -> Result<Frame> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_frame(&text).map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a frame file, replacing any existing file.
pub fn write_frame_file(path: &Path, frame: &Frame) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    write_frame(frame, &mut writer).map_err(|source| Error::Format {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)
}

/// `<stem>.json`
pub fn still_file_name(stem: &str) -> String {
    format!("{stem}.{FRAME_EXTENSION}")
}

/// `<stem>_frame_<index padded to 4 digits>.json`
pub fn sequence_file_name(stem: &str, index: u64) -> String {
    format!("{stem}_frame_{index:0width$}.{FRAME_EXTENSION}", width = FRAME_NUMBER_WIDTH)
}
