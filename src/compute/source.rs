//! Decoded media sources feeding the downsampler.
//!
//! Still images are decoded in one go. Multi-frame media implements
//! [`FrameSource`], which hands out individual frames by index so the
//! converter can skip frames that fail to decode.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;

use super::downsample::Raster;

/// Frame rate assumed when a source does not report one.
pub const DEFAULT_NATIVE_FPS: f64 = 30.0;

/// Shortest GIF frame delay honored, in milliseconds.
const MIN_GIF_DELAY_MS: f64 = 20.0;

/// Errors raised while opening or decoding media.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to decode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Frame {index} could not be decoded: {reason}")]
    Frame { index: usize, reason: String },
    #[error("Frame {index} out of range ({total} frames)")]
    OutOfRange { index: usize, total: usize },
    #[error("Unsupported media type: {0}")]
    Unsupported(PathBuf),
    #[error("Video backend error: {0}")]
    Video(String),
}

/// A multi-frame media source.
///
/// Frames are requested with ascending indices; streaming backends may not
/// be able to go backwards.
pub trait FrameSource {
    /// Total frames reported by the source.
    fn frame_count(&self) -> usize;

    /// Native frame rate.
    fn native_fps(&self) -> f64;

    /// Decode one frame.
    fn read_frame(&mut self, index: usize) -> Result<Raster, SourceError>;
}

/// Decode a still image to RGB, dropping any alpha channel.
pub fn load_still(path: &Path) -> Result<Raster, SourceError> {
    let img = image::open(path).map_err(|source| SourceError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Raster::from(img.to_rgb8()))
}

/// In-memory frames; `None` marks a frame that fails to decode.
#[derive(Debug, Clone)]
pub struct MemorySource {
    frames: Vec<Option<Raster>>,
    fps: f64,
}

impl MemorySource {
    pub fn new(frames: Vec<Option<Raster>>, fps: f64) -> Self {
        Self { frames, fps }
    }

    pub fn from_rasters(frames: Vec<Raster>, fps: f64) -> Self {
        Self::new(frames.into_iter().map(Some).collect(), fps)
    }
}

impl FrameSource for MemorySource {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn native_fps(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self, index: usize) -> Result<Raster, SourceError> {
        match self.frames.get(index) {
            Some(Some(raster)) => Ok(raster.clone()),
            Some(None) => Err(SourceError::Frame {
                index,
                reason: "frame data missing".to_string(),
            }),
            None => Err(SourceError::OutOfRange {
                index,
                total: self.frames.len(),
            }),
        }
    }
}

/// Animated GIF, fully composited and decoded at open time.
pub struct GifSource {
    frames: Vec<Result<Raster, String>>,
    fps: f64,
}

impl GifSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = GifDecoder::new(BufReader::new(file)).map_err(|source| SourceError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let mut frames = Vec::new();
        let mut total_delay_ms = 0.0;
        for frame in decoder.into_frames() {
            match frame {
                Ok(frame) => {
                    let (num, den) = frame.delay().numer_denom_ms();
                    let delay = if den == 0 { 0.0 } else { num as f64 / den as f64 };
                    total_delay_ms += delay.max(MIN_GIF_DELAY_MS);
                    let rgb = image::DynamicImage::ImageRgba8(frame.into_buffer()).to_rgb8();
                    frames.push(Ok(Raster::from(rgb)));
                }
                // The decoder cannot resync after a corrupt frame.
                Err(e) => {
                    total_delay_ms += MIN_GIF_DELAY_MS;
                    frames.push(Err(e.to_string()));
                    break;
                }
            }
        }

        let fps = if frames.is_empty() {
            DEFAULT_NATIVE_FPS
        } else {
            1000.0 / (total_delay_ms / frames.len() as f64)
        };

        log::info!(
            "Opened GIF {}: {} frames, {:.2} fps",
            path.display(),
            frames.len(),
            fps
        );

        Ok(Self { frames, fps })
    }
}

impl FrameSource for GifSource {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn native_fps(&self) -> f64 {
        self.fps
    }

    fn read_frame(&mut self, index: usize) -> Result<Raster, SourceError> {
        match self.frames.get(index) {
            Some(Ok(raster)) => Ok(raster.clone()),
            Some(Err(reason)) => Err(SourceError::Frame {
                index,
                reason: reason.clone(),
            }),
            None => Err(SourceError::OutOfRange {
                index,
                total: self.frames.len(),
            }),
        }
    }
}

/// Kind of media behind a path, judged by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Still,
    Gif,
    Video,
}

impl MediaKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "gif" => MediaKind::Gif,
            "mp4" | "mov" | "avi" | "mkv" | "webm" | "m4v" => MediaKind::Video,
            _ => MediaKind::Still,
        }
    }
}

/// Open a multi-frame source for `path`.
pub fn open_frames(path: &Path) -> Result<Box<dyn FrameSource>, SourceError> {
    match MediaKind::from_path(path) {
        MediaKind::Gif => Ok(Box::new(GifSource::open(path)?)),
        #[cfg(feature = "video")]
        MediaKind::Video => Ok(Box::new(super::video::FfmpegSource::open(path)?)),
        #[cfg(not(feature = "video"))]
        MediaKind::Video => Err(SourceError::Unsupported(path.to_path_buf())),
        MediaKind::Still => {
            let raster = load_still(path)?;
            Ok(Box::new(MemorySource::from_rasters(
                vec![raster],
                DEFAULT_NATIVE_FPS,
            )))
        }
    }
}
