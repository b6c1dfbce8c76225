//! Media to matrix frame conversion.
//!
//! Stills produce one `<stem>.json`; multi-frame sources produce one
//! `<stem>_frame_<NNNN>.json` per selected source frame. Source frames that
//! fail to decode are skipped and counted, never fatal.

use std::path::{Path, PathBuf};

use crate::animation::{RecordingStats, SequenceRecorder};
use crate::compute::{FrameSource, MediaKind, Raster, downsample, load_still, open_frames};
use crate::error::Result;
use crate::schema::{ConvertConfig, Frame};

/// Outcome of one conversion.
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    /// Files written.
    pub stats: RecordingStats,
    /// Source frames selected for conversion.
    pub requested: usize,
    /// Selected frames that could not be decoded.
    pub skipped: usize,
}

impl ConversionReport {
    pub fn files(&self) -> &[PathBuf] {
        &self.stats.files
    }
}

/// Downsample one raster into a frame using `config`.
///
/// Block averaging runs on the raster as given; `config.prescale` is
/// applied by [`convert_image`] only.
pub fn frame_from_raster(raster: &Raster, config: &ConvertConfig) -> Result<Frame> {
    let pixels = downsample(raster.view(), config.width, config.height, &config.adjust)?;
    let frame = Frame::new(config.width, config.height, pixels)?
        .with_description(config.description.clone());
    Ok(frame)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string())
}

/// Convert a still image to `<out_dir>/<stem>.json`.
pub fn convert_image(path: &Path, out_dir: &Path, config: &ConvertConfig) -> Result<ConversionReport> {
    config.validate()?;
    let raster = load_still(path)?;
    let frame = match config.prescale {
        Some(f) if f > 0 => {
            let f = f as usize;
            let scaled = raster.resized(config.width * f, config.height * f);
            frame_from_raster(&scaled, config)?
        }
        _ => frame_from_raster(&raster, config)?,
    };

    let mut recorder = SequenceRecorder::new(out_dir, file_stem(path))?;
    let written = recorder.write_still(&frame)?;
    log::info!(
        "Converted {} ({}x{}) -> {}",
        path.display(),
        raster.width(),
        raster.height(),
        written.display()
    );

    Ok(ConversionReport {
        stats: recorder.finalize(),
        requested: 1,
        skipped: 0,
    })
}

/// Convert the frames of `source` selected by `config.sampling`.
///
/// Frames are averaged at their native size; `config.prescale` does not apply.
pub fn convert_frames(
    source: &mut dyn FrameSource,
    stem: &str,
    out_dir: &Path,
    config: &ConvertConfig,
) -> Result<ConversionReport> {
    config.validate()?;
    let fps = source.native_fps();
    let indices = config.sampling.select(source.frame_count(), fps);
    let mut recorder = SequenceRecorder::new(out_dir, stem)?;
    let mut skipped = 0;

    for &index in &indices {
        let raster = match source.read_frame(index) {
            Ok(raster) => raster,
            Err(e) => {
                log::warn!("Skipping source frame {index}: {e}");
                skipped += 1;
                continue;
            }
        };

        let frame = frame_from_raster(&raster, config)?.with_source_index(index as u64, fps);
        recorder.record_frame(&frame)?;
    }

    let stats = recorder.finalize();
    log::info!(
        "Converted {stem}: {stats}, {} of {} selected frames skipped",
        skipped,
        indices.len()
    );

    Ok(ConversionReport {
        stats,
        requested: indices.len(),
        skipped,
    })
}

/// Convert any supported media file, choosing the mode from its extension.
pub fn convert_path(path: &Path, out_dir: &Path, config: &ConvertConfig) -> Result<ConversionReport> {
    match MediaKind::from_path(path) {
        MediaKind::Still => convert_image(path, out_dir, config),
        MediaKind::Gif | MediaKind::Video => {
            let mut source = open_frames(path)?;
            convert_frames(source.as_mut(), &file_stem(path), out_dir, config)
        }
    }
}
