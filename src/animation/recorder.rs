//! Sequence recorder writing matrix frames to an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::format::{sequence_file_name, still_file_name, write_frame_file};
use crate::error::{Error, Result};
use crate::schema::{FormatError, Frame};

/// Writes frames using the canonical file names.
///
/// Usage:
/// ```ignore
/// let mut recorder = SequenceRecorder::new("out", "clip")?;
/// for frame in frames {
///     recorder.record_frame(&frame)?;
/// }
/// let stats = recorder.finalize();
/// ```
pub struct SequenceRecorder {
    dir: PathBuf,
    stem: String,
    written: Vec<PathBuf>,
    dimensions: Option<(usize, usize)>,
    /// Numbering for frames without a source index.
    next_index: u64,
}

impl SequenceRecorder {
    /// Create the output directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P, stem: impl Into<String>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| Error::Io {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            stem: stem.into(),
            written: Vec::new(),
            dimensions: None,
            next_index: 0,
        })
    }

    /// Write a single-image frame as `<stem>.json`.
    pub fn write_still(&mut self, frame: &Frame) -> Result<PathBuf> {
        let path = self.dir.join(still_file_name(&self.stem));
        self.write(path, frame)
    }

    /// Write one frame of a sequence as `<stem>_frame_<NNNN>.json`.
    ///
    /// The number is the frame's source index when it has one.
    pub fn record_frame(&mut self, frame: &Frame) -> Result<PathBuf> {
        let index = frame.frame_index().unwrap_or(self.next_index);
        self.next_index = index + 1;
        let path = self.dir.join(sequence_file_name(&self.stem, index));
        self.write(path, frame)
    }

    fn write(&mut self, path: PathBuf, frame: &Frame) -> Result<PathBuf> {
        match self.dimensions {
            Some((w, h)) if (w, h) != frame.dimensions() => {
                return Err(Error::Format {
                    path,
                    source: FormatError::DimensionMismatch {
                        expected_width: w,
                        expected_height: h,
                        found_width: frame.width(),
                        found_height: frame.height(),
                    },
                });
            }
            Some(_) => {}
            None => self.dimensions = Some(frame.dimensions()),
        }

        write_frame_file(&path, frame)?;
        log::debug!("Wrote {}", path.display());
        self.written.push(path.clone());
        Ok(path)
    }

    /// Number of files written so far.
    pub fn frames_written(&self) -> usize {
        self.written.len()
    }

    pub fn finalize(self) -> RecordingStats {
        RecordingStats {
            frame_count: self.written.len(),
            dimensions: self.dimensions,
            files: self.written,
        }
    }
}

/// Summary of a recording session.
#[derive(Debug, Clone, Default)]
pub struct RecordingStats {
    /// Files written.
    pub frame_count: usize,
    /// Shared frame size.
    pub dimensions: Option<(usize, usize)>,
    /// Written paths, in write order.
    pub files: Vec<PathBuf>,
}

impl std::fmt::Display for RecordingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.dimensions {
            Some((w, h)) => write!(f, "{} frames ({}x{})", self.frame_count, w, h),
            None => write!(f, "{} frames", self.frame_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::format::read_frame_file;
    use crate::compute::Color16;
    use tempfile::tempdir;

    fn frame(width: usize, height: usize) -> Frame {
        Frame::new(width, height, vec![Color16(0x1234); width * height]).unwrap()
    }

    #[test]
    fn test_recorder_still() {
        let dir = tempdir().unwrap();
        let mut recorder = SequenceRecorder::new(dir.path(), "logo").unwrap();
        let path = recorder.write_still(&frame(4, 4)).unwrap();

        assert_eq!(path, dir.path().join("logo.json"));
        assert_eq!(read_frame_file(&path).unwrap(), frame(4, 4));
    }

    #[test]
    fn test_recorder_uses_source_index() {
        let dir = tempdir().unwrap();
        let mut recorder = SequenceRecorder::new(dir.path().join("nested/out"), "clip").unwrap();

        recorder
            .record_frame(&frame(2, 2).with_source_index(3, 30.0))
            .unwrap();
        recorder.record_frame(&frame(2, 2)).unwrap();

        let stats = recorder.finalize();
        assert_eq!(stats.frame_count, 2);
        assert_eq!(stats.dimensions, Some((2, 2)));
        assert!(stats.files[0].ends_with("clip_frame_0003.json"));
        assert!(stats.files[1].ends_with("clip_frame_0004.json"));
        assert_eq!(stats.to_string(), "2 frames (2x2)");
    }

    #[test]
    fn test_recorder_rejects_size_change() {
        let dir = tempdir().unwrap();
        let mut recorder = SequenceRecorder::new(dir.path(), "clip").unwrap();
        recorder.record_frame(&frame(2, 2)).unwrap();

        let err = recorder.record_frame(&frame(3, 2)).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
        assert_eq!(recorder.frames_written(), 1);
    }
}
