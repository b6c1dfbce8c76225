//! Video decoding via an ffmpeg subprocess (feature-gated behind `video`).
//!
//! - `ffprobe` reports dimensions, frame rate and frame count at open time
//! - `ffmpeg -f rawvideo -pix_fmt rgb24` streams frames over a pipe
//! - frames are read forward only; skipped indices are read and discarded

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use super::downsample::Raster;
use super::source::{DEFAULT_NATIVE_FPS, FrameSource, SourceError};

/// Video metadata from ffprobe.
#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub width: usize,
    pub height: usize,
    pub fps: f64,
    pub frame_count: usize,
}

/// Probe video metadata using ffprobe.
pub fn probe_video(path: &Path) -> Result<VideoMeta, SourceError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-count_packets",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| SourceError::Video(format!("ffprobe failed to execute: {e}")))?;

    if !output.status.success() {
        return Err(SourceError::Video(
            "ffprobe returned non-zero exit code".to_string(),
        ));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| SourceError::Video(format!("Failed to parse ffprobe JSON: {e}")))?;

    let stream = json["streams"]
        .as_array()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s["codec_type"].as_str() == Some("video"))
        })
        .ok_or_else(|| SourceError::Video("No video stream found".to_string()))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| SourceError::Video("Missing width".to_string()))? as usize;
    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| SourceError::Video("Missing height".to_string()))? as usize;

    let fps = parse_frame_rate(stream["r_frame_rate"].as_str().unwrap_or("30/1"));

    let counted = |key: &str| stream[key].as_str().and_then(|s| s.parse::<usize>().ok());
    let frame_count = counted("nb_frames")
        .or_else(|| counted("nb_read_packets"))
        .or_else(|| {
            json["format"]["duration"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .map(|secs| (secs * fps).round() as usize)
        })
        .unwrap_or(0);

    Ok(VideoMeta {
        width,
        height,
        fps,
        frame_count,
    })
}

fn parse_frame_rate(rate: &str) -> f64 {
    if let Some((num, den)) = rate.split_once('/') {
        let n: f64 = num.parse().unwrap_or(DEFAULT_NATIVE_FPS);
        let d: f64 = den.parse().unwrap_or(1.0);
        if d > 0.0 && n > 0.0 {
            n / d
        } else {
            DEFAULT_NATIVE_FPS
        }
    } else {
        rate.parse().unwrap_or(DEFAULT_NATIVE_FPS)
    }
}

/// Streaming ffmpeg decoder.
pub struct FfmpegSource {
    path: PathBuf,
    meta: VideoMeta,
    child: Child,
    stdout: ChildStdout,
    /// Index of the next frame on the pipe.
    cursor: usize,
    buffer: Vec<u8>,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let meta = probe_video(path)?;

        let mut child = Command::new("ffmpeg")
            .arg("-i")
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-v", "quiet", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SourceError::Video(format!("ffmpeg failed to start: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SourceError::Video("ffmpeg stdout unavailable".to_string()))?;

        log::info!(
            "Opened video {}: {}x{}, {} frames, {:.2} fps",
            path.display(),
            meta.width,
            meta.height,
            meta.frame_count,
            meta.fps
        );

        let frame_size = meta.width * meta.height * 3;
        Ok(Self {
            path: path.to_path_buf(),
            meta,
            child,
            stdout,
            cursor: 0,
            buffer: vec![0u8; frame_size],
        })
    }

    pub fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    fn read_next(&mut self) -> Result<(), SourceError> {
        self.cursor += 1;
        self.stdout
            .read_exact(&mut self.buffer)
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

impl FrameSource for FfmpegSource {
    fn frame_count(&self) -> usize {
        self.meta.frame_count
    }

    fn native_fps(&self) -> f64 {
        self.meta.fps
    }

    fn read_frame(&mut self, index: usize) -> Result<Raster, SourceError> {
        if index < self.cursor {
            return Err(SourceError::Frame {
                index,
                reason: format!("stream already past frame {index}"),
            });
        }
        while self.cursor < index {
            self.read_next()?;
        }
        self.read_next()?;

        Raster::new(self.meta.width, self.meta.height, self.buffer.clone()).map_err(|e| {
            SourceError::Frame {
                index,
                reason: e.to_string(),
            }
        })
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), 30.0);
        assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("25"), 25.0);
        assert_eq!(parse_frame_rate("0/0"), DEFAULT_NATIVE_FPS);
    }
}
