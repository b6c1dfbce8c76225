//! Source frame selection for multi-frame media.

use serde::{Deserialize, Serialize};

/// How frames are picked from a multi-frame source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SamplingStrategy {
    /// Keep every `floor(native_fps / fps)`-th frame (at least every frame).
    Rate {
        /// Requested output frames per second.
        fps: f64,
    },
    /// Pick `frames` evenly spaced frames across the whole source.
    Count {
        /// Requested number of output frames.
        frames: usize,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        SamplingStrategy::Count { frames: 30 }
    }
}

impl SamplingStrategy {
    /// Step between kept frames for `Rate` sampling.
    pub fn rate_interval(native_fps: f64, fps: f64) -> usize {
        if fps <= 0.0 || !native_fps.is_finite() {
            return 1;
        }
        ((native_fps / fps).floor() as usize).max(1)
    }

    /// Ascending source indices to decode, given the source frame count and rate.
    pub fn select(&self, total_frames: usize, native_fps: f64) -> Vec<usize> {
        if total_frames == 0 {
            return Vec::new();
        }

        match *self {
            SamplingStrategy::Rate { fps } => {
                let interval = Self::rate_interval(native_fps, fps);
                (0..total_frames).step_by(interval).collect()
            }
            SamplingStrategy::Count { frames } => {
                let n = frames.min(total_frames);
                if n == 0 {
                    return Vec::new();
                }
                let interval = total_frames / n;
                (0..n)
                    .map(|i| (i * interval).min(total_frames - 1))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_interval() {
        assert_eq!(SamplingStrategy::rate_interval(30.0, 10.0), 3);
        assert_eq!(SamplingStrategy::rate_interval(25.0, 10.0), 2);
        assert_eq!(SamplingStrategy::rate_interval(24.0, 30.0), 1);
        assert_eq!(SamplingStrategy::rate_interval(30.0, 0.0), 1);
    }

    #[test]
    fn test_rate_selection() {
        let s = SamplingStrategy::Rate { fps: 10.0 };
        assert_eq!(s.select(10, 30.0), vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_count_selection() {
        let s = SamplingStrategy::Count { frames: 4 };
        assert_eq!(s.select(10, 30.0), vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_count_clamped_to_total() {
        let s = SamplingStrategy::Count { frames: 30 };
        assert_eq!(s.select(5, 30.0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_source() {
        assert!(SamplingStrategy::default().select(0, 30.0).is_empty());
        assert!(SamplingStrategy::Count { frames: 0 }.select(8, 30.0).is_empty());
    }
}
