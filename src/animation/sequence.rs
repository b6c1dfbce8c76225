//! Ordered, same-sized frame collections and their loading from disk.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::format::read_frame_file;
use crate::error::{Error, Result};
use crate::schema::{FormatError, Frame};

/// Frames sharing one `(width, height)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    /// Build a sequence, rejecting frames whose dimensions differ from the first.
    pub fn new(frames: Vec<Frame>) -> std::result::Result<Self, FormatError> {
        if let Some(first) = frames.first() {
            let (w, h) = first.dimensions();
            if let Some(bad) = frames.iter().find(|f| f.dimensions() != (w, h)) {
                return Err(FormatError::DimensionMismatch {
                    expected_width: w,
                    expected_height: h,
                    found_width: bad.width(),
                    found_height: bad.height(),
                });
            }
        }
        Ok(Self { frames })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Shared `(width, height)`, or `None` when empty.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.frames.first().map(Frame::dimensions)
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Compare strings treating runs of ASCII digits as numbers.
///
/// `f_2` sorts before `f_10`. Equal numeric values with different zero
/// padding fall back to comparing the raw digits so the order stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);

    loop {
        match (a.chars().next(), b.chars().next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let (na, rest_a) = split_digits(a);
                let (nb, rest_b) = split_digits(b);
                let ord = compare_numeric(na, nb).then_with(|| na.cmp(nb));
                if ord != Ordering::Equal {
                    return ord;
                }
                a = rest_a;
                b = rest_b;
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(&cb);
                }
                a = &a[ca.len_utf8()..];
                b = &b[cb.len_utf8()..];
            }
        }
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Compare digit strings by value without parsing (no overflow).
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort paths naturally by their full textual form.
pub fn natural_sort(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));
}

/// Expand a glob pattern into a naturally sorted file list.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|source| Error::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => {
                return Err(Error::Io {
                    path: e.path().to_path_buf(),
                    source: std::io::Error::from(e),
                });
            }
        }
    }

    natural_sort(&mut paths);
    Ok(paths)
}

/// Decode the given files, in order, into one sequence.
///
/// Fails on the first unreadable or invalid file and on the first frame
/// whose dimensions differ from the first frame.
pub fn load_paths(paths: &[PathBuf]) -> Result<FrameSequence> {
    let mut frames: Vec<Frame> = Vec::with_capacity(paths.len());

    for path in paths {
        let frame = read_frame_file(path)?;
        if let Some(first) = frames.first() {
            check_dimensions(path, first, &frame)?;
        }
        frames.push(frame);
    }

    FrameSequence::new(frames).map_err(|source| Error::Format {
        path: paths.first().cloned().unwrap_or_default(),
        source,
    })
}

fn check_dimensions(path: &Path, first: &Frame, frame: &Frame) -> Result<()> {
    if frame.dimensions() == first.dimensions() {
        return Ok(());
    }
    Err(Error::Format {
        path: path.to_path_buf(),
        source: FormatError::DimensionMismatch {
            expected_width: first.width(),
            expected_height: first.height(),
            found_width: frame.width(),
            found_height: frame.height(),
        },
    })
}

/// Expand `pattern`, natural-sort the matches and decode them.
///
/// A pattern matching nothing yields an empty sequence.
pub fn load_sequence(pattern: &str) -> Result<FrameSequence> {
    let paths = expand_pattern(pattern)?;
    if paths.is_empty() {
        log::warn!("No frame files match {pattern}");
        return Ok(FrameSequence::empty());
    }

    let sequence = load_paths(&paths)?;
    if let Some((w, h)) = sequence.dimensions() {
        log::info!("Loaded {} frames ({w}x{h}) from {pattern}", sequence.len());
    }
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::format::write_frame_file;
    use crate::compute::Color16;

    fn frame(width: usize, height: usize, value: u16) -> Frame {
        Frame::new(width, height, vec![Color16(value); width * height]).unwrap()
    }

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["f_2.json", "f_10.json", "f_1.json"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["f_1.json", "f_2.json", "f_10.json"]);
    }

    #[test]
    fn test_natural_cmp_padding_and_text() {
        assert_eq!(natural_cmp("clip_frame_0009", "clip_frame_0010"), Ordering::Less);
        assert_eq!(natural_cmp("a9", "b1"), Ordering::Less);
        assert_eq!(natural_cmp("x", "x1"), Ordering::Less);
        assert_eq!(natural_cmp("a01", "a1"), Ordering::Less);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
        assert_eq!(
            natural_cmp("n99999999999999999999999", "n100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn test_sequence_rejects_mixed_sizes() {
        let err = FrameSequence::new(vec![frame(2, 2, 0), frame(3, 2, 0)]).unwrap_err();
        assert!(matches!(
            err,
            FormatError::DimensionMismatch {
                expected_width: 2,
                found_width: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_load_sequence_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, value) in [("f_2.json", 2), ("f_10.json", 10), ("f_1.json", 1)] {
            write_frame_file(&dir.path().join(name), &frame(2, 1, value)).unwrap();
        }

        let pattern = dir.path().join("f_*.json");
        let seq = load_sequence(pattern.to_str().unwrap()).unwrap();
        let order: Vec<u16> = seq.iter().map(|f| f.pixels()[0].0).collect();
        assert_eq!(order, vec![1, 2, 10]);
        assert_eq!(seq.dimensions(), Some((2, 1)));
    }

    #[test]
    fn test_load_sequence_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        write_frame_file(&dir.path().join("f_1.json"), &frame(2, 2, 0)).unwrap();
        write_frame_file(&dir.path().join("f_2.json"), &frame(4, 1, 0)).unwrap();

        let pattern = dir.path().join("f_*.json");
        let err = load_sequence(pattern.to_str().unwrap()).unwrap_err();
        match err {
            Error::Format { path, source } => {
                assert!(path.ends_with("f_2.json"));
                assert!(matches!(source, FormatError::DimensionMismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_sequence_bad_frame() {
        let dir = tempfile::tempdir().unwrap();
        write_frame_file(&dir.path().join("f_1.json"), &frame(2, 2, 0)).unwrap();
        std::fs::write(
            dir.path().join("f_2.json"),
            r#"{"pixels": [1, 2, 3], "width": 2, "height": 2}"#,
        )
        .unwrap();

        let pattern = dir.path().join("f_*.json");
        let err = load_sequence(pattern.to_str().unwrap()).unwrap_err();
        assert!(matches!(
            err,
            Error::Format {
                source: FormatError::PixelCount { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_load_sequence_no_matches() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = dir.path().join("missing_*.json");
        let seq = load_sequence(pattern.to_str().unwrap()).unwrap();
        assert!(seq.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            load_sequence("frames/[.json"),
            Err(Error::Pattern { .. })
        ));
    }
}
