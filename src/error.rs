//! Crate-level error type.

use std::io;
use std::path::PathBuf;

use crate::animation::PlaybackError;
use crate::compute::{DimensionError, SourceError};
use crate::schema::{ConfigError, FormatError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by conversion, sequence loading and playback.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    #[error(transparent)]
    Frame(#[from] FormatError),
    #[error(transparent)]
    Dimension(#[from] DimensionError),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Invalid frame pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
