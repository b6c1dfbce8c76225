//! Compute module - Color codec, downsampling and media sources.

mod color;
mod downsample;
mod sample;
mod sampling;
mod source;

#[cfg(feature = "video")]
pub mod video;

pub use color::*;
pub use downsample::*;
pub use sample::*;
pub use sampling::*;
pub use source::*;
