//! LED matrix media conversion and preview.
//!
//! Turns images, animated GIFs and videos into sequences of RGB565 frames
//! sized for small LED panels, stores them as JSON, and plays them back.
//!
//! # Architecture
//!
//! - `compute`: RGB565 codec, color adjustment, block-average downsampling,
//!   frame sampling and media sources
//! - `schema`: The frame model and tool configuration
//! - `animation`: Frame files, sequence loading and the playback engine
//! - `convert`: Media to frame-file conversion built on the above
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use ledmatrix::{
//!     animation::{AnsiPresenter, Command, Player, load_sequence},
//!     convert::convert_path,
//!     schema::ToolConfig,
//! };
//!
//! let config = ToolConfig::default();
//! let report = convert_path(Path::new("clip.gif"), Path::new("out"), &config.convert)?;
//! println!("Wrote {}", report.stats);
//!
//! let sequence = load_sequence("out/clip_frame_*.json")?;
//! let mut player = Player::spawn(AnsiPresenter::stdout(), &config.playback)?;
//! player.load(&sequence);
//! player.send(Command::TogglePlay);
//! player.stop()?;
//! # Ok::<(), ledmatrix::Error>(())
//! ```

pub mod animation;
pub mod compute;
pub mod convert;
pub mod error;
pub mod schema;

pub use animation::{FrameSequence, PlaybackEngine, Player, load_sequence};
pub use compute::{Color16, Color24, ColorAdjust, decode16, downsample, encode16};
pub use error::{Error, Result};
pub use schema::{Frame, ToolConfig};
