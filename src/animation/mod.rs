//! Frame files, sequences and preview playback.
//!
//! Converted media is stored as one JSON file per matrix frame, holding
//! RGB565 pixels plus width, height and metadata. Stills are written as
//! `<stem>.json`; sequences as `<stem>_frame_0000.json`,
//! `<stem>_frame_0001.json`, ... numbered by source frame index, so gaps
//! mark frames that were skipped.
//!
//! Sequences are loaded back from a glob pattern in natural order
//! (`f_2.json` before `f_10.json`) and previewed by a [`Player`], which runs a
//! [`PlaybackEngine`] on its own render thread.

mod engine;
mod format;
mod player;
mod present;
mod recorder;
mod sequence;

pub use engine::{
    CancelToken, Command, FrameSnapshot, LoadedSequence, PlaybackEngine, PlaybackState,
    PlaybackStatus, Step,
};
pub use format::{
    FRAME_EXTENSION, FRAME_NUMBER_WIDTH, decode_frame, encode_frame, read_frame_file,
    sequence_file_name, still_file_name, write_frame, write_frame_file,
};
pub use player::{CommandSender, FrameClock, PlaybackError, Player};
pub use present::{AnsiPresenter, Present};
pub use recorder::{RecordingStats, SequenceRecorder};
pub use sequence::{
    FrameSequence, expand_pattern, load_paths, load_sequence, natural_cmp, natural_sort,
};
