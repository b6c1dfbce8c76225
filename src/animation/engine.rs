//! Playback state machine.
//!
//! ```text
//!            load                 toggle_play
//! Stopped ─────────▶ Paused ◀──────────────────▶ Playing
//!    ▲                 │  ▲ seek(±1)                │ tick (wraps)
//!    └──── stop ───────┴──┴─────────────────────────┘
//! ```
//!
//! The engine itself is single-threaded; the render loop in
//! [`super::player`] shares it behind one mutex so `(sequence, index)` is
//! always read as a consistent pair.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::sequence::FrameSequence;
use crate::compute::Color24;

/// Externally visible playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Manual stepping direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Back,
    Forward,
}

/// Discrete input delivered to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePlay,
    Seek(Step),
    Stop,
}

/// Cancellation flag shared across threads. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Display-ready frames, decoded to 24-bit color once at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSequence {
    width: usize,
    height: usize,
    frames: Vec<Vec<Color24>>,
}

impl LoadedSequence {
    /// Expand every frame, scaling colors by `dimming` (1.0 keeps them).
    pub fn from_sequence(sequence: &FrameSequence, dimming: f32) -> Self {
        let (width, height) = sequence.dimensions().unwrap_or((0, 0));
        let frames = sequence
            .iter()
            .map(|frame| {
                let colors = frame.to_color24();
                if dimming == 1.0 {
                    colors
                } else {
                    colors.into_iter().map(|c| c.scale(dimming)).collect()
                }
            })
            .collect();

        Self {
            width,
            height,
            frames,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn frame(&self, index: usize) -> Option<&[Color24]> {
        self.frames.get(index).map(Vec::as_slice)
    }
}

/// One playback session over one loaded sequence.
///
/// A new state is created by every `load`; a terminated state is never revived.
#[derive(Debug)]
pub struct PlaybackState {
    sequence: Arc<LoadedSequence>,
    current_index: usize,
    playing: bool,
    target_fps: u32,
    terminate: CancelToken,
}

impl PlaybackState {
    fn new(sequence: Arc<LoadedSequence>, target_fps: u32) -> Self {
        Self {
            sequence,
            current_index: 0,
            playing: false,
            target_fps,
            terminate: CancelToken::new(),
        }
    }

    pub fn sequence(&self) -> &Arc<LoadedSequence> {
        &self.sequence
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Token set when this session is stopped.
    pub fn terminate_token(&self) -> &CancelToken {
        &self.terminate
    }
}

/// Frame selected for drawing, captured atomically with its sequence.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub sequence: Arc<LoadedSequence>,
    pub index: usize,
}

impl FrameSnapshot {
    pub fn pixels(&self) -> &[Color24] {
        self.sequence.frame(self.index).unwrap_or(&[])
    }
}

/// Play/pause/seek state machine over a loaded sequence.
#[derive(Debug)]
pub struct PlaybackEngine {
    session: Option<PlaybackState>,
    target_fps: u32,
    dimming: f32,
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PlaybackEngine {
    /// Create a stopped engine with nothing loaded.
    pub fn new(target_fps: u32) -> Self {
        Self {
            session: None,
            target_fps: target_fps.max(1),
            dimming: 1.0,
        }
    }

    /// Scale colors of subsequently loaded sequences by `dimming`.
    pub fn with_dimming(mut self, dimming: f32) -> Self {
        self.dimming = dimming.clamp(0.0, 1.0);
        self
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn dimming(&self) -> f32 {
        self.dimming
    }

    pub fn status(&self) -> PlaybackStatus {
        match &self.session {
            None => PlaybackStatus::Stopped,
            Some(s) if s.terminate.is_cancelled() => PlaybackStatus::Stopped,
            Some(s) if s.playing => PlaybackStatus::Playing,
            Some(_) => PlaybackStatus::Paused,
        }
    }

    /// Live session, if any (stopped sessions are still reported).
    pub fn session(&self) -> Option<&PlaybackState> {
        self.session.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.current_index)
    }

    pub fn frame_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.sequence.len())
    }

    /// Replace the sequence with a fresh session, paused on frame 0.
    pub fn load(&mut self, sequence: &FrameSequence) {
        let loaded = LoadedSequence::from_sequence(sequence, self.dimming);
        self.load_shared(Arc::new(loaded));
    }

    /// Like [`load`](Self::load) for an already decoded sequence.
    pub fn load_shared(&mut self, sequence: Arc<LoadedSequence>) {
        log::debug!("Loading {} frames", sequence.len());
        self.session = Some(PlaybackState::new(sequence, self.target_fps));
    }

    fn active_mut(&mut self) -> Option<&mut PlaybackState> {
        self.session
            .as_mut()
            .filter(|s| !s.terminate.is_cancelled() && !s.sequence.is_empty())
    }

    /// Playing <-> Paused. Ignored when stopped or empty.
    pub fn toggle_play(&mut self) {
        if let Some(s) = self.active_mut() {
            s.playing = !s.playing;
        }
    }

    /// Step one frame, clamped to the sequence. Always pauses.
    pub fn seek(&mut self, step: Step) {
        if let Some(s) = self.active_mut() {
            let last = s.sequence.len() - 1;
            s.current_index = match step {
                Step::Back => s.current_index.saturating_sub(1),
                Step::Forward => (s.current_index + 1).min(last),
            };
            s.playing = false;
        }
    }

    /// Advance one frame when playing, looping after the last frame.
    ///
    /// Returns whether the index moved.
    pub fn tick(&mut self) -> bool {
        match self.active_mut() {
            Some(s) if s.playing => {
                s.current_index = (s.current_index + 1) % s.sequence.len();
                true
            }
            _ => false,
        }
    }

    /// Terminate the session. Idempotent; a no-op with nothing loaded.
    pub fn stop(&mut self) {
        if let Some(s) = self.session.as_mut() {
            s.playing = false;
            s.terminate.cancel();
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::TogglePlay => self.toggle_play(),
            Command::Seek(step) => self.seek(step),
            Command::Stop => self.stop(),
        }
    }

    /// Current frame and its sequence, or `None` when nothing is drawable.
    pub fn snapshot(&self) -> Option<FrameSnapshot> {
        let s = self.session.as_ref()?;
        if s.terminate.is_cancelled() || s.sequence.is_empty() {
            return None;
        }
        Some(FrameSnapshot {
            sequence: Arc::clone(&s.sequence),
            index: s.current_index,
        })
    }

    /// Status line, e.g. `Frame: 3/12`.
    pub fn info(&self) -> String {
        format!("Frame: {}/{}", self.current_index() + 1, self.frame_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Color16;
    use crate::schema::Frame;

    fn sequence(len: usize) -> FrameSequence {
        let frames = (0..len)
            .map(|i| Frame::new(2, 1, vec![Color16(i as u16); 2]).unwrap())
            .collect();
        FrameSequence::new(frames).unwrap()
    }

    fn loaded(len: usize) -> PlaybackEngine {
        let mut engine = PlaybackEngine::new(30);
        engine.load(&sequence(len));
        engine
    }

    #[test]
    fn test_initial_state() {
        let engine = PlaybackEngine::default();
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert!(engine.snapshot().is_none());
    }

    #[test]
    fn test_load_pauses_at_zero() {
        let engine = loaded(5);
        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.frame_count(), 5);
    }

    #[test]
    fn test_tick_wraps() {
        let mut engine = loaded(5);
        engine.toggle_play();
        assert_eq!(engine.status(), PlaybackStatus::Playing);

        let mut seen = vec![engine.current_index()];
        for _ in 0..5 {
            assert!(engine.tick());
            seen.push(engine.current_index());
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn test_tick_paused_is_noop() {
        let mut engine = loaded(3);
        assert!(!engine.tick());
        assert_eq!(engine.current_index(), 0);
    }

    #[test]
    fn test_seek_clamps_and_pauses() {
        let mut engine = loaded(3);
        engine.toggle_play();
        engine.seek(Step::Back);
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.status(), PlaybackStatus::Paused);

        engine.seek(Step::Forward);
        engine.seek(Step::Forward);
        engine.toggle_play();
        engine.seek(Step::Forward);
        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.status(), PlaybackStatus::Paused);
    }

    #[test]
    fn test_empty_sequence_ignores_input() {
        let mut engine = loaded(0);
        assert_eq!(engine.status(), PlaybackStatus::Paused);
        engine.toggle_play();
        engine.seek(Step::Forward);
        assert!(!engine.tick());
        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert!(engine.snapshot().is_none());
    }

    #[test]
    fn test_stop_twice() {
        let mut engine = loaded(3);
        engine.toggle_play();
        engine.stop();
        engine.stop();
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert!(engine.session().unwrap().terminate_token().is_cancelled());

        // Stopped sessions ignore input.
        engine.toggle_play();
        engine.seek(Step::Forward);
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert_eq!(engine.current_index(), 0);

        let mut idle = PlaybackEngine::default();
        idle.stop();
        assert_eq!(idle.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_load_after_stop_is_new_session() {
        let mut engine = loaded(3);
        let old = engine.session().unwrap().terminate_token().clone();
        engine.stop();

        engine.load(&sequence(2));
        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert!(old.is_cancelled());
        assert!(!engine.session().unwrap().terminate_token().is_cancelled());
    }

    #[test]
    fn test_load_resets_index() {
        let mut engine = loaded(5);
        engine.seek(Step::Forward);
        engine.seek(Step::Forward);
        engine.toggle_play();

        engine.load(&sequence(2));
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert_eq!(engine.snapshot().unwrap().sequence.len(), 2);
    }

    #[test]
    fn test_snapshot_pixels() {
        let mut engine = loaded(3);
        engine.seek(Step::Forward);
        let snap = engine.snapshot().unwrap();
        assert_eq!(snap.index, 1);
        assert_eq!(snap.pixels().len(), 2);
        assert_eq!(engine.info(), "Frame: 2/3");
    }

    #[test]
    fn test_commands() {
        let mut engine = loaded(4);
        engine.apply(Command::Seek(Step::Forward));
        engine.apply(Command::TogglePlay);
        assert_eq!(engine.status(), PlaybackStatus::Playing);
        engine.apply(Command::Stop);
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_failed_load_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("bad_frame_0000.json"),
            r#"{"pixels": [1, 2, 3], "width": 2, "height": 2}"#,
        )
        .unwrap();

        let mut engine = loaded(4);
        engine.seek(Step::Forward);
        engine.seek(Step::Forward);

        let pattern = dir.path().join("bad_frame_*.json");
        let result = crate::animation::load_sequence(pattern.to_str().unwrap());
        assert!(result.is_err());
        if let Ok(seq) = result {
            engine.load(&seq);
        }

        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.frame_count(), 4);
    }

    #[test]
    fn test_dimming_applied_at_load() {
        let frame = Frame::new(1, 1, vec![Color16(0xFFFF)]).unwrap();
        let seq = FrameSequence::new(vec![frame]).unwrap();
        let mut engine = PlaybackEngine::new(30).with_dimming(0.2);
        engine.load(&seq);
        assert_eq!(engine.snapshot().unwrap().pixels(), &[Color24::new(51, 51, 51)]);
    }
}
