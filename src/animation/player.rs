//! Threaded preview player.
//!
//! A render thread owns the presenter and runs at the configured rate: drain
//! queued commands, advance the engine, snapshot `(sequence, index)` under
//! the lock, then draw outside it. Loads from other threads swap the whole
//! sequence under the same lock, so a half-replaced sequence is never drawn.
//!
//! Usage:
//! ```ignore
//! let mut player = Player::spawn(AnsiPresenter::stdout(), &config.playback)?;
//! player.load(&sequence);
//! player.send(Command::TogglePlay);
//! player.wait()?;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use super::engine::{CancelToken, Command, LoadedSequence, PlaybackEngine, PlaybackStatus};
use super::present::Present;
use super::sequence::FrameSequence;
use crate::schema::PlaybackConfig;

/// Render thread lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Failed to spawn render thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Render loop did not exit within {0:?}")]
    ShutdownTimeout(Duration),
    #[error("Render thread panicked")]
    Panicked,
}

type SharedEngine = Arc<Mutex<PlaybackEngine>>;

// The engine holds no invariants a panicking presenter could break.
fn lock(engine: &SharedEngine) -> MutexGuard<'_, PlaybackEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable handle for feeding commands from input threads.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Queue a command. Returns false once the render loop has exited.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Fixed-rate pacing. Sleeps for whatever remains of each frame budget.
#[derive(Debug)]
pub struct FrameClock {
    budget: Duration,
    last: Instant,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            budget: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            last: Instant::now(),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left in the current frame.
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.last.elapsed())
    }

    /// Mark the end of a frame, returning the time since the previous mark.
    pub fn mark(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now - self.last;
        self.last = now;
        dt
    }
}

struct RenderLoop<P> {
    engine: SharedEngine,
    commands: Receiver<Command>,
    wake: Receiver<()>,
    cancel: CancelToken,
    presenter: P,
    clock: FrameClock,
}

impl<P: Present> RenderLoop<P> {
    fn run(mut self) {
        log::debug!("Render loop started ({:?} per frame)", self.clock.budget());

        while !self.cancel.is_cancelled() {
            let snapshot = {
                let mut engine = lock(&self.engine);
                loop {
                    match self.commands.try_recv() {
                        Ok(command) => {
                            engine.apply(command);
                            if command == Command::Stop {
                                self.cancel.cancel();
                            }
                        }
                        Err(TryRecvError::Empty) => break,
                        // Every handle is gone; nobody can stop us any other way.
                        Err(TryRecvError::Disconnected) => {
                            engine.stop();
                            self.cancel.cancel();
                            break;
                        }
                    }
                }
                if self.cancel.is_cancelled() {
                    break;
                }
                engine.tick();
                engine.snapshot()
            };

            match &snapshot {
                Some(snap) => {
                    let seq = &snap.sequence;
                    self.presenter.present(snap.pixels(), seq.width(), seq.height());
                }
                None => self.presenter.idle(),
            }

            // Sleep out the frame, waking early on stop.
            match self.wake.recv_timeout(self.clock.remaining()) {
                Ok(()) | Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.cancel.cancel(),
            }
            self.clock.mark();
        }

        self.presenter.release();
        log::debug!("Render loop exited");
    }
}

/// Runs a [`PlaybackEngine`] on a dedicated render thread.
pub struct Player {
    engine: SharedEngine,
    commands: Sender<Command>,
    wake: Sender<()>,
    cancel: CancelToken,
    exited: Receiver<()>,
    thread: Option<JoinHandle<()>>,
    stop_timeout: Duration,
    dimming: f32,
}

impl Player {
    /// Start the render loop with an empty, stopped engine.
    pub fn spawn<P>(presenter: P, config: &PlaybackConfig) -> Result<Self, PlaybackError>
    where
        P: Present + 'static,
    {
        let engine = PlaybackEngine::new(config.target_fps).with_dimming(config.led_dimming);
        Self::with_engine(engine, presenter, config)
    }

    /// Start the render loop around an existing engine.
    pub fn with_engine<P>(
        engine: PlaybackEngine,
        presenter: P,
        config: &PlaybackConfig,
    ) -> Result<Self, PlaybackError>
    where
        P: Present + 'static,
    {
        let fps = engine.target_fps();
        let dimming = engine.dimming();
        let engine = Arc::new(Mutex::new(engine));
        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        let (exited_tx, exited_rx) = crossbeam_channel::bounded::<()>(1);
        let cancel = CancelToken::new();

        let render = RenderLoop {
            engine: Arc::clone(&engine),
            commands: commands_rx,
            wake: wake_rx,
            cancel: cancel.clone(),
            presenter,
            clock: FrameClock::new(fps),
        };

        let thread = thread::Builder::new()
            .name("ledmatrix-render".into())
            .spawn(move || {
                render.run();
                let _ = exited_tx.send(());
            })
            .map_err(PlaybackError::Spawn)?;

        Ok(Self {
            engine,
            commands: commands_tx,
            wake: wake_tx,
            cancel,
            exited: exited_rx,
            thread: Some(thread),
            stop_timeout: Duration::from_millis(config.stop_timeout_ms),
            dimming,
        })
    }

    /// Replace the sequence; playback restarts paused on frame 0.
    ///
    /// Safe while the loop is drawing. A player whose loop has stopped is
    /// spent: `load` is then ignored and returns false.
    pub fn load(&self, sequence: &FrameSequence) -> bool {
        if self.cancel.is_cancelled() {
            log::warn!("Ignoring load: render loop has stopped");
            return false;
        }
        // Decode before taking the lock so the loop never waits on it.
        let loaded = Arc::new(LoadedSequence::from_sequence(sequence, self.dimming));
        lock(&self.engine).load_shared(loaded);
        true
    }

    /// Queue a command for the next frame.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            tx: self.commands.clone(),
        }
    }

    /// Engine status; always `Stopped` once the render loop is told to exit.
    pub fn status(&self) -> PlaybackStatus {
        if self.cancel.is_cancelled() {
            return PlaybackStatus::Stopped;
        }
        lock(&self.engine).status()
    }

    pub fn current_index(&self) -> usize {
        lock(&self.engine).current_index()
    }

    pub fn info(&self) -> String {
        lock(&self.engine).info()
    }

    /// True until the render loop has exited.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Block until the render loop exits on its own (a queued `Stop`).
    pub fn wait(&mut self) -> Result<(), PlaybackError> {
        let Some(handle) = self.thread.take() else {
            return Ok(());
        };
        let _ = self.exited.recv();
        handle.join().map_err(|_| PlaybackError::Panicked)
    }

    /// Stop playback and wait, bounded by the configured timeout, for the
    /// render loop to exit. Idempotent.
    ///
    /// On timeout the thread is detached and `ShutdownTimeout` returned.
    pub fn stop(&mut self) -> Result<(), PlaybackError> {
        self.cancel.cancel();
        lock(&self.engine).stop();
        let _ = self.wake.try_send(());

        let Some(handle) = self.thread.take() else {
            return Ok(());
        };

        match self.exited.recv_timeout(self.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                handle.join().map_err(|_| PlaybackError::Panicked)
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Render loop still running after {:?}; detaching",
                    self.stop_timeout
                );
                Err(PlaybackError::ShutdownTimeout(self.stop_timeout))
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Player shutdown: {e}");
        }
    }
}
