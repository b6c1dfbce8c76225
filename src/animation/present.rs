//! Display surfaces for the render loop.

use std::fmt::Write as _;
use std::io::{self, Write};

use crate::compute::Color24;

/// A surface the render loop draws decoded frames onto.
///
/// `present` is called from the render thread only; `release` once after the
/// loop exits.
pub trait Present: Send {
    /// Draw one row-major `width` x `height` frame.
    fn present(&mut self, frame: &[Color24], width: usize, height: usize);

    /// Called on iterations with nothing to draw.
    fn idle(&mut self) {}

    /// Give back the display resource.
    fn release(&mut self) {}
}

/// Truecolor terminal preview, two LED rows per text line.
///
/// Each cell is an upper half block with the top pixel as foreground and the
/// bottom pixel as background. An odd last row is drawn against black.
pub struct AnsiPresenter<W: Write + Send> {
    out: W,
    buf: String,
    failed: bool,
}

impl AnsiPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> AnsiPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            buf: String::new(),
            failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, frame: &[Color24], width: usize, height: usize) {
        self.buf.clear();
        // Cursor home, redraw in place.
        self.buf.push_str("\x1b[H");

        for y in (0..height).step_by(2) {
            for x in 0..width {
                let top = frame[y * width + x];
                let bottom = if y + 1 < height {
                    frame[(y + 1) * width + x]
                } else {
                    Color24::BLACK
                };
                let _ = write!(
                    self.buf,
                    "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m\u{2580}",
                    top.r, top.g, top.b, bottom.r, bottom.g, bottom.b
                );
            }
            self.buf.push_str("\x1b[0m\n");
        }
    }

    fn flush(&mut self) {
        let result = self
            .out
            .write_all(self.buf.as_bytes())
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            // Report once; a closed terminal would otherwise flood the log.
            if !self.failed {
                log::warn!("Preview output failed: {e}");
                self.failed = true;
            }
        }
    }
}

impl<W: Write + Send> Present for AnsiPresenter<W> {
    fn present(&mut self, frame: &[Color24], width: usize, height: usize) {
        if frame.len() != width * height {
            log::warn!(
                "Dropping frame with {} pixels for {width}x{height} grid",
                frame.len()
            );
            return;
        }
        self.render(frame, width, height);
        self.flush();
    }

    fn release(&mut self) {
        self.buf.clear();
        self.buf.push_str("\x1b[0m");
        self.flush();
    }
}
