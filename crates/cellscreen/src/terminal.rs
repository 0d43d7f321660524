//! Crossterm-backed terminal surface.
//!
//! [`TerminalScreen`] puts the terminal into raw mode (and, by default, the
//! alternate screen), hides the hardware cursor, and starts a background
//! reader thread that decodes crossterm events into the shared
//! [`EventQueue`]. [`Surface::show`] writes only the cells that changed since
//! the previous flush.
//!
//! The terminal is restored by [`TerminalScreen::fini`], which also runs on
//! drop.
//!
//! ```rust,ignore
//! use cellscreen::{ScreenOptions, Surface, TerminalScreen};
//!
//! let screen = TerminalScreen::new(ScreenOptions::default())?;
//! while let Some(event) = screen.poll_event() {
//!     // ...
//! }
//! screen.fini()?;
//! ```

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event, execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::event::Event;
use crate::queue::EventQueue;
use crate::style::{Attributes, Style};
use crate::surface::{Cell, Surface, cell_index};

/// Terminal setup options.
#[derive(Debug, Clone)]
pub struct ScreenOptions {
    /// Use the alternate screen buffer.
    pub alt_screen: bool,
    /// How often the reader thread wakes to check for shutdown.
    pub poll_interval: Duration,
}

impl Default for ScreenOptions {
    fn default() -> Self {
        Self {
            alt_screen: true,
            poll_interval: Duration::from_millis(100),
        }
    }
}

struct Buffers {
    width: u16,
    height: u16,
    back: Vec<Cell>,
    // `None` means "unknown", forcing the cell out on the next flush.
    front: Vec<Option<Cell>>,
    full_repaint: bool,
}

impl Buffers {
    fn new(width: u16, height: u16) -> Self {
        let len = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            back: vec![Cell::default(); len],
            front: vec![None; len],
            full_repaint: true,
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let mut next = Self::new(width, height);
        for y in 0..self.height.min(height) {
            for x in 0..self.width.min(width) {
                let (x, y) = (i32::from(x), i32::from(y));
                if let (Some(old), Some(new)) = (
                    cell_index(x, y, self.width, self.height),
                    cell_index(x, y, width, height),
                ) {
                    next.back[new] = self.back[old];
                }
            }
        }
        *self = next;
    }
}

/// A [`Surface`] drawing to the process's terminal.
pub struct TerminalScreen {
    buffers: Mutex<Buffers>,
    queue: EventQueue,
    out: Mutex<Stdout>,
    options: ScreenOptions,
    reader_cancel: CancellationToken,
    reader: Mutex<Option<JoinHandle<()>>>,
    finished: AtomicBool,
}

impl std::fmt::Debug for TerminalScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalScreen")
            .field("options", &self.options)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl TerminalScreen {
    /// Take over the terminal and start reading input.
    pub fn new(options: ScreenOptions) -> Result<Arc<Self>> {
        enable_raw_mode().map_err(|source| Error::RawModeFailure {
            action: "enable",
            source,
        })?;

        let mut out = io::stdout();
        if options.alt_screen
            && let Err(source) = execute!(out, EnterAlternateScreen)
        {
            let _ = disable_raw_mode();
            return Err(Error::AltScreenFailure {
                action: "enter",
                source,
            });
        }
        execute!(out, Hide, Clear(ClearType::All))?;

        let (width, height) = terminal::size()?;
        let queue = EventQueue::new();
        let reader_cancel = CancellationToken::new();
        let reader = spawn_reader(queue.clone(), reader_cancel.clone(), options.poll_interval)?;
        debug!(width, height, "terminal screen initialized");

        Ok(Arc::new(Self {
            buffers: Mutex::new(Buffers::new(width, height)),
            queue,
            out: Mutex::new(out),
            options,
            reader_cancel,
            reader: Mutex::new(Some(reader)),
            finished: AtomicBool::new(false),
        }))
    }

    /// Stop the reader thread and restore the terminal. Idempotent.
    ///
    /// Any reader blocked in [`Surface::poll_event`] is released with `None`.
    pub fn fini(&self) -> Result<()> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.reader_cancel.cancel();
        if let Some(handle) = self.reader.lock().take() {
            let _ = handle.join();
        }
        self.queue.close();

        let mut out = self.out.lock();
        execute!(out, SetAttribute(Attribute::Reset), ResetColor, Show)?;
        if self.options.alt_screen {
            execute!(out, LeaveAlternateScreen).map_err(|source| Error::AltScreenFailure {
                action: "exit",
                source,
            })?;
        }
        disable_raw_mode().map_err(|source| Error::RawModeFailure {
            action: "disable",
            source,
        })?;
        debug!("terminal screen restored");
        Ok(())
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = self.fini();
    }
}

fn spawn_reader(
    queue: EventQueue,
    cancel: CancellationToken,
    interval: Duration,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("cellscreen-input".into())
        .spawn(move || {
            loop {
                if cancel.is_cancelled() {
                    break;
                }
                // Poll with timeout to check cancellation
                match event::poll(interval) {
                    Ok(true) => match event::read() {
                        Ok(raw) => {
                            if let Some(event) = Event::from_crossterm(raw)
                                && queue.post(event).is_err()
                            {
                                break;
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "failed to read terminal event");
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(err) => {
                        warn!(error = %err, "failed to poll terminal events");
                        break;
                    }
                }
            }
            debug!("input reader stopped");
            queue.close();
        })?;
    Ok(handle)
}

fn queue_style<W: Write>(out: &mut W, style: Style) -> io::Result<()> {
    queue!(
        out,
        SetAttribute(Attribute::Reset),
        SetForegroundColor(style.fg.to_crossterm()),
        SetBackgroundColor(style.bg.to_crossterm())
    )?;
    let attrs = [
        (Attributes::BOLD, Attribute::Bold),
        (Attributes::DIM, Attribute::Dim),
        (Attributes::BLINK, Attribute::SlowBlink),
        (Attributes::REVERSE, Attribute::Reverse),
        (Attributes::UNDERLINE, Attribute::Underlined),
    ];
    for (flag, attr) in attrs {
        if style.attrs.contains(flag) {
            queue!(out, SetAttribute(attr))?;
        }
    }
    Ok(())
}

impl Surface for TerminalScreen {
    fn set_content(&self, x: i32, y: i32, ch: char, style: Style) {
        let mut buffers = self.buffers.lock();
        if let Some(i) = cell_index(x, y, buffers.width, buffers.height) {
            buffers.back[i] = Cell { ch, style };
        }
    }

    fn show(&self) -> Result<()> {
        let mut buffers = self.buffers.lock();
        let mut out = self.out.lock();
        let full = buffers.full_repaint;
        if full {
            queue!(out, SetAttribute(Attribute::Reset), ResetColor, Clear(ClearType::All))?;
        }

        let Buffers {
            width, back, front, ..
        } = &mut *buffers;
        let width = usize::from(*width);
        let mut last_style: Option<Style> = None;
        for (i, (cell, seen)) in back.iter().zip(front.iter_mut()).enumerate() {
            if !full && *seen == Some(*cell) {
                continue;
            }
            queue!(out, MoveTo((i % width) as u16, (i / width) as u16))?;
            if last_style != Some(cell.style) {
                queue_style(&mut *out, cell.style)?;
                last_style = Some(cell.style);
            }
            queue!(out, Print(cell.ch))?;
            *seen = Some(*cell);
        }

        queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        out.flush()?;
        buffers.full_repaint = false;
        Ok(())
    }

    fn clear(&self) {
        let mut buffers = self.buffers.lock();
        buffers.back.fill(Cell::default());
    }

    fn size(&self) -> (u16, u16) {
        let buffers = self.buffers.lock();
        (buffers.width, buffers.height)
    }

    fn poll_event(&self) -> Option<Event> {
        let event = self.queue.poll();
        if let Some(Event::Resize { width, height }) = event {
            self.buffers.lock().resize(width, height);
        }
        event
    }

    fn post_event(&self, event: Event) -> Result<()> {
        self.queue.post(event)
    }
}
