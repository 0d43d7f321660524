//! In-memory surface for testing without a terminal.
//!
//! [`MemoryScreen`] keeps a back buffer and a front buffer like a real
//! terminal surface: drawing goes to the back buffer and only becomes
//! inspectable after [`Surface::show`]. Input is scripted by posting events,
//! and the queue counters let tests assert who polled and when.
//!
//! # Example
//!
//! ```rust
//! use cellscreen::{Event, Key, MemoryScreen, Style, Surface};
//!
//! let screen = MemoryScreen::new(10, 1);
//! screen.type_str("ok");
//! screen.push_key(Key::Enter);
//!
//! assert_eq!(screen.poll_event(), Some(Event::char('o')));
//! assert_eq!(screen.poll_event(), Some(Event::char('k')));
//! assert_eq!(screen.poll_event(), Some(Event::key(Key::Enter)));
//! assert_eq!(screen.poll_count(), 3);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::Result;
use crate::event::{Event, Key};
use crate::queue::EventQueue;
use crate::style::Style;
use crate::surface::{Cell, Surface, cell_index};

struct Buffers {
    width: u16,
    height: u16,
    back: Vec<Cell>,
    front: Vec<Cell>,
}

impl Buffers {
    fn new(width: u16, height: u16) -> Self {
        let len = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            back: vec![Cell::default(); len],
            front: vec![Cell::default(); len],
        }
    }
}

/// A [`Surface`] backed by plain memory.
pub struct MemoryScreen {
    buffers: Mutex<Buffers>,
    queue: EventQueue,
    flushes: AtomicUsize,
}

impl std::fmt::Debug for MemoryScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.size();
        f.debug_struct("MemoryScreen")
            .field("width", &width)
            .field("height", &height)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl MemoryScreen {
    /// Create a blank screen of the given size.
    pub fn new(width: u16, height: u16) -> Arc<Self> {
        Arc::new(Self {
            buffers: Mutex::new(Buffers::new(width, height)),
            queue: EventQueue::new(),
            flushes: AtomicUsize::new(0),
        })
    }

    /// Queue a keystroke without modifiers.
    pub fn push_key(&self, key: Key) {
        self.push(Event::key(key));
    }

    /// Queue one character event per char of `text`.
    pub fn type_str(&self, text: &str) {
        for c in text.chars() {
            self.push(Event::char(c));
        }
    }

    /// Queue an arbitrary event. Events posted after [`close`](Self::close)
    /// are dropped.
    pub fn push(&self, event: Event) {
        let _ = self.queue.post(event);
    }

    /// Shut the input source down; blocked and future polls return `None`.
    pub fn close(&self) {
        self.queue.close();
    }

    /// The visible cell at `(x, y)`, if on screen.
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        let buffers = self.buffers.lock();
        cell_index(x, y, buffers.width, buffers.height).map(|i| buffers.front[i])
    }

    /// `len` visible characters starting at `(x, y)`; off-screen cells are
    /// skipped.
    pub fn text_at(&self, x: i32, y: i32, len: usize) -> String {
        (0..len as i32)
            .filter_map(|dx| self.cell(x + dx, y))
            .map(|cell| cell.ch)
            .collect()
    }

    /// The whole visible row `y`.
    pub fn row_text(&self, y: i32) -> String {
        let width = self.size().0;
        self.text_at(0, y, usize::from(width))
    }

    /// Number of completed [`Surface::show`] calls.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Total poll calls issued against this screen.
    pub fn poll_count(&self) -> usize {
        self.queue.poll_count()
    }

    /// Readers currently blocked in [`Surface::poll_event`].
    pub fn active_readers(&self) -> usize {
        self.queue.active_readers()
    }

    /// The largest number of readers ever blocked at once.
    pub fn max_concurrent_readers(&self) -> usize {
        self.queue.max_concurrent_readers()
    }

    /// Number of wake events handed to readers.
    pub fn wake_count(&self) -> usize {
        self.queue.wake_count()
    }

    /// Events queued but not yet polled.
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Wait until some reader is blocked on an empty queue.
    ///
    /// Returns `false` if that did not happen within `timeout`.
    pub fn wait_for_idle_reader(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.active_readers() > 0 && self.pending() == 0 {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }
}

impl Surface for MemoryScreen {
    fn set_content(&self, x: i32, y: i32, ch: char, style: Style) {
        let mut buffers = self.buffers.lock();
        if let Some(i) = cell_index(x, y, buffers.width, buffers.height) {
            buffers.back[i] = Cell { ch, style };
        }
    }

    fn show(&self) -> Result<()> {
        let mut buffers = self.buffers.lock();
        let Buffers { back, front, .. } = &mut *buffers;
        front.copy_from_slice(back);
        self.flushes.fetch_add(1, Ordering::SeqCst);
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
        self.queue.poll()
    }

    fn post_event(&self, event: Event) -> Result<()> {
        self.queue.post(event)
    }
}
