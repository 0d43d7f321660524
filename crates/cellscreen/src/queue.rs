//! The shared, blocking event queue behind every surface.
//!
//! Terminal input and injected events land in the same FIFO. Exactly one
//! reader is expected to block in [`EventQueue::poll`] at a time; any thread
//! may [`post`](EventQueue::post). Once [`close`](EventQueue::close)d, every
//! current and future poll returns `None` after the already-queued events
//! drain.
//!
//! The queue also keeps a few counters (polls issued, readers currently
//! blocked, the highest number of readers ever blocked at once, wake events
//! delivered). They cost a handful of atomics and make the single-reader
//! discipline observable in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::event::Event;

enum Slot {
    Event(Event),
    Shutdown,
}

struct Inner {
    tx: Sender<Slot>,
    rx: Mutex<Receiver<Slot>>,
    closed: AtomicBool,
    pending: AtomicUsize,
    polls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    wakes: AtomicUsize,
}

/// A cloneable handle to a blocking FIFO of [`Event`]s.
#[derive(Clone)]
pub struct EventQueue {
    inner: Arc<Inner>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("closed", &self.is_closed())
            .field("pending", &self.pending())
            .field("polls", &self.poll_count())
            .finish_non_exhaustive()
    }
}

impl EventQueue {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            inner: Arc::new(Inner {
                tx,
                rx: Mutex::new(rx),
                closed: AtomicBool::new(false),
                pending: AtomicUsize::new(0),
                polls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                wakes: AtomicUsize::new(0),
            }),
        }
    }

    /// Block until the next event arrives.
    ///
    /// Returns `None` once the queue has been closed and drained.
    pub fn poll(&self) -> Option<Event> {
        let inner = &self.inner;
        inner.polls.fetch_add(1, Ordering::SeqCst);
        let active = inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_active.fetch_max(active, Ordering::SeqCst);

        let slot = inner.rx.lock().recv();
        inner.active.fetch_sub(1, Ordering::SeqCst);

        match slot {
            Ok(Slot::Event(event)) => {
                inner.pending.fetch_sub(1, Ordering::SeqCst);
                if matches!(event, Event::Wake(_)) {
                    inner.wakes.fetch_add(1, Ordering::SeqCst);
                }
                Some(event)
            }
            Ok(Slot::Shutdown) | Err(_) => {
                // Keep the shutdown marker in place for the next reader.
                let _ = inner.tx.send(Slot::Shutdown);
                None
            }
        }
    }

    /// Append an event, waking a blocked reader if there is one.
    pub fn post(&self, event: Event) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
        self.inner.tx.send(Slot::Event(event)).map_err(|_| {
            self.inner.pending.fetch_sub(1, Ordering::SeqCst);
            Error::Closed
        })
    }

    /// Shut the queue down. Idempotent.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            let _ = self.inner.tx.send(Slot::Shutdown);
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Events posted but not yet polled.
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Total number of poll calls issued.
    pub fn poll_count(&self) -> usize {
        self.inner.polls.load(Ordering::SeqCst)
    }

    /// Readers currently inside [`poll`](Self::poll).
    pub fn active_readers(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// The largest number of readers that were ever inside `poll` together.
    pub fn max_concurrent_readers(&self) -> usize {
        self.inner.max_active.load(Ordering::SeqCst)
    }

    /// Number of [`Event::Wake`] events handed to readers.
    pub fn wake_count(&self) -> usize {
        self.inner.wakes.load(Ordering::SeqCst)
    }
}
