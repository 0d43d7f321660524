//! Delegated polling for one form.
//!
//! A [`PollCoordinator`] takes over the shared input source on behalf of a
//! single form. It runs on a blocking worker thread because
//! [`Surface::poll_event`](cellscreen::Surface::poll_event) blocks with no
//! timeout. The only way to interrupt it from outside is to put an event in
//! the same queue, so cancellation is a side task that waits on a
//! [`CancellationToken`] and posts [`Event::Wake`] carrying the delegation's
//! id. A wake with any other id was meant for someone else, usually an
//! earlier delegation that finished before its wake was read, and is skipped.
//!
//! # States
//!
//! ```text
//!   Idle --spawn--> Polling --enter/escape/wake/closed--> Closed
//!                      |                                   ^
//!                      +--token fired--> Cancelling --wake-+
//! ```
//!
//! Completion is reported exactly once through a oneshot channel carrying an
//! [`Outcome`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use cellscreen::{Event, Key, KeyEvent, SharedSurface};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{FormError, Result};
use crate::form::{Direction, SharedForm};

/// Wake id addressed to the top-level loop rather than a delegation.
pub const DISPATCHER_WAKE: u64 = 0;

static NEXT_DELEGATION_ID: AtomicU64 = AtomicU64::new(DISPATCHER_WAKE + 1);

/// Lifecycle of one delegation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Created, not yet polling.
    Idle,
    /// Sole reader of the input source.
    Polling,
    /// The cancellation source fired and a wake event is on its way.
    Cancelling,
    /// Finished; the completion signal has been sent.
    Closed,
}

/// How a delegation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Enter was pressed and the form name was published.
    Submitted,
    /// Escape was pressed.
    Escaped,
    /// The cancellation source fired.
    Cancelled,
    /// The input source shut down while polling.
    SourceClosed,
}

/// Runs one form's poll loop until a terminal keystroke or cancellation.
pub struct PollCoordinator {
    form: SharedForm,
    form_name: String,
    surface: SharedSurface,
    submit: mpsc::Sender<String>,
    cancel: Option<CancellationToken>,
    id: u64,
    state: Arc<Mutex<CoordinatorState>>,
    stale_wakes: Arc<AtomicUsize>,
}

impl std::fmt::Debug for PollCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollCoordinator")
            .field("form", &self.form_name)
            .field("id", &self.id)
            .field("cancellable", &self.cancel.is_some())
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl PollCoordinator {
    /// Prepare a delegation to `form`. Submissions are published on `submit`.
    pub fn new(form: SharedForm, submit: mpsc::Sender<String>) -> Self {
        let (form_name, surface) = {
            let guard = form.lock();
            (guard.name().to_string(), Arc::clone(guard.surface()))
        };
        Self {
            form,
            form_name,
            surface,
            submit,
            cancel: None,
            id: NEXT_DELEGATION_ID.fetch_add(1, Ordering::Relaxed),
            state: Arc::new(Mutex::new(CoordinatorState::Idle)),
            stale_wakes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// End the delegation when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Current state.
    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    /// The id carried by this delegation's wake event.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Start polling on a blocking worker.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(self) -> Delegation {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let (complete_tx, complete_rx) = oneshot::channel();
        let form = self.form_name.clone();
        let id = self.id;
        let state = Arc::clone(&self.state);
        let stale_wakes = Arc::clone(&self.stale_wakes);

        let watcher = self.cancel.clone().map(|token| {
            let surface = Arc::clone(&self.surface);
            let state = Arc::clone(&self.state);
            let form = self.form_name.clone();
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = done_rx => {
                        trace!(form = %form, "cancellation watcher stopped");
                    }
                    () = token.cancelled() => {
                        {
                            let mut state = state.lock();
                            if *state == CoordinatorState::Polling {
                                *state = CoordinatorState::Cancelling;
                            }
                        }
                        debug!(form = %form, id, "delegation cancelled, posting wake");
                        if let Err(err) = surface.post_event(Event::Wake(id)) {
                            warn!(form = %form, error = %err, "failed to post wake event");
                        }
                    }
                }
            })
        });

        tokio::task::spawn_blocking(move || {
            let coordinator = self;
            let result = coordinator.run();
            coordinator.set_state(CoordinatorState::Closed);
            drop(done_tx);
            if complete_tx.send(result).is_err() {
                trace!(form = %coordinator.form_name, "delegation result dropped");
            }
        });

        Delegation {
            form,
            id,
            state,
            stale_wakes,
            completion: complete_rx,
            watcher,
        }
    }

    fn set_state(&self, next: CoordinatorState) {
        let mut state = self.state.lock();
        trace!(form = %self.form_name, from = ?*state, to = ?next, "state change");
        *state = next;
    }

    fn run(&self) -> Result<Outcome> {
        {
            let form = self.form.lock();
            let Some(field) = form.focused() else {
                return Err(FormError::NotStarted(self.form_name.clone()));
            };
            field.show_cursor()?;
        }
        self.set_state(CoordinatorState::Polling);
        debug!(form = %self.form_name, "polling");

        loop {
            let Some(event) = self.surface.poll_event() else {
                self.hide_cursor()?;
                debug!(form = %self.form_name, "input source closed");
                return Ok(Outcome::SourceClosed);
            };
            match event {
                Event::Key(key) => {
                    if let Some(outcome) = self.handle_key(key)? {
                        return Ok(outcome);
                    }
                }
                Event::Wake(id) if id == self.id => {
                    self.hide_cursor()?;
                    return Ok(Outcome::Cancelled);
                }
                Event::Wake(id) => {
                    self.stale_wakes.fetch_add(1, Ordering::Relaxed);
                    debug!(form = %self.form_name, wake = id, "discarding stale wake");
                }
                other @ (Event::Resize { .. } | Event::Other) => {
                    trace!(form = %self.form_name, event = ?other, "ignored");
                }
            }
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Result<Option<Outcome>> {
        match &key.key {
            Key::Char(c) => {
                let mut form = self.form.lock();
                if let Some(field) = form.focused_mut() {
                    field.add(*c)?;
                }
            }
            Key::Tab => self.form.lock().tab(Direction::Forward)?,
            Key::BackTab => self.form.lock().tab(Direction::Backward)?,
            Key::Backspace => {
                let mut form = self.form.lock();
                if let Some(field) = form.focused_mut() {
                    field.back()?;
                }
            }
            Key::Enter => {
                self.hide_cursor()?;
                if let Err(err) = self.submit.blocking_send(self.form_name.clone()) {
                    warn!(form = %self.form_name, error = %err, "submission channel closed");
                }
                debug!(form = %self.form_name, "submitted");
                return Ok(Some(Outcome::Submitted));
            }
            Key::Esc => {
                self.hide_cursor()?;
                debug!(form = %self.form_name, "escaped");
                return Ok(Some(Outcome::Escaped));
            }
            Key::Ctrl(_) | Key::Other(_) => {
                trace!(form = %self.form_name, key = %key, "ignored");
            }
        }
        Ok(None)
    }

    fn hide_cursor(&self) -> Result<()> {
        let form = self.form.lock();
        if let Some(field) = form.focused() {
            field.hide_cursor()?;
        }
        Ok(())
    }
}

/// Handle to a running delegation.
#[derive(Debug)]
pub struct Delegation {
    form: String,
    id: u64,
    state: Arc<Mutex<CoordinatorState>>,
    stale_wakes: Arc<AtomicUsize>,
    completion: oneshot::Receiver<Result<Outcome>>,
    watcher: Option<JoinHandle<()>>,
}

impl Delegation {
    /// The form being polled.
    pub fn form(&self) -> &str {
        &self.form
    }

    /// The id carried by this delegation's wake event.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current coordinator state.
    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    /// Wakes addressed to someone else that this delegation read and skipped.
    pub fn stale_wakes(&self) -> usize {
        self.stale_wakes.load(Ordering::Relaxed)
    }

    pub(crate) fn stale_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.stale_wakes)
    }

    /// Block the calling thread until the delegation ends.
    ///
    /// Must not be called from an async context.
    pub fn wait(self) -> Result<Outcome> {
        let Self {
            form, completion, ..
        } = self;
        completion
            .blocking_recv()
            .map_err(|_| FormError::CoordinatorPanicked(form))?
    }

    /// Wait for the delegation to end from an async context.
    pub async fn finished(self) -> Result<Outcome> {
        let Self {
            form,
            completion,
            watcher,
            ..
        } = self;
        let result = completion
            .await
            .map_err(|_| FormError::CoordinatorPanicked(form))?;
        if let Some(watcher) = watcher {
            let _ = watcher.await;
        }
        result
    }
}
