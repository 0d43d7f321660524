//! The top-level input loop.
//!
//! [`OuterDispatcher`] owns the shared input source while no form is active.
//! Bound characters either hand the source to a form through a
//! [`PollCoordinator`], reposition a form, or end the loop. While a form is
//! active the dispatcher blocks on the delegation and never polls.
//!
//! With a parent [`CancellationToken`] the loop ends as soon as the token is
//! cancelled, whether a form is active or the dispatcher itself is waiting
//! for a key.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use cellscreen::{Event, Key, SharedSurface};
use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{FormError, Result};
use crate::form::{FormSet, SharedForm};
use crate::poll::{DISPATCHER_WAKE, Outcome, PollCoordinator};

/// What a bound character does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Hand the input source to a form until it finishes.
    Delegate {
        /// Form name.
        form: String,
        /// Cancel the delegation after this long.
        timeout: Option<Duration>,
    },
    /// Clear the screen and redraw a form shifted by `(dx, dy)`.
    Shift {
        /// Form name.
        form: String,
        /// Column delta.
        dx: i32,
        /// Row delta.
        dy: i32,
    },
    /// Leave the loop.
    Exit,
}

impl Action {
    /// Delegate to `form` with no timeout.
    pub fn delegate(form: impl Into<String>) -> Self {
        Self::Delegate {
            form: form.into(),
            timeout: None,
        }
    }

    fn form(&self) -> Option<&str> {
        match self {
            Self::Delegate { form, .. } | Self::Shift { form, .. } => Some(form),
            Self::Exit => None,
        }
    }
}

/// Why [`OuterDispatcher::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitReason {
    /// The exit key or an exit binding was pressed.
    #[default]
    Requested,
    /// The input source shut down.
    SourceClosed,
    /// The parent cancellation token fired.
    Cancelled,
}

/// One finished delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRecord {
    /// Form that was active.
    pub form: String,
    /// How it ended.
    pub outcome: Outcome,
}

/// What happened during a dispatcher run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    /// Delegations in the order they ran.
    pub delegations: Vec<DelegationRecord>,
    /// Wake events read by someone they were not addressed to, such as a
    /// cancellation that lost the race with Enter or Escape.
    pub stale_wakes: usize,
    /// Why the loop ended.
    pub exit: ExitReason,
}

/// Top-level event loop.
pub struct OuterDispatcher {
    surface: SharedSurface,
    forms: FormSet,
    submit: mpsc::Sender<String>,
    bindings: IndexMap<char, Action>,
    exit_key: Key,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for OuterDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OuterDispatcher")
            .field("forms", &self.forms.names())
            .field("bindings", &self.bindings)
            .field("exit_key", &self.exit_key)
            .finish_non_exhaustive()
    }
}

impl OuterDispatcher {
    /// Create a dispatcher over `forms`, reading from `surface`.
    ///
    /// Ctrl+C exits by default.
    pub fn new(surface: SharedSurface, forms: FormSet, submit: mpsc::Sender<String>) -> Self {
        Self {
            surface,
            forms,
            submit,
            bindings: IndexMap::new(),
            exit_key: Key::Ctrl('c'),
            cancel: None,
        }
    }

    /// Use a different exit key.
    pub fn with_exit_key(mut self, key: Key) -> Self {
        self.exit_key = key;
        self
    }

    /// Derive every delegation's cancellation from `token`, and stop
    /// [`run`](Self::run) with [`ExitReason::Cancelled`] once it fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bind `key` to `action`, replacing any earlier binding.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnknownForm`] if the action names a form that is
    /// not registered.
    pub fn bind(&mut self, key: char, action: Action) -> Result<()> {
        if let Some(form) = action.form() {
            self.lookup(form)?;
        }
        debug!(key = %key, action = ?action, "binding");
        self.bindings.insert(key, action);
        Ok(())
    }

    /// The current bindings.
    pub fn bindings(&self) -> &IndexMap<char, Action> {
        &self.bindings
    }

    /// Poll and dispatch until the exit key is pressed, the source closes or
    /// the parent token is cancelled.
    ///
    /// This blocks; call it from a blocking thread inside a Tokio runtime,
    /// such as one started with `tokio::task::spawn_blocking`.
    pub fn run(&mut self) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();
        info!(forms = ?self.forms.names(), "dispatcher started");

        let watcher = self.cancel.clone().map(|token| {
            let surface = Arc::clone(&self.surface);
            tokio::spawn(async move {
                token.cancelled().await;
                debug!("dispatcher cancelled, posting wake");
                if let Err(err) = surface.post_event(Event::Wake(DISPATCHER_WAKE)) {
                    warn!(error = %err, "failed to post wake event");
                }
            })
        });
        let result = self.dispatch(&mut summary);
        if let Some(watcher) = watcher {
            watcher.abort();
        }
        result?;

        info!(
            delegations = summary.delegations.len(),
            stale_wakes = summary.stale_wakes,
            exit = ?summary.exit,
            "dispatcher stopped"
        );
        Ok(summary)
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    fn dispatch(&self, summary: &mut DispatchSummary) -> Result<()> {
        loop {
            if self.cancelled() {
                summary.exit = ExitReason::Cancelled;
                return Ok(());
            }
            let Some(event) = self.surface.poll_event() else {
                summary.exit = ExitReason::SourceClosed;
                return Ok(());
            };
            let key = match event {
                Event::Key(key) => key,
                Event::Wake(DISPATCHER_WAKE) => continue,
                Event::Wake(id) => {
                    debug!(wake = id, "discarding stale wake");
                    summary.stale_wakes += 1;
                    continue;
                }
                Event::Resize { .. } | Event::Other => continue,
            };

            if key.key == self.exit_key {
                summary.exit = ExitReason::Requested;
                return Ok(());
            }
            let Key::Char(c) = &key.key else {
                trace!(key = %key, "unbound");
                continue;
            };
            let Some(action) = self.bindings.get(c).cloned() else {
                trace!(key = %key, "unbound");
                continue;
            };

            match action {
                Action::Exit => {
                    summary.exit = ExitReason::Requested;
                    return Ok(());
                }
                Action::Shift { form, dx, dy } => {
                    debug!(form = %form, dx, dy, "repositioning");
                    self.lookup(&form)?.lock().clear_shift_xy(dx, dy)?;
                }
                Action::Delegate { form, timeout } => {
                    if self.cancelled() {
                        continue;
                    }
                    let outcome = self.delegate(&form, timeout, summary)?;
                    summary.delegations.push(DelegationRecord { form, outcome });
                    if outcome == Outcome::SourceClosed {
                        summary.exit = ExitReason::SourceClosed;
                        return Ok(());
                    }
                }
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<SharedForm> {
        self.forms
            .get(name)
            .ok_or_else(|| FormError::UnknownForm(name.to_string()))
    }

    fn delegate(
        &self,
        name: &str,
        timeout: Option<Duration>,
        summary: &mut DispatchSummary,
    ) -> Result<Outcome> {
        let form = self.lookup(name)?;
        let mut coordinator = PollCoordinator::new(form, self.submit.clone());

        let token = match (&self.cancel, timeout) {
            (Some(parent), _) => Some(parent.child_token()),
            (None, Some(_)) => Some(CancellationToken::new()),
            (None, None) => None,
        };
        let timer = match (&token, timeout) {
            (Some(token), Some(after)) => {
                let token = token.clone();
                Some(tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    token.cancel();
                }))
            }
            _ => None,
        };
        if let Some(token) = token {
            coordinator = coordinator.with_cancellation(token);
        }

        info!(form = %name, timeout = ?timeout, "delegating");
        let delegation = coordinator.spawn();
        let stale = delegation.stale_counter();
        let result = delegation.wait();
        if let Some(timer) = timer {
            timer.abort();
        }
        summary.stale_wakes += stale.load(Ordering::Relaxed);
        let outcome = result?;
        info!(form = %name, outcome = ?outcome, "delegation finished");
        Ok(outcome)
    }
}
