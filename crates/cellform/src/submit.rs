//! Submission channel and watcher.
//!
//! Poll coordinators publish the name of a submitted form; a long-lived task
//! drains those names and reads the form's values.

use indexmap::IndexMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::form::FormSet;

/// Default capacity of the submission channel.
pub const DEFAULT_SUBMIT_CAPACITY: usize = 16;

/// Create a bounded submission channel.
///
/// A publisher blocks when the channel is full, so keep a watcher draining
/// the receiver.
pub fn submission_channel(capacity: usize) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
    mpsc::channel(capacity.max(1))
}

/// Drain `rx`, calling `on_submit` with each submitted form's values.
///
/// The task ends when every sender is dropped. Names that do not match a
/// registered form are logged and skipped.
pub fn spawn_submission_watcher<F>(
    mut rx: mpsc::Receiver<String>,
    forms: FormSet,
    mut on_submit: F,
) -> JoinHandle<()>
where
    F: FnMut(&str, IndexMap<String, String>) + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(name) = rx.recv().await {
            let Some(form) = forms.get(&name) else {
                warn!(form = %name, "submission for unknown form");
                continue;
            };
            let values = form.lock().collect();
            info!(form = %name, fields = values.len(), "form submitted");
            on_submit(&name, values);
        }
    })
}
