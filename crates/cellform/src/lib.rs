#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Cellform
//!
//! Single-line input forms drawn directly on a character-cell surface.
//!
//! Cellform provides:
//! - [`TextField`]: an editable box with a right-pinned sliding window,
//!   password masking and an optional description label
//! - [`Form`]: named boxes with a tab order and one focused box
//! - [`PollCoordinator`]: hands the surface's blocking input source to one
//!   form and takes it back on submit, escape or cancellation
//! - [`OuterDispatcher`]: the top-level loop that owns the input source and
//!   delegates to forms on bound keys
//! - [`spawn_submission_watcher`]: reads a form's values whenever it is
//!   submitted
//!
//! Exactly one reader polls the input source at any time. A delegation is
//! cancelled by posting a [`cellscreen::Event::Wake`] addressed to it into the
//! source, which is the only way to release a blocked reader.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cellform::{
//!     add_sample_text_boxes, spawn_submission_watcher, submission_channel, Action, Form,
//!     FormSet, OuterDispatcher,
//! };
//! use cellscreen::{ScreenOptions, TerminalScreen};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let screen = TerminalScreen::new(ScreenOptions::default())?;
//!
//! let forms = FormSet::new();
//! let mut form = Form::new("sample", screen.clone());
//! add_sample_text_boxes(&mut form)?;
//! form.start()?;
//! forms.insert(form);
//!
//! let (tx, rx) = submission_channel(16);
//! spawn_submission_watcher(rx, forms.clone(), |name, values| {
//!     println!("{name}: {values:?}");
//! });
//!
//! let mut dispatcher = OuterDispatcher::new(screen.clone(), forms, tx);
//! dispatcher.bind('j', Action::Delegate {
//!     form: "sample".into(),
//!     timeout: Some(Duration::from_secs(5)),
//! })?;
//! tokio::task::spawn_blocking(move || dispatcher.run()).await??;
//! screen.fini()?;
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod field;
pub mod form;
pub mod poll;
pub mod sample;
pub mod style;
pub mod submit;

pub use dispatch::{Action, DelegationRecord, DispatchSummary, ExitReason, OuterDispatcher};
pub use error::{FormError, Result};
pub use field::{MASK_GLYPH, TextBoxSpec, TextField};
pub use form::{Direction, Form, FormSet, SharedForm};
pub use poll::{CoordinatorState, DISPATCHER_WAKE, Delegation, Outcome, PollCoordinator};
pub use sample::{add_sample_text_boxes, sample_text_boxes};
pub use style::{style_cursor, style_fill, style_helper};
pub use submit::{DEFAULT_SUBMIT_CAPACITY, spawn_submission_watcher, submission_channel};
