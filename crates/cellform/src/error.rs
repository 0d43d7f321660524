//! Form errors.

use thiserror::Error;

/// Errors that can occur while building, drawing or polling a form.
///
/// # Recovery Strategies
///
/// | Error Variant | Recovery Strategy |
/// |--------------|-------------------|
/// | [`EmptyForm`](FormError::EmptyForm) | Register at least one text box before `start()` |
/// | [`DuplicateFieldName`](FormError::DuplicateFieldName) | Rename the field; the form is unchanged |
/// | [`DuplicateTabOrder`](FormError::DuplicateTabOrder) | Pick a free tab-order key; the form is unchanged |
/// | [`NotStarted`](FormError::NotStarted) | Call `start()` before delegating input |
/// | [`UnknownForm`](FormError::UnknownForm) | Register the form with the dispatcher |
/// | [`Surface`](FormError::Surface) | Terminal output failed; save state and exit |
/// | [`CoordinatorPanicked`](FormError::CoordinatorPanicked) | Bug; the form state may be partial |
///
/// # Note on Clone and PartialEq
///
/// This error type implements `Clone` and `PartialEq` to support testing and
/// comparison. As a result, the `Surface` variant stores a `String` message
/// rather than the underlying [`cellscreen::Error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// `start()` was called on a form without text boxes.
    #[error("form {0:?} has no text boxes, cannot start")]
    EmptyForm(String),

    /// A text box with this name is already registered.
    #[error("duplicate field name {name:?} in form {form:?}")]
    DuplicateFieldName {
        /// The form being built.
        form: String,
        /// The rejected field name.
        name: String,
    },

    /// Another text box already uses this tab-order key.
    #[error("tab order {tab_order} in form {form:?} is already used by field {existing:?}")]
    DuplicateTabOrder {
        /// The form being built.
        form: String,
        /// The rejected key.
        tab_order: i32,
        /// The field that owns the key.
        existing: String,
    },

    /// Input was delegated to a form that has not been started.
    #[error("form {0:?} has no focused field; call start() first")]
    NotStarted(String),

    /// A binding refers to a form that was never registered.
    #[error("unknown form {0:?}")]
    UnknownForm(String),

    /// Drawing to the terminal surface failed.
    #[error("surface error: {0}")]
    Surface(String),

    /// The thread running a form's poll loop died.
    #[error("poll coordinator for form {0:?} panicked")]
    CoordinatorPanicked(String),
}

impl FormError {
    /// Returns true for registration errors that left the form unchanged.
    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateFieldName { .. } | Self::DuplicateTabOrder { .. }
        )
    }
}

impl From<cellscreen::Error> for FormError {
    fn from(err: cellscreen::Error) -> Self {
        Self::Surface(err.to_string())
    }
}

/// A specialized [`Result`] type for form operations.
pub type Result<T> = std::result::Result<T, FormError>;
