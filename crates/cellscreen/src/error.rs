//! Errors raised by terminal surfaces.

use std::io;

/// Errors that can occur while driving a terminal surface.
///
/// # Recovery Strategies
///
/// | Error Variant | Recovery Strategy |
/// |--------------|-------------------|
/// | [`Io`](Error::Io) | Check terminal availability, retry, or report to user |
/// | [`RawModeFailure`](Error::RawModeFailure) | Check terminal compatibility |
/// | [`AltScreenFailure`](Error::AltScreenFailure) | Disable the alternate screen option |
/// | [`Closed`](Error::Closed) | The event source shut down; stop posting |
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O error during terminal operations.
    ///
    /// Typically a closed or disconnected terminal, or a failed write while
    /// flushing cells.
    #[error("terminal io error: {0}")]
    Io(#[from] io::Error),

    /// Failed to enable or disable raw mode.
    #[error("failed to {action} raw mode: {source}")]
    RawModeFailure {
        /// Whether we were trying to enable or disable raw mode.
        action: &'static str,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to enter or exit the alternate screen.
    #[error("failed to {action} alternate screen: {source}")]
    AltScreenFailure {
        /// Whether we were trying to enter or exit the alt screen.
        action: &'static str,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The event source has been shut down.
    ///
    /// Returned by [`Surface::post_event`](crate::Surface::post_event) once the
    /// surface is finalized; nothing will ever read the event.
    #[error("event source is closed")]
    Closed,
}

/// A specialized [`Result`] type for surface operations.
pub type Result<T> = std::result::Result<T, Error>;
