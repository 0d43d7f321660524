//! The surface abstraction shared by forms and event loops.

use std::sync::Arc;

use crate::error::Result;
use crate::event::Event;
use crate::style::Style;

/// One character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The character drawn in the cell.
    pub ch: char,
    /// The cell's style.
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            style: Style::default(),
        }
    }
}

/// A cell-addressable screen with a single blocking input source.
///
/// Drawing is buffered: [`set_content`](Surface::set_content) and
/// [`clear`](Surface::clear) only touch the back buffer, and
/// [`show`](Surface::show) makes the changes visible.
///
/// Input is a FIFO shared by everything that holds the surface. At most one
/// caller should block in [`poll_event`](Surface::poll_event) at a time; the
/// only way to unblock it from another thread is to
/// [`post_event`](Surface::post_event), typically an [`Event::Wake`].
pub trait Surface: Send + Sync {
    /// Set one cell of the back buffer. Out-of-range coordinates are ignored.
    fn set_content(&self, x: i32, y: i32, ch: char, style: Style);

    /// Flush the back buffer to the screen.
    fn show(&self) -> Result<()>;

    /// Blank the whole back buffer.
    fn clear(&self);

    /// Current size in columns and rows.
    fn size(&self) -> (u16, u16);

    /// Block until the next event. `None` once the source has shut down.
    fn poll_event(&self) -> Option<Event>;

    /// Inject an event into the input queue.
    fn post_event(&self, event: Event) -> Result<()>;
}

/// A surface shared between the dispatcher, coordinators and forms.
pub type SharedSurface = Arc<dyn Surface>;

/// Flat index of `(x, y)` in a `width * height` buffer.
pub(crate) fn cell_index(x: i32, y: i32, width: u16, height: u16) -> Option<usize> {
    if x < 0 || y < 0 || x >= i32::from(width) || y >= i32::from(height) {
        return None;
    }
    Some(y as usize * usize::from(width) + x as usize)
}
