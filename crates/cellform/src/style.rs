//! Style helpers for text boxes.
//!
//! Thin wrappers over [`Style::from_names`] that encode the conventions of a
//! text box: cursor and fill cells never contain text, so only their
//! background matters.

use cellscreen::Style;

/// Build a style from a foreground and a background color name.
///
/// Empty or unknown names fall back to the terminal default.
pub fn style_helper(fg: &str, bg: &str) -> Style {
    Style::from_names(fg, bg)
}

/// Style for a cursor cell; only `bg` is visible.
pub fn style_cursor(bg: &str) -> Style {
    style_helper("black", bg)
}

/// Style for the empty fill of a text box; only `bg` is visible.
pub fn style_fill(bg: &str) -> Style {
    style_helper("black", bg)
}
