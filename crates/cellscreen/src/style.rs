//! Cell styles.
//!
//! A [`Style`] is the foreground, background and attribute set applied to a
//! single cell. Styles are small `Copy` values built with chained setters:
//!
//! ```rust
//! use cellscreen::{Color, Style};
//!
//! let style = Style::new()
//!     .fg(Color::Ansi(0))
//!     .bg(Color::Ansi(15))
//!     .blink(true);
//! assert!(style.attrs.contains(cellscreen::Attributes::BLINK));
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::Color;

bitflags! {
    /// Text attributes for a cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Attributes: u8 {
        /// Bold / increased intensity.
        const BOLD = 1 << 0;
        /// Blinking text.
        const BLINK = 1 << 1;
        /// Swap foreground and background.
        const REVERSE = 1 << 2;
        /// Underlined text.
        const UNDERLINE = 1 << 3;
        /// Decreased intensity.
        const DIM = 1 << 4;
    }
}

/// Foreground, background and attributes of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Text attributes.
    pub attrs: Attributes,
}

impl Style {
    /// A style using the terminal defaults.
    pub const fn new() -> Self {
        Self {
            fg: Color::Reset,
            bg: Color::Reset,
            attrs: Attributes::empty(),
        }
    }

    /// Build a style from foreground and background color names.
    ///
    /// An empty or unrecognized name leaves that side at the terminal default.
    pub fn from_names(fg: &str, bg: &str) -> Self {
        Self::new()
            .fg(Color::from_name(fg).unwrap_or_default())
            .bg(Color::from_name(bg).unwrap_or_default())
    }

    /// Set the foreground color.
    pub const fn fg(mut self, color: Color) -> Self {
        self.fg = color;
        self
    }

    /// Set the background color.
    pub const fn bg(mut self, color: Color) -> Self {
        self.bg = color;
        self
    }

    /// Toggle blinking.
    pub fn blink(self, on: bool) -> Self {
        self.attr(Attributes::BLINK, on)
    }

    /// Toggle bold.
    pub fn bold(self, on: bool) -> Self {
        self.attr(Attributes::BOLD, on)
    }

    /// Toggle reverse video.
    pub fn reverse(self, on: bool) -> Self {
        self.attr(Attributes::REVERSE, on)
    }

    /// Toggle underline.
    pub fn underline(self, on: bool) -> Self {
        self.attr(Attributes::UNDERLINE, on)
    }

    fn attr(mut self, attr: Attributes, on: bool) -> Self {
        self.attrs.set(attr, on);
        self
    }
}
