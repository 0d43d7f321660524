//! Terminal colors and color-name resolution.
//!
//! A [`Color`] is either the terminal default, one of the 256 ANSI palette
//! entries, or a 24-bit RGB value. Colors can be resolved from:
//! - W3C-style names (`"grey"`, `"navy"`, `"orange"`)
//! - ANSI palette numbers (`"196"`)
//! - Hex strings (`"#ff8800"` or `"#f80"`)
//!
//! # Example
//!
//! ```rust
//! use cellscreen::Color;
//!
//! assert_eq!(Color::from_name("red"), Some(Color::Ansi(9)));
//! assert_eq!(Color::from_name("#0000ff"), Some(Color::Rgb(0, 0, 255)));
//! assert_eq!(Color::from_name("nonsense"), None);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A terminal color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    /// The terminal's default color.
    #[default]
    Reset,
    /// ANSI palette color by number.
    Ansi(u8),
    /// True color.
    Rgb(u8, u8, u8),
}

// The sixteen system colors map onto the ANSI palette; everything else is RGB.
const NAMED: &[(&str, Color)] = &[
    ("black", Color::Ansi(0)),
    ("maroon", Color::Ansi(1)),
    ("green", Color::Ansi(2)),
    ("olive", Color::Ansi(3)),
    ("navy", Color::Ansi(4)),
    ("purple", Color::Ansi(5)),
    ("teal", Color::Ansi(6)),
    ("silver", Color::Ansi(7)),
    ("gray", Color::Ansi(8)),
    ("grey", Color::Ansi(8)),
    ("red", Color::Ansi(9)),
    ("lime", Color::Ansi(10)),
    ("yellow", Color::Ansi(11)),
    ("blue", Color::Ansi(12)),
    ("fuchsia", Color::Ansi(13)),
    ("aqua", Color::Ansi(14)),
    ("white", Color::Ansi(15)),
    ("orange", Color::Rgb(0xff, 0xa5, 0x00)),
    ("darkorange", Color::Rgb(0xff, 0x8c, 0x00)),
    ("gold", Color::Rgb(0xff, 0xd7, 0x00)),
    ("pink", Color::Rgb(0xff, 0xc0, 0xcb)),
    ("hotpink", Color::Rgb(0xff, 0x69, 0xb4)),
    ("magenta", Color::Rgb(0xff, 0x00, 0xff)),
    ("cyan", Color::Rgb(0x00, 0xff, 0xff)),
    ("brown", Color::Rgb(0xa5, 0x2a, 0x2a)),
    ("darkgray", Color::Rgb(0xa9, 0xa9, 0xa9)),
    ("darkgrey", Color::Rgb(0xa9, 0xa9, 0xa9)),
    ("lightgray", Color::Rgb(0xd3, 0xd3, 0xd3)),
    ("lightgrey", Color::Rgb(0xd3, 0xd3, 0xd3)),
    ("dimgray", Color::Rgb(0x69, 0x69, 0x69)),
    ("dimgrey", Color::Rgb(0x69, 0x69, 0x69)),
    ("darkgreen", Color::Rgb(0x00, 0x64, 0x00)),
    ("darkblue", Color::Rgb(0x00, 0x00, 0x8b)),
    ("darkred", Color::Rgb(0x8b, 0x00, 0x00)),
    ("lightblue", Color::Rgb(0xad, 0xd8, 0xe6)),
    ("lightgreen", Color::Rgb(0x90, 0xee, 0x90)),
    ("skyblue", Color::Rgb(0x87, 0xce, 0xeb)),
    ("steelblue", Color::Rgb(0x46, 0x82, 0xb4)),
    ("violet", Color::Rgb(0xee, 0x82, 0xee)),
    ("indigo", Color::Rgb(0x4b, 0x00, 0x82)),
    ("crimson", Color::Rgb(0xdc, 0x14, 0x3c)),
    ("salmon", Color::Rgb(0xfa, 0x80, 0x72)),
    ("tan", Color::Rgb(0xd2, 0xb4, 0x8c)),
    ("khaki", Color::Rgb(0xf0, 0xe6, 0x8c)),
];

impl Color {
    /// Resolve a color from a name, ANSI number or hex string.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// `"reset"` and `"default"` resolve to [`Color::Reset`]. Returns `None`
    /// for anything unrecognized.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name == "reset" || name == "default" {
            return Some(Self::Reset);
        }
        if let Some(hex) = name.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Ok(n) = name.parse::<u8>() {
            return Some(Self::Ansi(n));
        }
        NAMED
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, color)| *color)
    }

    /// Returns true for the terminal default color.
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset)
    }

    /// Convert to the crossterm color used when writing to a terminal.
    pub fn to_crossterm(self) -> crossterm::style::Color {
        match self {
            Self::Reset => crossterm::style::Color::Reset,
            Self::Ansi(n) => crossterm::style::Color::AnsiValue(n),
            Self::Rgb(r, g, b) => crossterm::style::Color::Rgb { r, g, b },
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => write!(f, "reset"),
            Self::Ansi(n) => write!(f, "{n}"),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// Error returned when a string does not name a color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color: {0:?}")]
pub struct ParseColorError(pub String);

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_name(&value).ok_or(ParseColorError(value))
    }
}

impl std::str::FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseColorError(s.to_string()))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
