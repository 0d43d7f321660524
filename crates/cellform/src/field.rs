//! Single-line text boxes.
//!
//! A [`TextField`] owns its content and draws itself directly onto the
//! shared surface. Its width is a display width only: content may grow
//! without bound, and once it is longer than the box the last `width`
//! characters are shown (a sliding window pinned to the right edge).
//!
//! The cursor occupies the cell just past the last visible character, so it
//! always lies in `[x, x + width]`; the fill region covers that extra cell
//! as well.
//!
//! ```text
//!   width = 5, content = "abcdefg"
//!
//!   x ->  c d e f g _      ("ab" scrolled off, cursor pinned at x + 5)
//! ```

use cellscreen::{SharedSurface, Style};
use serde::{Deserialize, Serialize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::error::Result;

/// Glyph drawn in place of every character of a password field.
pub const MASK_GLYPH: char = '*';

/// Everything needed to construct a [`TextField`].
///
/// Either fill in the public fields directly or chain the builder methods:
///
/// ```rust
/// use cellform::{TextBoxSpec, style_fill, style_helper};
///
/// let spec = TextBoxSpec::new("age")
///     .description("Age")
///     .position(80, 9)
///     .size(5, 1)
///     .tab_order(4)
///     .style_fill(style_fill("grey"))
///     .style_text(style_helper("black", "grey"))
///     .show_description(true);
/// assert_eq!(spec.width, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBoxSpec {
    /// Field name; the key under which `collect()` reports the content.
    pub name: String,
    /// Label drawn to the left of the box when `show_description` is set.
    pub description: String,
    /// Value typed into the box when it is first started.
    pub default_value: String,
    /// Position in the form's tab traversal. Unique within a form.
    pub tab_order: i32,
    /// Column of the first content cell.
    pub x: i32,
    /// Row of the box.
    pub y: i32,
    /// Number of visible content cells.
    pub width: usize,
    /// Height in rows. Only single-line boxes are drawn.
    pub height: usize,
    /// Style of the cursor cell.
    pub style_cursor: Style,
    /// Style of empty cells.
    pub style_fill: Style,
    /// Style of content cells.
    pub style_text: Style,
    /// Style of the description label.
    pub style_description: Style,
    /// Whether to draw the description.
    pub show_description: bool,
    /// Give this box focus when the form starts. The last box registered
    /// with this set wins.
    pub has_focus: bool,
    /// Mask content while typing.
    pub password: bool,
}

impl TextBoxSpec {
    /// Start a spec for a one-row box with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            height: 1,
            ..Self::default()
        }
    }

    /// Set the description label.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Set the tab-order key.
    pub fn tab_order(mut self, tab_order: i32) -> Self {
        self.tab_order = tab_order;
        self
    }

    /// Set the position of the first content cell.
    pub fn position(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the display width and height.
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the cursor style.
    pub fn style_cursor(mut self, style: Style) -> Self {
        self.style_cursor = style;
        self
    }

    /// Set the fill style.
    pub fn style_fill(mut self, style: Style) -> Self {
        self.style_fill = style;
        self
    }

    /// Set the text style.
    pub fn style_text(mut self, style: Style) -> Self {
        self.style_text = style;
        self
    }

    /// Set the description style.
    pub fn style_description(mut self, style: Style) -> Self {
        self.style_description = style;
        self
    }

    /// Draw the description label.
    pub fn show_description(mut self, show: bool) -> Self {
        self.show_description = show;
        self
    }

    /// Request initial focus.
    pub fn focus(mut self, focus: bool) -> Self {
        self.has_focus = focus;
        self
    }

    /// Mask the content.
    pub fn password(mut self, password: bool) -> Self {
        self.password = password;
        self
    }
}

/// One editable, single-line text box.
pub struct TextField {
    name: String,
    description: String,
    default_value: String,
    content: Vec<char>,
    tab_order: i32,
    px: i32,
    py: i32,
    width: usize,
    height: usize,
    cx: i32,
    cy: i32,
    style_cursor: Style,
    style_fill: Style,
    style_text: Style,
    style_description: Style,
    show_description: bool,
    mask: bool,
    surface: SharedSurface,
}

impl std::fmt::Debug for TextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextField")
            .field("name", &self.name)
            .field("tab_order", &self.tab_order)
            .field("position", &(self.px, self.py))
            .field("cursor", &(self.cx, self.cy))
            .field("width", &self.width)
            .field("len", &self.content.len())
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

impl TextField {
    /// Build a field from its spec. Nothing is drawn until [`start`](Self::start).
    pub fn new(spec: TextBoxSpec, surface: SharedSurface) -> Self {
        Self {
            name: spec.name,
            description: spec.description,
            default_value: spec.default_value,
            content: Vec::new(),
            tab_order: spec.tab_order,
            px: spec.x,
            py: spec.y,
            width: spec.width,
            height: spec.height,
            cx: spec.x,
            cy: spec.y,
            style_cursor: spec.style_cursor,
            style_fill: spec.style_fill,
            style_text: spec.style_text,
            style_description: spec.style_description,
            show_description: spec.show_description,
            mask: spec.password,
            surface,
        }
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description label.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The full, unmasked content.
    pub fn value(&self) -> String {
        self.content.iter().collect()
    }

    /// Number of characters in the content.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The tab-order key.
    pub fn tab_order(&self) -> i32 {
        self.tab_order
    }

    /// Position of the first content cell.
    pub fn position(&self) -> (i32, i32) {
        (self.px, self.py)
    }

    /// Cursor cell.
    pub fn cursor(&self) -> (i32, i32) {
        (self.cx, self.cy)
    }

    /// Display width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether content is masked when drawn.
    pub fn is_masked(&self) -> bool {
        self.mask
    }

    /// The characters currently visible in the box, masked if applicable.
    pub fn visible_text(&self) -> String {
        let skip = self.content.len().saturating_sub(self.width);
        self.content[skip..]
            .iter()
            .map(|&c| if self.mask { MASK_GLYPH } else { c })
            .collect()
    }

    /// Draw the box, its description and its default value, then hide the
    /// cursor.
    ///
    /// The default value is only typed in while the box is empty, so
    /// restarting a box after a reposition keeps what the user entered.
    pub fn start(&mut self) -> Result<()> {
        self.draw_box();
        self.draw_description();
        self.draw_text()?;
        if !self.default_value.is_empty() && self.content.is_empty() {
            let default: Vec<char> = self.default_value.chars().collect();
            for c in default {
                self.add(c)?;
            }
        }
        self.hide_cursor()
    }

    /// Append a character and advance the cursor, or slide the window once
    /// the box is full.
    pub fn add(&mut self, c: char) -> Result<()> {
        self.content.push(c);
        if self.content.len() <= self.width {
            self.cx += 1;
        }
        self.set_cursor();
        self.draw_text()
    }

    /// Remove the last character, if any.
    pub fn back(&mut self) -> Result<()> {
        if self.content.pop().is_some() {
            if self.content.len() < self.width {
                self.cx -= 1;
                // vacated cursor cell
                self.surface
                    .set_content(self.cx + 1, self.cy, ' ', self.style_text);
            }
            self.set_cursor();
        }
        self.draw_text()
    }

    /// Paint the cursor cell with the cursor style.
    pub fn show_cursor(&self) -> Result<()> {
        self.set_cursor();
        self.surface.show()?;
        Ok(())
    }

    /// Paint the cursor cell with the fill style.
    pub fn hide_cursor(&self) -> Result<()> {
        self.surface
            .set_content(self.cx, self.cy, ' ', self.style_fill);
        self.surface.show()?;
        Ok(())
    }

    /// Move the box and its cursor. Nothing is redrawn.
    pub fn shift(&mut self, dx: i32, dy: i32) {
        self.px += dx;
        self.cx += dx;
        self.py += dy;
        self.cy += dy;
    }

    fn set_cursor(&self) {
        self.surface
            .set_content(self.cx, self.cy, ' ', self.style_cursor);
    }

    // Columns past the right edge of the surface are never painted.
    fn draw_box(&self) {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let (cols, _) = self.surface.size();
        let last = self.px.saturating_add(width).min(i32::from(cols));
        for x in self.px..=last {
            self.surface.set_content(x, self.py, ' ', self.style_fill);
        }
    }

    // The label ends two cells left of the box; cells left of column 0 are
    // dropped by the surface.
    fn draw_description(&self) {
        if !self.show_description {
            return;
        }
        let label_width = self.description.width() as i32;
        let mut x = self.px - (label_width + 2);
        for c in self.description.chars() {
            let w = c.width().unwrap_or(0) as i32;
            if w == 0 {
                continue;
            }
            if x >= 0 {
                self.surface
                    .set_content(x, self.py, c, self.style_description);
            }
            x += w;
        }
    }

    fn draw_text(&self) -> Result<()> {
        let skip = self.content.len().saturating_sub(self.width);
        for (i, &c) in self.content[skip..].iter().enumerate() {
            let glyph = if self.mask { MASK_GLYPH } else { c };
            self.surface
                .set_content(
                    self.px.saturating_add(i32::try_from(i).unwrap_or(i32::MAX)),
                    self.py,
                    glyph,
                    self.style_text,
                );
        }
        self.set_cursor();
        self.surface.show()?;
        Ok(())
    }
}
