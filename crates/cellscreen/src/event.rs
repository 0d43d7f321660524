//! Input events.
//!
//! Everything a surface can hand back from [`Surface::poll_event`] is one of
//! the variants of [`Event`]. The set is closed so consumers can dispatch with
//! an exhaustive `match`:
//!
//! ```rust
//! use cellscreen::{Event, Key, KeyEvent};
//!
//! fn describe(event: &Event) -> &'static str {
//!     match event {
//!         Event::Key(KeyEvent { key: Key::Enter, .. }) => "submit",
//!         Event::Key(_) => "keystroke",
//!         Event::Resize { .. } => "resize",
//!         Event::Wake(_) => "wake",
//!         Event::Other => "ignored",
//!     }
//! }
//!
//! assert_eq!(describe(&Event::key(Key::Enter)), "submit");
//! ```
//!
//! [`Surface::poll_event`]: crate::Surface::poll_event

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a keystroke.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 1 << 0;
        /// Control.
        const CTRL = 1 << 1;
        /// Alt / Meta.
        const ALT = 1 << 2;
    }
}

/// A decoded key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable character (including space).
    Char(char),
    /// Tab.
    Tab,
    /// Shift+Tab.
    BackTab,
    /// Backspace.
    Backspace,
    /// Enter / Return.
    Enter,
    /// Escape.
    Esc,
    /// A control combination such as Ctrl+C, stored lowercase.
    Ctrl(char),
    /// Any other key, by name (arrows, function keys, ...).
    Other(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(' ') => write!(f, "space"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Tab => write!(f, "tab"),
            Self::BackTab => write!(f, "shift+tab"),
            Self::Backspace => write!(f, "backspace"),
            Self::Enter => write!(f, "enter"),
            Self::Esc => write!(f, "esc"),
            Self::Ctrl(c) => write!(f, "ctrl+{c}"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

/// A keystroke: the key plus the modifiers held with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// The key pressed.
    pub key: Key,
    /// Modifiers held.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A keystroke without modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    /// Add modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(Modifiers::ALT) {
            write!(f, "alt+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// An event returned by a surface's blocking poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A keystroke.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },
    /// A synthetic event posted to unblock a waiting reader.
    ///
    /// The id names whoever the wake is meant for, so a reader can tell its
    /// own wake from one left over by an earlier reader.
    Wake(u64),
    /// Anything else the terminal reported (mouse, focus, paste, ...).
    Other,
}

impl Event {
    /// Shorthand for a keystroke without modifiers.
    pub fn key(key: Key) -> Self {
        Self::Key(KeyEvent::new(key))
    }

    /// Shorthand for a printable character.
    pub fn char(c: char) -> Self {
        Self::key(Key::Char(c))
    }

    /// Translate a crossterm event.
    ///
    /// Key releases and repeats are dropped (`None`); only presses count.
    pub fn from_crossterm(event: crossterm::event::Event) -> Option<Self> {
        use crossterm::event::{Event as CtEvent, KeyEventKind};

        match event {
            CtEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    return None;
                }
                Some(Self::Key(from_crossterm_key(key.code, key.modifiers)))
            }
            CtEvent::Resize(width, height) => Some(Self::Resize { width, height }),
            _ => Some(Self::Other),
        }
    }
}

/// Convert a crossterm key code and modifiers into a [`KeyEvent`].
pub fn from_crossterm_key(
    code: crossterm::event::KeyCode,
    modifiers: crossterm::event::KeyModifiers,
) -> KeyEvent {
    use crossterm::event::{KeyCode, KeyModifiers};

    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    let shift = modifiers.contains(KeyModifiers::SHIFT);
    let alt = modifiers.contains(KeyModifiers::ALT);

    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, shift);
    mods.set(Modifiers::CTRL, ctrl);
    mods.set(Modifiers::ALT, alt);

    let key = match code {
        // Some terminals report ctrl+i / ctrl+m / ctrl+h as chars.
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            'i' => Key::Tab,
            'm' => Key::Enter,
            'h' => Key::Backspace,
            lower => Key::Ctrl(lower),
        },
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab if shift => Key::BackTab,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Esc => Key::Esc,
        KeyCode::Up => Key::Other("up".into()),
        KeyCode::Down => Key::Other("down".into()),
        KeyCode::Left => Key::Other("left".into()),
        KeyCode::Right => Key::Other("right".into()),
        KeyCode::Home => Key::Other("home".into()),
        KeyCode::End => Key::Other("end".into()),
        KeyCode::PageUp => Key::Other("pgup".into()),
        KeyCode::PageDown => Key::Other("pgdown".into()),
        KeyCode::Delete => Key::Other("delete".into()),
        KeyCode::Insert => Key::Other("insert".into()),
        KeyCode::F(n) => Key::Other(format!("f{n}")),
        other => Key::Other(format!("{other:?}").to_lowercase()),
    };

    KeyEvent {
        key,
        modifiers: mods,
    }
}
