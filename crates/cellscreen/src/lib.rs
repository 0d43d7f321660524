#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Cellscreen
//!
//! A character-cell terminal surface with a single blocking event source.
//!
//! Cellscreen provides:
//! - Named, ANSI and hex [`Color`] resolution and cell [`Style`]s
//! - A closed [`Event`] enumeration for keys, resizes and injected wake-ups
//! - The [`Surface`] trait: `set_content`, `show`, `clear`, `poll_event`,
//!   `post_event`
//! - [`TerminalScreen`], a crossterm-backed surface for real terminals
//! - [`MemoryScreen`], an in-memory surface for tests
//!
//! The event source is deliberately shaped like a classic blocking
//! `PollEvent()` call: a reader blocked in [`Surface::poll_event`] can only be
//! woken by an event, so cancellation is expressed by posting an
//! [`Event::Wake`] into the same queue.
//!
//! ## Example
//!
//! ```rust
//! use cellscreen::{Event, MemoryScreen, Style, Surface};
//!
//! let screen = MemoryScreen::new(20, 2);
//! screen.set_content(0, 0, 'h', Style::default());
//! screen.set_content(1, 0, 'i', Style::default());
//! screen.show().unwrap();
//! assert_eq!(screen.text_at(0, 0, 2), "hi");
//!
//! screen.post_event(Event::Wake(7)).unwrap();
//! assert_eq!(screen.poll_event(), Some(Event::Wake(7)));
//! ```

pub mod color;
pub mod error;
pub mod event;
pub mod memory;
pub mod queue;
pub mod style;
pub mod surface;
pub mod terminal;

pub use color::Color;
pub use error::{Error, Result};
pub use event::{Event, Key, KeyEvent, Modifiers};
pub use memory::MemoryScreen;
pub use queue::EventQueue;
pub use style::{Attributes, Style};
pub use surface::{Cell, SharedSurface, Surface};
pub use terminal::{ScreenOptions, TerminalScreen};
