#![forbid(unsafe_code)]

//! # Cellform Demo
//!
//! Runs two forms on a real terminal. The top-level loop owns the input
//! until a bound key hands it to a form; Enter submits, Escape leaves, and
//! the sample form hands input back on its own after a timeout.
//!
//! ## Public Modules
//!
//! - [`cli`] - Command-line flags
//! - [`config`] - Form layout and key bindings
//! - [`logging`] - JSON file logging

pub mod cli;
pub mod config;
pub mod logging;
