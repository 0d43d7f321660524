//! Command-line interface for `cellform_demo`.
//!
//! # Examples
//!
//! ```bash
//! # Run the built-in sample layout
//! cellform_demo
//!
//! # Load forms and key bindings from a file
//! cellform_demo --layout forms.json
//!
//! # Print the built-in layout as JSON, a starting point for --layout
//! cellform_demo --dump-layout > forms.json
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Terminal input forms with delegated, cancellable polling.
///
/// Press `j` or `k` to enter a form, `u` to move the sample form up, and
/// Ctrl+C to quit. Inside a form, Tab and Shift+Tab move between boxes,
/// Enter submits and Escape leaves without submitting.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cellform_demo",
    author,
    version,
    about = "Terminal input forms with delegated, cancellable polling"
)]
pub struct Cli {
    /// JSON layout describing forms and key bindings
    ///
    /// Defaults to the built-in sample layout
    #[arg(long, short = 'l', env = "CELLFORM_LAYOUT")]
    pub layout: Option<PathBuf>,

    /// File that receives JSON log lines
    #[arg(long, default_value = "cellform.log.json", env = "CELLFORM_LOG_FILE")]
    pub log_file: PathBuf,

    /// Log level filter (trace, debug, info, warn, error)
    ///
    /// `RUST_LOG` takes precedence when set
    #[arg(long, default_value = "info", env = "CELLFORM_LOG_LEVEL")]
    pub log_level: String,

    /// Seconds before the sample form hands input back on its own; 0 disables
    #[arg(long, default_value_t = 5, env = "CELLFORM_SAMPLE_TIMEOUT")]
    pub sample_timeout_secs: u64,

    /// Run in the main terminal buffer instead of the alternate screen
    #[arg(long, env = "CELLFORM_NO_ALT_SCREEN")]
    pub no_alt_screen: bool,

    /// Print the layout that would be used as JSON and exit
    #[arg(long)]
    pub dump_layout: bool,
}

impl Cli {
    /// Sample-form timeout, or `None` when disabled.
    pub fn sample_timeout(&self) -> Option<Duration> {
        (self.sample_timeout_secs > 0).then(|| Duration::from_secs(self.sample_timeout_secs))
    }
}
