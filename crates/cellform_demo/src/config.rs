//! Form layout and key bindings.
//!
//! A [`DemoConfig`] is either the built-in sample (see [`DemoConfig::sample`])
//! or loaded from JSON:
//!
//! ```json
//! {
//!   "forms": [
//!     { "name": "login", "fields": [
//!         { "name": "user", "description": "User", "x": 20, "y": 2, "width": 16,
//!           "style_fill": { "bg": "grey" }, "show_description": true },
//!         { "name": "pass", "description": "Password", "x": 20, "y": 4, "width": 16,
//!           "tab_order": 1, "password": true, "show_description": true }
//!     ] }
//!   ],
//!   "bindings": [
//!     { "key": "l", "action": "delegate", "form": "login", "timeout_secs": 30 },
//!     { "key": "q", "action": "exit" }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use cellform::{
    Action, DEFAULT_SUBMIT_CAPACITY, Form, FormSet, OuterDispatcher, TextBoxSpec, sample_text_boxes,
    style_cursor, style_fill, style_helper,
};
use cellscreen::SharedSurface;
use serde::{Deserialize, Serialize};

/// Name of the built-in four-box form.
pub const SAMPLE_FORM: &str = "sample";
/// Name of the built-in password form.
pub const PASSWORD_FORM: &str = "password";

/// Everything the demo draws and binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Forms, drawn in this order.
    pub forms: Vec<FormConfig>,
    /// Keys the top-level loop reacts to.
    pub bindings: Vec<BindingConfig>,
    /// Capacity of the submission channel.
    pub submit_capacity: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            forms: Vec::new(),
            bindings: Vec::new(),
            submit_capacity: DEFAULT_SUBMIT_CAPACITY,
        }
    }
}

/// One form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Form name, used by bindings and submissions.
    pub name: String,
    /// Text boxes in registration order.
    #[serde(default)]
    pub fields: Vec<TextBoxSpec>,
    /// Move every box by this much before the first draw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift: Option<Offset>,
}

/// A coordinate delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    /// Columns.
    pub dx: i32,
    /// Rows.
    pub dy: i32,
}

/// A key and what it does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// The character that triggers the action.
    pub key: char,
    /// The action.
    #[serde(flatten)]
    pub action: ActionConfig,
}

/// Serializable form of [`cellform::Action`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionConfig {
    /// Enter a form.
    Delegate {
        /// Form name.
        form: String,
        /// Hand input back after this many seconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
    },
    /// Clear the screen and redraw a form moved by `(dx, dy)`.
    Shift {
        /// Form name.
        form: String,
        /// Columns.
        dx: i32,
        /// Rows.
        dy: i32,
    },
    /// Quit.
    Exit,
}

impl From<&ActionConfig> for Action {
    fn from(config: &ActionConfig) -> Self {
        match config {
            ActionConfig::Delegate { form, timeout_secs } => Self::Delegate {
                form: form.clone(),
                timeout: timeout_secs.map(Duration::from_secs),
            },
            ActionConfig::Shift { form, dx, dy } => Self::Shift {
                form: form.clone(),
                dx: *dx,
                dy: *dy,
            },
            ActionConfig::Exit => Self::Exit,
        }
    }
}

impl DemoConfig {
    /// The built-in layout: the four-box sample form shifted to `(3, 20)`
    /// and a single-box password form.
    ///
    /// `j` enters the sample form (handing input back after
    /// `sample_timeout`, if set), `k` enters the password form and `u`
    /// moves the sample form three rows up.
    pub fn sample(sample_timeout: Option<Duration>) -> Self {
        let password = TextBoxSpec::new("password")
            .description("Password: ")
            .position(45, 20)
            .size(100, 2)
            .style_cursor(style_cursor("white"))
            .style_fill(style_fill("green"))
            .style_text(style_helper("red", "green"))
            .style_description(style_helper("orange", "gray"))
            .show_description(true)
            .password(true);

        Self {
            forms: vec![
                FormConfig {
                    name: SAMPLE_FORM.to_string(),
                    fields: sample_text_boxes(),
                    shift: Some(Offset { dx: 3, dy: 20 }),
                },
                FormConfig {
                    name: PASSWORD_FORM.to_string(),
                    fields: vec![password],
                    shift: None,
                },
            ],
            bindings: vec![
                BindingConfig {
                    key: 'j',
                    action: ActionConfig::Delegate {
                        form: SAMPLE_FORM.to_string(),
                        timeout_secs: sample_timeout.map(|d| d.as_secs()),
                    },
                },
                BindingConfig {
                    key: 'k',
                    action: ActionConfig::Delegate {
                        form: PASSWORD_FORM.to_string(),
                        timeout_secs: None,
                    },
                },
                BindingConfig {
                    key: 'u',
                    action: ActionConfig::Shift {
                        form: SAMPLE_FORM.to_string(),
                        dx: 0,
                        dy: -3,
                    },
                },
            ],
            submit_capacity: DEFAULT_SUBMIT_CAPACITY,
        }
    }

    /// Read a layout from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading layout {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing layout {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject layouts that cannot run.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.forms.is_empty() {
            bail!("layout defines no forms");
        }
        for form in &self.forms {
            if form.fields.is_empty() {
                bail!("form {:?} has no fields", form.name);
            }
        }
        Ok(())
    }

    /// Build, shift and draw every form.
    pub fn build_forms(&self, surface: &SharedSurface) -> anyhow::Result<FormSet> {
        let forms = FormSet::new();
        for config in &self.forms {
            if forms.get(&config.name).is_some() {
                bail!("form {:?} is defined twice", config.name);
            }
            let mut form = Form::new(&config.name, surface.clone());
            for spec in &config.fields {
                form.add_text_box(spec.clone())
                    .with_context(|| format!("building form {:?}", config.name))?;
            }
            if let Some(Offset { dx, dy }) = config.shift {
                form.shift_xy(dx, dy);
            }
            form.start()
                .with_context(|| format!("drawing form {:?}", config.name))?;
            forms.insert(form);
        }
        Ok(forms)
    }

    /// Install the key bindings on `dispatcher`.
    pub fn bind(&self, dispatcher: &mut OuterDispatcher) -> anyhow::Result<()> {
        for binding in &self.bindings {
            dispatcher
                .bind(binding.key, Action::from(&binding.action))
                .with_context(|| format!("binding key {:?}", binding.key))?;
        }
        Ok(())
    }
}
