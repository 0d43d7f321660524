//! Forms: named groups of text boxes with a tab order and one focused box.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use cellscreen::SharedSurface;
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{FormError, Result};
use crate::field::{TextBoxSpec, TextField};

/// Direction of a focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Next tab-order key, wrapping to the lowest.
    Forward,
    /// Previous tab-order key, wrapping to the highest.
    Backward,
}

/// A form shared between the dispatcher, its poll coordinators and the
/// submission watcher.
pub type SharedForm = Arc<Mutex<Form>>;

/// A set of text boxes drawn on one surface.
///
/// Fields are kept in registration order; focus moves along the ascending
/// tab-order keys.
pub struct Form {
    name: String,
    fields: IndexMap<String, TextField>,
    tab_index: BTreeMap<i32, String>,
    focused: Option<String>,
    surface: SharedSurface,
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("tab_index", &self.tab_index)
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Create an empty form drawing on `surface`.
    pub fn new(name: impl Into<String>, surface: SharedSurface) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            tab_index: BTreeMap::new(),
            focused: None,
            surface,
        }
    }

    /// Wrap this form for sharing across tasks.
    pub fn into_shared(self) -> SharedForm {
        Arc::new(Mutex::new(self))
    }

    /// Register a text box.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::DuplicateFieldName`] or
    /// [`FormError::DuplicateTabOrder`] if the name or key is taken; the form
    /// is left unchanged.
    pub fn add_text_box(&mut self, spec: TextBoxSpec) -> Result<()> {
        if self.fields.contains_key(&spec.name) {
            return Err(FormError::DuplicateFieldName {
                form: self.name.clone(),
                name: spec.name,
            });
        }
        if let Some(existing) = self.tab_index.get(&spec.tab_order) {
            return Err(FormError::DuplicateTabOrder {
                form: self.name.clone(),
                tab_order: spec.tab_order,
                existing: existing.clone(),
            });
        }

        let name = spec.name.clone();
        if spec.has_focus {
            self.focused = Some(name.clone());
        }
        self.tab_index.insert(spec.tab_order, name.clone());
        let field = TextField::new(spec, Arc::clone(&self.surface));
        debug!(form = %self.name, field = %name, tab_order = field.tab_order(), "text box added");
        self.fields.insert(name, field);
        Ok(())
    }

    /// Draw every box and fix the initial focus if none is set yet.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::EmptyForm`] when no boxes are registered, or
    /// [`FormError::Surface`] if drawing fails.
    pub fn start(&mut self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(FormError::EmptyForm(self.name.clone()));
        }
        if self.focused.is_none() {
            self.focused = self
                .tab_index
                .values()
                .next()
                .or_else(|| self.fields.keys().next())
                .cloned();
        }
        for field in self.fields.values_mut() {
            field.start()?;
        }
        debug!(form = %self.name, focused = ?self.focused, "form started");
        Ok(())
    }

    /// Move focus to the neighboring tab-order key.
    ///
    /// Does nothing before the form has a focused box.
    pub fn tab(&mut self, direction: Direction) -> Result<()> {
        let Some(current) = self.focused_mut() else {
            return Ok(());
        };
        current.hide_cursor()?;
        let key = current.tab_order();

        let next = match direction {
            Direction::Forward => self
                .tab_index
                .range((Bound::Excluded(key), Bound::Unbounded))
                .next()
                .or_else(|| self.tab_index.iter().next()),
            Direction::Backward => self
                .tab_index
                .range(..key)
                .next_back()
                .or_else(|| self.tab_index.iter().next_back()),
        };
        if let Some((_, name)) = next {
            trace!(form = %self.name, from = key, to = %name, "tab");
            self.focused = Some(name.clone());
        }

        if let Some(field) = self.focused() {
            field.show_cursor()?;
        }
        Ok(())
    }

    /// Current content of every box, by name, in registration order.
    pub fn collect(&self) -> IndexMap<String, String> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.value()))
            .collect()
    }

    /// Move every box by `(dx, dy)` without redrawing.
    pub fn shift_xy(&mut self, dx: i32, dy: i32) {
        for field in self.fields.values_mut() {
            field.shift(dx, dy);
        }
    }

    /// Clear the surface, move every box by `(dx, dy)` and draw the form
    /// again.
    pub fn clear_shift_xy(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.surface.clear();
        self.shift_xy(dx, dy);
        self.start()
    }

    /// The form name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registered boxes.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no boxes are registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a box by name.
    pub fn field(&self, name: &str) -> Option<&TextField> {
        self.fields.get(name)
    }

    /// Iterate over boxes in registration order.
    pub fn fields(&self) -> impl Iterator<Item = &TextField> {
        self.fields.values()
    }

    /// The focused box.
    pub fn focused(&self) -> Option<&TextField> {
        self.focused.as_deref().and_then(|name| self.fields.get(name))
    }

    /// The focused box, mutably.
    pub fn focused_mut(&mut self) -> Option<&mut TextField> {
        match self.focused.as_deref() {
            Some(name) => self.fields.get_mut(name),
            None => None,
        }
    }

    /// Name of the focused box.
    pub fn focused_name(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Tab-order keys in ascending order.
    pub fn tab_keys(&self) -> Vec<i32> {
        self.tab_index.keys().copied().collect()
    }

    /// The surface this form draws on.
    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }
}

/// Registry of named forms.
///
/// Cloning is cheap; clones share the same forms.
#[derive(Debug, Clone, Default)]
pub struct FormSet {
    forms: Arc<Mutex<IndexMap<String, SharedForm>>>,
}

impl FormSet {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a form under its own name, replacing any earlier form with
    /// that name. Returns the shared handle.
    pub fn insert(&self, form: Form) -> SharedForm {
        let name = form.name().to_string();
        let shared = form.into_shared();
        self.forms.lock().insert(name, Arc::clone(&shared));
        shared
    }

    /// Look up a form by name.
    pub fn get(&self, name: &str) -> Option<SharedForm> {
        self.forms.lock().get(name).cloned()
    }

    /// Names of all registered forms, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.forms.lock().keys().cloned().collect()
    }

    /// Number of registered forms.
    pub fn len(&self) -> usize {
        self.forms.lock().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.forms.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellscreen::MemoryScreen;

    fn form_with_keys(keys: &[i32]) -> (Arc<MemoryScreen>, Form) {
        let screen = MemoryScreen::new(40, 20);
        let mut form = Form::new("f", screen.clone());
        for (row, key) in keys.iter().enumerate() {
            form.add_text_box(
                TextBoxSpec::new(format!("k{key}"))
                    .tab_order(*key)
                    .position(10, row as i32)
                    .size(5, 1),
            )
            .unwrap();
        }
        (screen, form)
    }

    #[test]
    fn test_tab_wraps_at_extreme_keys() {
        let (_screen, mut form) = form_with_keys(&[0, i32::MAX]);
        form.start().unwrap();
        form.tab(Direction::Forward).unwrap();
        assert_eq!(form.focused_name(), Some("k2147483647"));
        form.tab(Direction::Forward).unwrap();
        assert_eq!(form.focused_name(), Some("k0"));

        let (_screen, mut form) = form_with_keys(&[i32::MIN, 0]);
        form.start().unwrap();
        assert_eq!(form.focused_name(), Some("k-2147483648"));
        form.tab(Direction::Backward).unwrap();
        assert_eq!(form.focused_name(), Some("k0"));
        form.tab(Direction::Forward).unwrap();
        assert_eq!(form.focused_name(), Some("k-2147483648"));
    }

    #[test]
    fn test_start_empty_form_fails() {
        let screen = MemoryScreen::new(10, 1);
        let mut form = Form::new("empty", screen);
        assert_eq!(form.start(), Err(FormError::EmptyForm("empty".into())));
    }

    #[test]
    fn test_default_focus_is_lowest_key() {
        let (_screen, mut form) = form_with_keys(&[3, 1, 2]);
        form.start().unwrap();
        assert_eq!(form.focused_name(), Some("k1"));
    }

    #[test]
    fn test_explicit_focus_last_wins() {
        let screen = MemoryScreen::new(40, 5);
        let mut form = Form::new("f", screen);
        form.add_text_box(TextBoxSpec::new("a").tab_order(0).focus(true).size(3, 1))
            .unwrap();
        form.add_text_box(TextBoxSpec::new("b").tab_order(1).focus(true).size(3, 1))
            .unwrap();
        form.add_text_box(TextBoxSpec::new("c").tab_order(2).size(3, 1))
            .unwrap();
        form.start().unwrap();
        assert_eq!(form.focused_name(), Some("b"));
    }

    #[test]
    fn test_restart_keeps_focus() {
        let (_screen, mut form) = form_with_keys(&[0, 2, 4]);
        form.start().unwrap();
        form.tab(Direction::Forward).unwrap();
        form.start().unwrap();
        assert_eq!(form.focused_name(), Some("k2"));
    }

    #[test]
    fn test_tab_forward_wraps() {
        let (_screen, mut form) = form_with_keys(&[0, 2, 4, 7]);
        form.start().unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            form.tab(Direction::Forward).unwrap();
            seen.push(form.focused().unwrap().tab_order());
        }
        assert_eq!(seen, vec![2, 4, 7, 0]);
    }

    #[test]
    fn test_tab_backward_wraps() {
        let (_screen, mut form) = form_with_keys(&[0, 2, 4, 7]);
        form.start().unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            form.tab(Direction::Backward).unwrap();
            seen.push(form.focused().unwrap().tab_order());
        }
        assert_eq!(seen, vec![7, 4, 2, 0]);
    }

    #[test]
    fn test_tab_before_start_is_noop() {
        let (_screen, mut form) = form_with_keys(&[0, 1]);
        form.tab(Direction::Forward).unwrap();
        assert_eq!(form.focused_name(), None);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let (_screen, mut form) = form_with_keys(&[0, 1]);
        let err = form
            .add_text_box(TextBoxSpec::new("k0").tab_order(9))
            .unwrap_err();
        assert_eq!(
            err,
            FormError::DuplicateFieldName {
                form: "f".into(),
                name: "k0".into()
            }
        );
        assert_eq!(form.len(), 2);
        assert_eq!(form.tab_keys(), vec![0, 1]);
    }

    #[test]
    fn test_duplicate_tab_order_rejected() {
        let (_screen, mut form) = form_with_keys(&[0, 1]);
        let err = form
            .add_text_box(TextBoxSpec::new("new").tab_order(1).focus(true))
            .unwrap_err();
        assert!(err.is_registration());
        assert!(form.field("new").is_none());
        assert_eq!(form.focused_name(), None);
    }

    #[test]
    fn test_collect_in_registration_order() {
        let (_screen, mut form) = form_with_keys(&[5, 1]);
        form.start().unwrap();
        form.focused_mut().unwrap().add('x').unwrap();
        let values = form.collect();
        let keys: Vec<_> = values.keys().cloned().collect();
        assert_eq!(keys, vec!["k5", "k1"]);
        assert_eq!(values["k1"], "x");
        assert_eq!(values["k5"], "");
    }

    #[test]
    fn test_shift_xy_moves_everything() {
        let (_screen, mut form) = form_with_keys(&[0, 1]);
        form.shift_xy(2, 3);
        assert_eq!(form.field("k0").unwrap().position(), (12, 3));
        assert_eq!(form.field("k1").unwrap().cursor(), (12, 4));
    }

    #[test]
    fn test_clear_shift_xy_redraws() {
        let screen = MemoryScreen::new(40, 10);
        let mut form = Form::new("f", screen.clone());
        form.add_text_box(
            TextBoxSpec::new("a")
                .default_value("hi")
                .position(5, 5)
                .size(4, 1),
        )
        .unwrap();
        form.start().unwrap();
        assert_eq!(screen.text_at(5, 5, 2), "hi");

        form.clear_shift_xy(0, -3).unwrap();
        assert_eq!(screen.text_at(5, 5, 2), "  ");
        assert_eq!(screen.text_at(5, 2, 2), "hi");
        assert_eq!(form.field("a").unwrap().value(), "hi");
    }

    #[test]
    fn test_form_set_lookup() {
        let screen = MemoryScreen::new(10, 1);
        let set = FormSet::new();
        set.insert(Form::new("one", screen.clone()));
        set.insert(Form::new("two", screen));
        assert_eq!(set.names(), vec!["one", "two"]);
        assert!(set.get("two").is_some());
        assert!(set.get("three").is_none());
    }
}
