//! Cross-view highlight fan-out.
//!
//! Stateless helpers that forward one highlight to many views. A composite
//! key reaches a composite-keyed view whole, so only the element matching
//! every component lights up; a single-keyed view receives one component.

use crate::chart::Interactive;
use crate::data::{Key, KeyField, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value (or tuple of values) to highlight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HighlightKey {
    /// One value, e.g. a month.
    Single(Value),
    /// A tuple, e.g. `(series, month)`.
    Composite(Vec<Value>),
}

impl HighlightKey {
    /// One-value key.
    pub fn single(value: impl Into<Value>) -> Self {
        HighlightKey::Single(value.into())
    }

    /// Tuple key.
    pub fn composite<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        HighlightKey::Composite(values.into_iter().map(Into::into).collect())
    }

    /// The key as an element key tuple.
    #[must_use]
    pub fn to_key(&self) -> Key {
        match self {
            HighlightKey::Single(v) => Key::single(v.clone()),
            HighlightKey::Composite(vs) => Key::new(vs.clone()),
        }
    }

    fn pick(&self, component: Component) -> Option<Value> {
        match self {
            HighlightKey::Single(v) => Some(v.clone()),
            HighlightKey::Composite(vs) => match component {
                Component::First => vs.first().cloned(),
                Component::Last => vs.last().cloned(),
                Component::Index(i) => vs.get(i).cloned(),
            },
        }
    }
}

impl From<Key> for HighlightKey {
    fn from(key: Key) -> Self {
        match key.values() {
            [only] => HighlightKey::Single(only.clone()),
            values => HighlightKey::Composite(values.to_vec()),
        }
    }
}

/// Which component of a composite key a single-keyed view receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Component {
    /// The first component.
    First,
    /// The last component (e.g. the month of `(series, month)`).
    #[default]
    Last,
    /// Component at an index.
    Index(usize),
}

/// A view taking part in linked highlighting.
#[derive(Clone)]
pub struct Target {
    /// The view.
    pub view: Rc<RefCell<dyn Interactive>>,
    /// Field(s) to match; the view's interaction key when `None`.
    pub key_field: Option<KeyField>,
    /// Component used when a composite key meets a single field.
    pub component: Component,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("key_field", &self.key_field)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

impl Target {
    /// Target matching on the view's own interaction key.
    pub fn new(view: Rc<RefCell<dyn Interactive>>) -> Self {
        Self {
            view,
            key_field: None,
            component: Component::default(),
        }
    }

    /// Match on `key_field` instead.
    #[must_use]
    pub fn by(mut self, key_field: impl Into<KeyField>) -> Self {
        self.key_field = Some(key_field.into());
        self
    }

    /// Use `component` of composite keys.
    #[must_use]
    pub fn component(mut self, component: Component) -> Self {
        self.component = component;
        self
    }
}

/// Highlight `key` on every target. Returns the total number of emphasized
/// elements. A target whose component is missing from `key` has its emphasis
/// cleared. A view that is busy (already borrowed, e.g. mid-render) is
/// skipped.
pub fn broadcast(key: &HighlightKey, targets: &[Target]) -> usize {
    targets
        .iter()
        .map(|target| {
            let Ok(mut view) = target.view.try_borrow_mut() else {
                log::warn!("highlight {:?} skipped a busy view", key);
                return 0;
            };
            let field = target.key_field.clone().unwrap_or_else(|| view.interaction_key());
            let values = if field.is_composite() {
                vec![key.to_key()]
            } else {
                key.pick(target.component).map(Key::single).into_iter().collect()
            };
            view.highlight_by(&values, &field)
        })
        .sum()
}

/// Clear emphasis on every target.
pub fn clear(targets: &[Target]) {
    for target in targets {
        match target.view.try_borrow_mut() {
            Ok(mut view) => view.clear_highlight(),
            Err(_) => log::warn!("highlight clear skipped a busy view"),
        }
    }
}
