//! Per-view event handlers and emphasis.
//!
//! Dispatch is two-phase: [`InteractionBroker::resolve`] looks up the element
//! and extracts its interaction key while the owning chart is borrowed, and
//! [`Triggered::fire`] runs the callback afterwards. A callback is therefore
//! free to re-borrow its own chart to highlight or re-render it.

use crate::binder::LiveElements;
use crate::data::{Key, KeyField};
use crate::error::Result;
use crate::surface::Surface;
use indexmap::IndexSet;
use std::fmt;
use std::rc::Rc;

/// Callback receiving an element's interaction key.
pub type KeyHandler = Rc<dyn Fn(&Key)>;

/// Callback with no argument (double-click).
pub type ResetHandler = Rc<dyn Fn()>;

/// User pointer events a view reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEvent {
    /// Click on an element.
    Click,
    /// Pointer entered an element.
    Hover,
    /// Pointer left an element.
    Unhover,
    /// Double-click anywhere on the view.
    DoubleClick,
}

/// A set of event callbacks. Unset callbacks do nothing.
#[derive(Clone, Default)]
pub struct Handlers {
    on_click: Option<KeyHandler>,
    on_hover: Option<KeyHandler>,
    on_unhover: Option<KeyHandler>,
    on_double_click: Option<ResetHandler>,
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("on_click", &self.on_click.is_some())
            .field("on_hover", &self.on_hover.is_some())
            .field("on_unhover", &self.on_unhover.is_some())
            .field("on_double_click", &self.on_double_click.is_some())
            .finish()
    }
}

impl Handlers {
    /// No callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the click callback.
    #[must_use]
    pub fn on_click(mut self, f: impl Fn(&Key) + 'static) -> Self {
        self.on_click = Some(Rc::new(f));
        self
    }

    /// Set the hover callback.
    #[must_use]
    pub fn on_hover(mut self, f: impl Fn(&Key) + 'static) -> Self {
        self.on_hover = Some(Rc::new(f));
        self
    }

    /// Set the unhover callback.
    #[must_use]
    pub fn on_unhover(mut self, f: impl Fn(&Key) + 'static) -> Self {
        self.on_unhover = Some(Rc::new(f));
        self
    }

    /// Set the double-click callback.
    #[must_use]
    pub fn on_double_click(mut self, f: impl Fn() + 'static) -> Self {
        self.on_double_click = Some(Rc::new(f));
        self
    }

    fn key_handler(&self, event: PointerEvent) -> Option<&KeyHandler> {
        match event {
            PointerEvent::Click => self.on_click.as_ref(),
            PointerEvent::Hover => self.on_hover.as_ref(),
            PointerEvent::Unhover => self.on_unhover.as_ref(),
            PointerEvent::DoubleClick => None,
        }
    }
}

enum Callback {
    Key(KeyHandler, Key),
    Reset(ResetHandler),
}

/// A resolved event, ready to run once the view is no longer borrowed.
pub struct Triggered {
    callback: Callback,
}

impl fmt::Debug for Triggered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.callback {
            Callback::Key(_, key) => write!(f, "Triggered({key})"),
            Callback::Reset(_) => f.write_str("Triggered(reset)"),
        }
    }
}

impl Triggered {
    /// The key passed to the callback, if any.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        match &self.callback {
            Callback::Key(_, key) => Some(key),
            Callback::Reset(_) => None,
        }
    }

    /// Run the callback.
    pub fn fire(self) {
        match self.callback {
            Callback::Key(f, key) => f(&key),
            Callback::Reset(f) => f(),
        }
    }
}

/// Event registration and highlight state of one interactive layer.
#[derive(Debug)]
pub struct InteractionBroker {
    handlers: Handlers,
    key_field: KeyField,
    live: LiveElements,
    emphasized: IndexSet<Key>,
}

impl InteractionBroker {
    /// Broker over `layer`, keyed by `key_field`, with no handlers.
    #[must_use]
    pub fn new(layer: impl Into<String>, key_field: KeyField) -> Self {
        Self {
            handlers: Handlers::default(),
            key_field,
            live: LiveElements::empty(layer),
            emphasized: IndexSet::new(),
        }
    }

    /// Replace all handlers and the key field in one step.
    pub fn register_handlers(&mut self, handlers: Handlers, key_field: KeyField) {
        self.handlers = handlers;
        self.key_field = key_field;
    }

    /// Change the key field, keeping the handlers.
    pub fn set_key_field(&mut self, key_field: KeyField) {
        self.key_field = key_field;
    }

    /// Field(s) whose values are passed to callbacks and matched by [`highlight`](Self::highlight).
    #[must_use]
    pub fn key_field(&self) -> &KeyField {
        &self.key_field
    }

    /// The bound live elements.
    #[must_use]
    pub fn live(&self) -> &LiveElements {
        &self.live
    }

    /// Element keys currently emphasized.
    pub fn emphasized(&self) -> impl Iterator<Item = &Key> {
        self.emphasized.iter()
    }

    /// Rebind to the elements of a fresh render.
    ///
    /// Emphasis of elements that are still live is re-applied; emphasis of
    /// exited elements is dropped.
    pub fn bind<S: Surface + ?Sized>(&mut self, live: LiveElements, surface: &mut S) {
        self.emphasized.retain(|k| live.contains(k));
        for key in &self.emphasized {
            surface.set_emphasis(live.layer(), key, true);
        }
        self.live = live;
    }

    /// Look up the callback for `event` on `element`.
    ///
    /// Returns `None` when no callback is registered or the element is not live.
    /// `element` is ignored for [`PointerEvent::DoubleClick`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`](crate::Error::Schema) if the element's datum
    /// lacks the key field.
    pub fn resolve(&self, event: PointerEvent, element: &Key) -> Result<Option<Triggered>> {
        if event == PointerEvent::DoubleClick {
            return Ok(self.handlers.on_double_click.clone().map(|f| Triggered {
                callback: Callback::Reset(f),
            }));
        }
        let Some(handler) = self.handlers.key_handler(event) else {
            return Ok(None);
        };
        let Some(index) = self.live.keys().position(|k| k == element) else {
            return Ok(None);
        };
        let Some(datum) = self.live.datum(element) else {
            return Ok(None);
        };
        let key = self.key_field.extract(datum, index)?;
        Ok(Some(Triggered {
            callback: Callback::Key(Rc::clone(handler), key),
        }))
    }

    /// Emphasize elements whose key (under the registered key field) is in `values`.
    ///
    /// Returns the number of emphasized elements.
    pub fn highlight<S: Surface + ?Sized>(&mut self, values: &[Key], surface: &mut S) -> usize {
        let key_field = self.key_field.clone();
        self.highlight_by(values, &key_field, surface)
    }

    /// Emphasize elements whose key under `key_field` is in `values`, clearing all others.
    ///
    /// A single field is a membership test on one-component keys; a composite
    /// field requires the whole tuple to match in order. Elements lacking a
    /// field never match. `highlight_by(&[], ..)` clears all emphasis.
    pub fn highlight_by<S: Surface + ?Sized>(&mut self, values: &[Key], key_field: &KeyField, surface: &mut S) -> usize {
        let matched: IndexSet<Key> = if values.is_empty() {
            IndexSet::new()
        } else {
            self.live
                .iter()
                .enumerate()
                .filter(|(i, (_, datum))| {
                    key_field
                        .extract(datum, *i)
                        .map(|k| values.contains(&k))
                        .unwrap_or(false)
                })
                .map(|(_, (element, _))| element.clone())
                .collect()
        };

        let layer = self.live.layer().to_string();
        for element in self.emphasized.iter().filter(|k| !matched.contains(*k)) {
            surface.set_emphasis(&layer, element, false);
        }
        for element in matched.iter().filter(|k| !self.emphasized.contains(*k)) {
            surface.set_emphasis(&layer, element, true);
        }
        self.emphasized = matched;
        self.emphasized.len()
    }

    /// Clear all emphasis.
    pub fn clear<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.highlight_by(&[], &KeyField::Composite(Vec::new()), surface);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::binder::ElementBinder;
    use crate::color::Rgba;
    use crate::data::DataPoint;
    use crate::geometry::Point;
    use crate::surface::{Mark, Scene, Shape, Style};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_empty_highlight_clears_everything(
            keys in prop::collection::hash_set(0u32..200, 0..40),
            rounds in prop::collection::vec(prop::collection::vec(0u32..200, 0..10), 0..8),
        ) {
            let data: Vec<DataPoint> = keys.iter().map(|&k| DataPoint::new().with("k", k)).collect();
            let mut scene = Scene::new();
            let mut binder = ElementBinder::new("dots");
            let (live, _) = binder
                .join(&data, &KeyField::single("k"), |_, _| {
                    Ok(Mark::new(Shape::Circle { center: Point::ORIGIN, radius: 1.0 }, Style::fill(Rgba::BLACK)))
                }, &mut scene)
                .expect("operation should succeed");
            let mut broker = InteractionBroker::new("dots", KeyField::single("k"));
            broker.bind(live, &mut scene);

            for round in rounds {
                let values: Vec<Key> = round.into_iter().map(Key::single).collect();
                broker.highlight(&values, &mut scene);
            }
            broker.highlight(&[], &mut scene);

            prop_assert_eq!(scene.emphasized_count(), 0);
            prop_assert_eq!(broker.emphasized().count(), 0);
        }
    }
}
