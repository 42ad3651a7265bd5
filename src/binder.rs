//! Keyed element lifecycle.
//!
//! An [`ElementBinder`] owns the live key set of one layer and reconciles it
//! against a new dataset: exited keys are removed, surviving keys are updated
//! in place and new keys are created. The whole dataset is validated before the
//! surface sees a single call, so a bad dataset leaves the drawing untouched.

use crate::data::{DataPoint, Key, KeyField};
use crate::error::{Error, Result};
use crate::surface::{Mark, Surface};
use indexmap::{IndexMap, IndexSet};
use std::time::Duration;

/// Counts of one join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Elements created.
    pub entered: usize,
    /// Elements updated in place.
    pub updated: usize,
    /// Elements removed.
    pub exited: usize,
}

impl std::ops::AddAssign for JoinStats {
    fn add_assign(&mut self, rhs: Self) {
        self.entered += rhs.entered;
        self.updated += rhs.updated;
        self.exited += rhs.exited;
    }
}

/// The live elements of a layer after a join, with their bound datums.
///
/// Only valid until the next join of the same layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveElements {
    layer: String,
    elements: IndexMap<Key, DataPoint>,
}

impl LiveElements {
    /// An empty handle for `layer`.
    #[must_use]
    pub fn empty(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            elements: IndexMap::new(),
        }
    }

    /// Layer name.
    #[must_use]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Datum bound to an element.
    #[must_use]
    pub fn datum(&self, key: &Key) -> Option<&DataPoint> {
        self.elements.get(key)
    }

    /// True if the key is live.
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.elements.contains_key(key)
    }

    /// Keys in live order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.elements.keys()
    }

    /// `(key, datum)` pairs in live order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &DataPoint)> {
        self.elements.iter()
    }

    /// Number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if nothing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Check that every point has a key under `key_field` and no key repeats.
///
/// # Errors
///
/// Returns [`Error::Schema`] for a missing key field or
/// [`Error::DuplicateKey`] for the first repeated key.
pub fn check_keys(data: &[DataPoint], key_field: &KeyField) -> Result<()> {
    let mut seen = IndexSet::with_capacity(data.len());
    for (i, datum) in data.iter().enumerate() {
        let key = key_field.extract(datum, i)?;
        if seen.contains(&key) {
            return Err(Error::DuplicateKey {
                key: key.to_string(),
            });
        }
        seen.insert(key);
    }
    Ok(())
}

/// Reconciles one layer of keyed elements.
#[derive(Debug, Clone)]
pub struct ElementBinder {
    layer: String,
    live: IndexSet<Key>,
}

impl ElementBinder {
    /// Create a binder for `layer` with nothing live.
    #[must_use]
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            live: IndexSet::new(),
        }
    }

    /// Layer name.
    #[must_use]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Live keys in creation order.
    pub fn live_keys(&self) -> impl Iterator<Item = &Key> {
        self.live.iter()
    }

    /// Reconcile the layer with `data`, updating survivors immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if two points share a key, or any error
    /// from key extraction or `mark_fn`. Nothing is drawn on error.
    pub fn join<S, M>(
        &mut self,
        data: &[DataPoint],
        key_field: &KeyField,
        mark_fn: M,
        surface: &mut S,
    ) -> Result<(LiveElements, JoinStats)>
    where
        S: Surface + ?Sized,
        M: FnMut(&DataPoint, usize) -> Result<Mark>,
    {
        self.join_with(data, key_field, mark_fn, surface, None)
    }

    /// Like [`join`](Self::join), but survivors animate over `duration`.
    ///
    /// # Errors
    ///
    /// Same as [`join`](Self::join).
    pub fn join_animated<S, M>(
        &mut self,
        data: &[DataPoint],
        key_field: &KeyField,
        mark_fn: M,
        surface: &mut S,
        duration: Duration,
    ) -> Result<(LiveElements, JoinStats)>
    where
        S: Surface + ?Sized,
        M: FnMut(&DataPoint, usize) -> Result<Mark>,
    {
        self.join_with(data, key_field, mark_fn, surface, Some(duration))
    }

    fn join_with<S, M>(
        &mut self,
        data: &[DataPoint],
        key_field: &KeyField,
        mut mark_fn: M,
        surface: &mut S,
        transition: Option<Duration>,
    ) -> Result<(LiveElements, JoinStats)>
    where
        S: Surface + ?Sized,
        M: FnMut(&DataPoint, usize) -> Result<Mark>,
    {
        let mut incoming: IndexMap<Key, (Mark, &DataPoint)> = IndexMap::with_capacity(data.len());
        for (i, datum) in data.iter().enumerate() {
            let key = key_field.extract(datum, i)?;
            if incoming.contains_key(&key) {
                return Err(Error::DuplicateKey {
                    key: key.to_string(),
                });
            }
            let mark = mark_fn(datum, i)?;
            incoming.insert(key, (mark, datum));
        }

        let mut stats = JoinStats::default();

        let exiting: Vec<Key> = self.live.iter().filter(|k| !incoming.contains_key(*k)).cloned().collect();
        for key in &exiting {
            surface.exit(&self.layer, key);
            self.live.shift_remove(key);
            stats.exited += 1;
        }

        for (key, (mark, _)) in &incoming {
            if self.live.contains(key) {
                match transition {
                    Some(duration) => surface.animate(&self.layer, key, mark, duration),
                    None => surface.update(&self.layer, key, mark),
                }
                stats.updated += 1;
            } else {
                surface.enter(&self.layer, key, mark);
                self.live.insert(key.clone());
                stats.entered += 1;
            }
        }

        let elements = self
            .live
            .iter()
            .filter_map(|k| incoming.get(k).map(|(_, d)| (k.clone(), (*d).clone())))
            .collect();

        log::trace!(
            "join '{}': {} entered, {} updated, {} exited",
            self.layer,
            stats.entered,
            stats.updated,
            stats.exited
        );

        Ok((
            LiveElements {
                layer: self.layer.clone(),
                elements,
            },
            stats,
        ))
    }

    /// Remove every live element. Returns how many were removed.
    pub fn clear<S: Surface + ?Sized>(&mut self, surface: &mut S) -> usize {
        let n = self.live.len();
        for key in self.live.drain(..) {
            surface.exit(&self.layer, &key);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::geometry::Rect;
    use crate::surface::{Scene, Shape, Style};

    fn bar(k: &str, v: f32) -> DataPoint {
        DataPoint::new().with("k", k).with("v", v)
    }

    fn rect_mark(d: &DataPoint, i: usize) -> Result<Mark> {
        let v = d.number("v", i)?;
        Ok(Mark::new(Shape::Rect(Rect::new(i as f32, 0.0, 1.0, v)), Style::fill(Rgba::BLACK)))
    }

    #[test]
    fn test_join_enters_in_dataset_order() {
        let mut scene = Scene::new();
        let mut binder = ElementBinder::new("bars");
        let data = vec![bar("Jan", 10.0), bar("Feb", 20.0)];
        let (live, stats) = binder
            .join(&data, &KeyField::single("k"), rect_mark, &mut scene)
            .expect("operation should succeed");
        assert_eq!(stats.entered, 2);
        assert_eq!(live.len(), 2);
        assert_eq!(scene.keys("bars"), vec![Key::single("Jan"), Key::single("Feb")]);
    }

    #[test]
    fn test_join_exit_update_enter() {
        let mut scene = Scene::new();
        let mut binder = ElementBinder::new("bars");
        let key = KeyField::single("k");
        binder
            .join(&[bar("Jan", 1.0), bar("Feb", 2.0)], &key, rect_mark, &mut scene)
            .expect("operation should succeed");
        let (live, stats) = binder
            .join(&[bar("Mar", 3.0), bar("Feb", 5.0)], &key, rect_mark, &mut scene)
            .expect("operation should succeed");
        assert_eq!(
            stats,
            JoinStats {
                entered: 1,
                updated: 1,
                exited: 1
            }
        );
        // Feb keeps its slot; Mar appends.
        assert_eq!(scene.keys("bars"), vec![Key::single("Feb"), Key::single("Mar")]);
        assert_eq!(live.keys().cloned().collect::<Vec<_>>(), scene.keys("bars"));
        assert_eq!(
            live.datum(&Key::single("Feb")).and_then(|d| d.get("v")).and_then(|v| v.as_f32()),
            Some(5.0)
        );
    }

    #[test]
    fn test_join_updates_do_not_reorder() {
        let mut scene = Scene::new();
        let mut binder = ElementBinder::new("bars");
        let key = KeyField::single("k");
        binder
            .join(&[bar("a", 1.0), bar("b", 2.0)], &key, rect_mark, &mut scene)
            .expect("operation should succeed");
        binder
            .join(&[bar("b", 1.0), bar("a", 2.0)], &key, rect_mark, &mut scene)
            .expect("operation should succeed");
        assert_eq!(scene.keys("bars"), vec![Key::single("a"), Key::single("b")]);
    }

    #[test]
    fn test_duplicate_key_aborts_before_drawing() {
        let mut scene = Scene::new();
        let mut binder = ElementBinder::new("bars");
        let key = KeyField::single("k");
        binder
            .join(&[bar("a", 1.0)], &key, rect_mark, &mut scene)
            .expect("operation should succeed");
        let err = binder
            .join(&[bar("b", 1.0), bar("b", 2.0)], &key, rect_mark, &mut scene)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { ref key } if key == "b"));
        assert_eq!(scene.keys("bars"), vec![Key::single("a")]);
        assert_eq!(scene.stats().exited, 0);
    }

    #[test]
    fn test_mark_error_aborts_before_drawing() {
        let mut scene = Scene::new();
        let mut binder = ElementBinder::new("bars");
        let err = binder
            .join(
                &[bar("a", 1.0), DataPoint::new().with("k", "b")],
                &KeyField::single("k"),
                rect_mark,
                &mut scene,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Schema { index: 1, .. }));
        assert_eq!(scene.stats().entered, 0);
    }

    #[test]
    fn test_join_animated_uses_transition() {
        let mut scene = Scene::new();
        let mut binder = ElementBinder::new("bars");
        let key = KeyField::single("k");
        binder
            .join(&[bar("a", 1.0)], &key, rect_mark, &mut scene)
            .expect("operation should succeed");
        binder
            .join_animated(&[bar("a", 2.0)], &key, rect_mark, &mut scene, Duration::from_millis(500))
            .expect("operation should succeed");
        assert_eq!(scene.stats().animated, 1);
        assert_eq!(scene.stats().updated, 0);
    }

    #[test]
    fn test_check_keys() {
        let key = KeyField::single("k");
        assert!(check_keys(&[bar("a", 1.0), bar("b", 2.0)], &key).is_ok());
        assert!(matches!(
            check_keys(&[bar("a", 1.0), bar("a", 2.0)], &key),
            Err(Error::DuplicateKey { .. })
        ));
        assert!(matches!(
            check_keys(&[DataPoint::new()], &key),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn test_clear_exits_everything() {
        let mut scene = Scene::new();
        let mut binder = ElementBinder::new("bars");
        binder
            .join(&[bar("a", 1.0), bar("b", 1.0)], &KeyField::single("k"), rect_mark, &mut scene)
            .expect("operation should succeed");
        assert_eq!(binder.clear(&mut scene), 2);
        assert!(scene.keys("bars").is_empty());
        assert_eq!(binder.live_keys().count(), 0);
    }
}
