//! Per-layer tooltip lifecycle.

use crate::binder::LiveElements;
use crate::data::DataPoint;
use crate::error::Result;
use crate::surface::{TooltipHost, TooltipId};
use std::fmt;
use std::rc::Rc;

/// Computes tooltip text from an element's datum.
pub type TooltipAccessor = Rc<dyn Fn(&DataPoint) -> Result<String>>;

/// Wrap a closure as a [`TooltipAccessor`].
pub fn accessor<F>(f: F) -> TooltipAccessor
where
    F: Fn(&DataPoint) -> Result<String> + 'static,
{
    Rc::new(f)
}

/// Owns the tooltip instances of one layer.
///
/// Every refresh destroys the previous instances before creating new ones, so
/// instances never outlive the elements they were created for.
#[derive(Default)]
pub struct TooltipManager {
    accessor: Option<TooltipAccessor>,
    instances: Vec<TooltipId>,
}

impl fmt::Debug for TooltipManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TooltipManager")
            .field("has_accessor", &self.accessor.is_some())
            .field("instances", &self.instances.len())
            .finish()
    }
}

impl TooltipManager {
    /// Create a manager with no accessor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the content accessor. Takes effect on the next refresh.
    pub fn set_content_accessor(&mut self, accessor: Option<TooltipAccessor>) {
        self.accessor = accessor;
    }

    /// Swap in `accessor` without refreshing; returns the previous one.
    pub fn replace_content_accessor(&mut self, accessor: Option<TooltipAccessor>) -> Option<TooltipAccessor> {
        std::mem::replace(&mut self.accessor, accessor)
    }

    /// Run the accessor over `data` without attaching anything.
    ///
    /// # Errors
    ///
    /// Returns the first accessor error.
    pub fn check(&self, data: &[DataPoint]) -> Result<()> {
        let Some(accessor) = self.accessor.as_ref() else {
            return Ok(());
        };
        data.iter().try_for_each(|d| accessor(d).map(drop))
    }

    /// True if an accessor is set.
    #[must_use]
    pub fn has_accessor(&self) -> bool {
        self.accessor.is_some()
    }

    /// Number of live tooltip instances.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Destroy previous instances, then attach one tooltip per live element.
    ///
    /// Returns the number of instances created.
    ///
    /// # Errors
    ///
    /// Propagates the first accessor error. Previous instances are already
    /// destroyed at that point and nothing new is attached.
    pub fn refresh<H: TooltipHost + ?Sized>(&mut self, live: &LiveElements, host: &mut H) -> Result<usize> {
        let destroyed = self.clear(host);

        let Some(accessor) = self.accessor.clone() else {
            return Ok(0);
        };

        let targets = live
            .iter()
            .map(|(key, datum)| accessor(datum).map(|text| (key.clone(), text)))
            .collect::<Result<Vec<_>>>()?;

        self.instances = host.create(live.layer(), &targets);
        log::trace!(
            "tooltips '{}': {} destroyed, {} created",
            live.layer(),
            destroyed,
            self.instances.len()
        );
        Ok(self.instances.len())
    }

    /// Destroy all instances. Returns how many were destroyed.
    pub fn clear<H: TooltipHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let n = self.instances.len();
        if n > 0 {
            host.destroy(&self.instances);
            self.instances.clear();
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::ElementBinder;
    use crate::color::Rgba;
    use crate::data::{Key, KeyField};
    use crate::error::Error;
    use crate::geometry::Rect;
    use crate::surface::{Mark, Scene, Shape, Style};

    fn live(scene: &mut Scene, keys: &[&str]) -> LiveElements {
        let data: Vec<DataPoint> = keys.iter().map(|k| DataPoint::new().with("k", *k).with("v", 1.0f32)).collect();
        let mut binder = ElementBinder::new("bars");
        binder
            .join(
                &data,
                &KeyField::single("k"),
                |_, _| Ok(Mark::new(Shape::Rect(Rect::default()), Style::fill(Rgba::BLACK))),
                scene,
            )
            .expect("operation should succeed")
            .0
    }

    fn label() -> TooltipAccessor {
        accessor(|d| Ok(format!("{}: {}", d.text("k").unwrap_or_default(), d.get("v").map(ToString::to_string).unwrap_or_default())))
    }

    #[test]
    fn test_no_accessor_no_tooltips() {
        let mut scene = Scene::new();
        let elements = live(&mut scene, &["a", "b"]);
        let mut tips = TooltipManager::new();
        assert_eq!(tips.refresh(&elements, &mut scene).expect("operation should succeed"), 0);
        assert_eq!(scene.tooltips().count(), 0);
    }

    #[test]
    fn test_refresh_attaches_text() {
        let mut scene = Scene::new();
        let elements = live(&mut scene, &["a"]);
        let mut tips = TooltipManager::new();
        tips.set_content_accessor(Some(label()));
        tips.refresh(&elements, &mut scene).expect("operation should succeed");
        assert_eq!(scene.tooltip_text("bars", &Key::single("a")), Some("a: 1"));
    }

    #[test]
    fn test_refresh_never_leaks_instances() {
        let mut scene = Scene::new();
        let elements = live(&mut scene, &["a", "b", "c"]);
        let mut tips = TooltipManager::new();
        tips.set_content_accessor(Some(label()));
        for _ in 0..5 {
            tips.refresh(&elements, &mut scene).expect("operation should succeed");
        }
        assert_eq!(scene.tooltips().count(), 3);
        assert_eq!(scene.stats().tooltips_destroyed, 12);
    }

    #[test]
    fn test_clearing_accessor_removes_tooltips() {
        let mut scene = Scene::new();
        let elements = live(&mut scene, &["a"]);
        let mut tips = TooltipManager::new();
        tips.set_content_accessor(Some(label()));
        tips.refresh(&elements, &mut scene).expect("operation should succeed");
        tips.set_content_accessor(None);
        tips.refresh(&elements, &mut scene).expect("operation should succeed");
        assert_eq!(scene.tooltips().count(), 0);
        assert_eq!(tips.instance_count(), 0);
    }

    #[test]
    fn test_accessor_error_propagates() {
        let mut scene = Scene::new();
        let elements = live(&mut scene, &["a"]);
        let mut tips = TooltipManager::new();
        tips.set_content_accessor(Some(accessor(|_| Err(Error::Accessor("no label".to_string())))));
        let err = tips.refresh(&elements, &mut scene).unwrap_err();
        assert!(matches!(err, Error::Accessor(_)));
        assert_eq!(scene.tooltips().count(), 0);
    }

    #[test]
    fn test_check_runs_accessor_without_attaching() {
        let mut scene = Scene::new();
        let elements = live(&mut scene, &["a"]);
        let mut tips = TooltipManager::new();
        tips.set_content_accessor(Some(label()));
        tips.refresh(&elements, &mut scene).expect("operation should succeed");

        let only_a = accessor(|d| match d.text("k") {
            Some("a") => Ok("a".to_string()),
            _ => Err(Error::Accessor("not a".to_string())),
        });
        let previous = tips.replace_content_accessor(Some(only_a));
        assert!(previous.is_some());
        let b = [DataPoint::new().with("k", "b")];
        assert!(matches!(tips.check(&b), Err(Error::Accessor(_))));
        assert!(tips.check(&[DataPoint::new().with("k", "a")]).is_ok());
        assert_eq!(scene.tooltip_text("bars", &Key::single("a")), Some("a: 1"));
        assert_eq!(tips.instance_count(), 1);
    }
}
