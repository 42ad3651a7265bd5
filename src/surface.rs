//! Drawing and tooltip collaborator interfaces.
//!
//! Charts never rasterize. They hand keyed target geometry to a [`Surface`]
//! through enter/update/exit calls and tooltip text to a [`TooltipHost`].
//! [`Scene`] is a retained in-memory implementation of both, used by hosts
//! that diff or serialize the result and by the test suite.

use crate::color::Rgba;
use crate::data::Key;
use crate::geometry::{ArcSpan, Point, Rect, ViewTransform};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Marks
// ============================================================================

/// Interpolation hint for polylines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    /// Straight segments.
    Linear,
    /// Natural cubic spline.
    #[default]
    Natural,
    /// Monotone in x.
    MonotoneX,
    /// Step function.
    Step,
    /// Catmull-Rom spline.
    CatmullRom,
}

/// Text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Anchor at the start of the text.
    #[default]
    Start,
    /// Anchor at the middle.
    Middle,
    /// Anchor at the end.
    End,
}

/// Target geometry of one element.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// Circle.
    Circle {
        /// Centre.
        center: Point,
        /// Radius.
        radius: f32,
    },
    /// Annular sector around `center`.
    Arc {
        /// Centre of the circle the sector belongs to.
        center: Point,
        /// Angular and radial extent.
        span: ArcSpan,
    },
    /// Open polyline through `points`.
    Polyline {
        /// Vertices in drawing order.
        points: Vec<Point>,
        /// Interpolation hint.
        curve: Curve,
    },
    /// A text label.
    Text {
        /// Anchor position.
        position: Point,
        /// Label content.
        content: String,
        /// Horizontal anchor.
        anchor: Anchor,
        /// Rotation in degrees.
        rotation: f32,
    },
    /// Pre-built path data.
    Path(String),
}

/// Paint attributes of a mark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Fill color, `None` for no fill.
    pub fill: Option<Rgba>,
    /// Stroke color, `None` for no stroke.
    pub stroke: Option<Rgba>,
    /// Stroke width in pixels.
    pub stroke_width: f32,
    /// Whether the element is displayed.
    pub visible: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            visible: true,
        }
    }
}

impl Style {
    /// Filled style.
    #[must_use]
    pub fn fill(color: Rgba) -> Self {
        Self {
            fill: Some(color),
            ..Self::default()
        }
    }

    /// Stroked style without fill.
    #[must_use]
    pub fn stroke(color: Rgba, width: f32) -> Self {
        Self {
            stroke: Some(color),
            stroke_width: width,
            ..Self::default()
        }
    }

    /// Set the stroke.
    #[must_use]
    pub fn with_stroke(mut self, color: Rgba, width: f32) -> Self {
        self.stroke = Some(color);
        self.stroke_width = width;
        self
    }

    /// Set visibility.
    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// A shape with its paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    /// Geometry.
    pub shape: Shape,
    /// Paint.
    pub style: Style,
}

impl Mark {
    /// Create a mark.
    #[must_use]
    pub fn new(shape: Shape, style: Style) -> Self {
        Self { shape, style }
    }

    /// Centre of the circle, if this is a circle.
    #[must_use]
    pub fn circle(&self) -> Option<(Point, f32)> {
        match self.shape {
            Shape::Circle { center, radius } => Some((center, radius)),
            _ => None,
        }
    }

    /// Arc span, if this is an arc.
    #[must_use]
    pub fn arc(&self) -> Option<ArcSpan> {
        match self.shape {
            Shape::Arc { span, .. } => Some(span),
            _ => None,
        }
    }

    /// Rectangle, if this is a rectangle.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        match self.shape {
            Shape::Rect(r) => Some(r),
            _ => None,
        }
    }
}

// ============================================================================
// Axes and legends
// ============================================================================

/// Which edge of the chart area an axis sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    /// Below the chart area.
    Bottom,
    /// Left of the chart area.
    Left,
}

/// One axis tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Offset along the axis in pixels.
    pub offset: f32,
    /// Tick label.
    pub label: String,
}

/// A positioned text title.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    /// Title text.
    pub text: String,
    /// Anchor position in canvas coordinates (before rotation).
    pub position: Point,
    /// Rotation in degrees.
    pub rotation: f32,
}

/// A fully resolved axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    /// Edge of the chart area.
    pub side: AxisSide,
    /// Axis origin in canvas coordinates.
    pub origin: Point,
    /// Ticks in axis order.
    pub ticks: Vec<Tick>,
    /// Tick length in pixels.
    pub tick_size: f32,
    /// Optional title.
    pub title: Option<Title>,
}

/// A color legend.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Legend {
    /// Legend heading.
    pub title: Option<String>,
    /// `(label, color)` entries in display order.
    pub entries: Vec<(String, Rgba)>,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Keyed retained drawing target.
///
/// Elements are addressed by `(layer, key)`. Implementations interpolate
/// animations themselves; a new target for an animating element supersedes the
/// old one.
pub trait Surface {
    /// Create an element.
    fn enter(&mut self, layer: &str, key: &Key, mark: &Mark);

    /// Replace an element's geometry immediately.
    fn update(&mut self, layer: &str, key: &Key, mark: &Mark);

    /// Animate an element towards `mark` over `duration`.
    fn animate(&mut self, layer: &str, key: &Key, mark: &Mark, duration: Duration);

    /// Remove an element.
    fn exit(&mut self, layer: &str, key: &Key);

    /// Set or clear the emphasis flag of an element.
    fn set_emphasis(&mut self, layer: &str, key: &Key, emphasized: bool);

    /// Set the viewport transform of a layer.
    fn set_transform(&mut self, layer: &str, transform: ViewTransform);

    /// Replace all axes.
    fn set_axes(&mut self, axes: &[AxisSpec]);

    /// Replace all legends.
    fn set_legends(&mut self, legends: &[Legend]);
}

/// Handle of one tooltip instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TooltipId(pub u64);

/// Tooltip popup collaborator.
pub trait TooltipHost {
    /// Attach one tooltip per `(key, text)` pair to elements of `layer`.
    fn create(&mut self, layer: &str, targets: &[(Key, String)]) -> Vec<TooltipId>;

    /// Destroy tooltip instances.
    fn destroy(&mut self, ids: &[TooltipId]);
}

// ============================================================================
// Scene
// ============================================================================

/// A retained element.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneElement {
    /// Current target geometry.
    pub mark: Mark,
    /// Emphasis flag.
    pub emphasized: bool,
    /// Duration of the last animation issued to this element.
    pub last_animation: Option<Duration>,
}

/// A retained layer: elements in creation order plus a viewport transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneLayer {
    elements: IndexMap<Key, SceneElement>,
    transform: ViewTransform,
}

impl SceneLayer {
    /// Element by key.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&SceneElement> {
        self.elements.get(key)
    }

    /// Keys in creation order.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.elements.keys().cloned().collect()
    }

    /// Elements in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &SceneElement)> {
        self.elements.iter()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if the layer has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Current viewport transform.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }
}

/// Call counters, for observing churn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Elements created.
    pub entered: usize,
    /// Immediate updates.
    pub updated: usize,
    /// Animated updates.
    pub animated: usize,
    /// Elements removed.
    pub exited: usize,
    /// Transform changes.
    pub transforms: usize,
    /// Tooltip instances created.
    pub tooltips_created: usize,
    /// Tooltip instances destroyed.
    pub tooltips_destroyed: usize,
}

/// A tooltip attached to an element.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTooltip {
    /// Layer of the element.
    pub layer: String,
    /// Key of the element.
    pub key: Key,
    /// Tooltip text.
    pub text: String,
}

/// In-memory retained scene.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    layers: IndexMap<String, SceneLayer>,
    axes: Vec<AxisSpec>,
    legends: Vec<Legend>,
    tooltips: IndexMap<TooltipId, SceneTooltip>,
    next_tooltip: u64,
    stats: SceneStats,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer by name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&SceneLayer> {
        self.layers.get(name)
    }

    /// Element by layer and key.
    #[must_use]
    pub fn element(&self, layer: &str, key: &Key) -> Option<&SceneElement> {
        self.layers.get(layer).and_then(|l| l.get(key))
    }

    /// Keys of a layer in creation order (empty if the layer does not exist).
    #[must_use]
    pub fn keys(&self, layer: &str) -> Vec<Key> {
        self.layers.get(layer).map(SceneLayer::keys).unwrap_or_default()
    }

    /// Keys of emphasized elements of a layer.
    #[must_use]
    pub fn emphasized(&self, layer: &str) -> Vec<Key> {
        self.layers
            .get(layer)
            .map(|l| {
                l.iter()
                    .filter(|(_, e)| e.emphasized)
                    .map(|(k, _)| k.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of emphasized elements across all layers.
    #[must_use]
    pub fn emphasized_count(&self) -> usize {
        self.layers
            .values()
            .map(|l| l.elements.values().filter(|e| e.emphasized).count())
            .sum()
    }

    /// Transform of a layer (identity if unset).
    #[must_use]
    pub fn transform(&self, layer: &str) -> ViewTransform {
        self.layers.get(layer).map(SceneLayer::transform).unwrap_or_default()
    }

    /// Current axes.
    #[must_use]
    pub fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    /// Current legends.
    #[must_use]
    pub fn legends(&self) -> &[Legend] {
        &self.legends
    }

    /// Live tooltip instances.
    pub fn tooltips(&self) -> impl Iterator<Item = &SceneTooltip> {
        self.tooltips.values()
    }

    /// Tooltip text of an element, if one is attached.
    #[must_use]
    pub fn tooltip_text(&self, layer: &str, key: &Key) -> Option<&str> {
        self.tooltips
            .values()
            .find(|t| t.layer == layer && &t.key == key)
            .map(|t| t.text.as_str())
    }

    /// Call counters.
    #[must_use]
    pub fn stats(&self) -> SceneStats {
        self.stats
    }

    fn layer_mut(&mut self, layer: &str) -> &mut SceneLayer {
        self.layers.entry(layer.to_string()).or_default()
    }

    fn retarget(&mut self, layer: &str, key: &Key, mark: &Mark, animation: Option<Duration>) {
        let l = self.layer_mut(layer);
        match l.elements.get_mut(key) {
            Some(e) => {
                e.mark = mark.clone();
                e.last_animation = animation;
            }
            None => {
                log::warn!("update of unknown element {key} in layer '{layer}'");
                l.elements.insert(
                    key.clone(),
                    SceneElement {
                        mark: mark.clone(),
                        emphasized: false,
                        last_animation: animation,
                    },
                );
            }
        }
    }
}

impl Surface for Scene {
    fn enter(&mut self, layer: &str, key: &Key, mark: &Mark) {
        self.stats.entered += 1;
        self.layer_mut(layer).elements.insert(
            key.clone(),
            SceneElement {
                mark: mark.clone(),
                emphasized: false,
                last_animation: None,
            },
        );
    }

    fn update(&mut self, layer: &str, key: &Key, mark: &Mark) {
        self.stats.updated += 1;
        self.retarget(layer, key, mark, None);
    }

    fn animate(&mut self, layer: &str, key: &Key, mark: &Mark, duration: Duration) {
        self.stats.animated += 1;
        self.retarget(layer, key, mark, Some(duration));
    }

    fn exit(&mut self, layer: &str, key: &Key) {
        self.stats.exited += 1;
        if let Some(l) = self.layers.get_mut(layer) {
            l.elements.shift_remove(key);
        }
    }

    fn set_emphasis(&mut self, layer: &str, key: &Key, emphasized: bool) {
        if let Some(e) = self.layers.get_mut(layer).and_then(|l| l.elements.get_mut(key)) {
            e.emphasized = emphasized;
        }
    }

    fn set_transform(&mut self, layer: &str, transform: ViewTransform) {
        self.stats.transforms += 1;
        self.layer_mut(layer).transform = transform;
    }

    fn set_axes(&mut self, axes: &[AxisSpec]) {
        self.axes = axes.to_vec();
    }

    fn set_legends(&mut self, legends: &[Legend]) {
        self.legends = legends.to_vec();
    }
}

impl TooltipHost for Scene {
    fn create(&mut self, layer: &str, targets: &[(Key, String)]) -> Vec<TooltipId> {
        let mut ids = Vec::with_capacity(targets.len());
        for (key, text) in targets {
            let id = TooltipId(self.next_tooltip);
            self.next_tooltip += 1;
            self.tooltips.insert(
                id,
                SceneTooltip {
                    layer: layer.to_string(),
                    key: key.clone(),
                    text: text.clone(),
                },
            );
            ids.push(id);
        }
        self.stats.tooltips_created += ids.len();
        ids
    }

    fn destroy(&mut self, ids: &[TooltipId]) {
        for id in ids {
            if self.tooltips.shift_remove(id).is_some() {
                self.stats.tooltips_destroyed += 1;
            }
        }
    }
}
