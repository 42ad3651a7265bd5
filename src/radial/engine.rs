//! Sunburst view over a [`Hierarchy`].
//!
//! The engine draws one arc per node on the `burst` layer (the root ring is
//! kept but hidden) and an optional pie of flat data on the `center` layer.
//! Interior nodes take the color of their depth-1 ancestor, leaves are colored
//! by their own attribute, and two legends describe both color scales.
//!
//! Besides the shared highlight contract the engine has three behaviors of its
//! own:
//!
//! - **Leaf extension.** Highlighting a node that names an extension attribute
//!   pushes out every leaf sharing the highlighted value on that attribute.
//! - **Zoom.** Pans move the viewport; scale changes relayout with a
//!   compensated stroke width.
//! - **Swap.** An alternate dataset and options can be swapped in by a
//!   selection event. Swapping twice restores the first view exactly.

use super::hierarchy::Hierarchy;
use super::layout::{partition, Layout, LayoutNode};
use super::zoom::{ZoomExtent, ZoomOutcome, ZoomState, ZoomTransform};
use crate::binder::{check_keys, ElementBinder};
use crate::chart::{pie_angles, Canvas, ChartBase, Interactive, RenderResult, Tooltippable};
use crate::color::{Palette, Rgba};
use crate::data::{column, Dataset, Key, KeyField};
use crate::error::{Error, Result};
use crate::geometry::{ArcSpan, Point};
use crate::interaction::{Handlers, PointerEvent, Triggered};
use crate::scale::OrdinalScale;
use crate::surface::{Legend, Mark, Scene, Shape, Style, Surface, TooltipHost};
use crate::tooltip::TooltipAccessor;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::time::Duration;

/// Layer holding the hierarchy arcs.
pub const BURST: &str = "burst";
/// Layer holding the centre pie.
pub const CENTER: &str = "center";
/// Datum field carrying a node's path identity.
pub const NODE_ID: &str = "node_id";
/// Duration of leaf extension and its reset.
pub const EXTEND_DURATION: Duration = Duration::from_millis(300);

// Share of the half-extent used by the outermost ring.
const RADIUS_FILL: f32 = 0.95;

/// Sunburst options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialOptions {
    /// Attribute of depth-1 nodes that colors their whole branch.
    pub inner_color_attr: String,
    /// Attribute that colors leaves.
    pub leaf_color_attr: String,
    /// Rotation of the whole burst in degrees.
    pub spin: f32,
    /// Branch colors.
    pub category_palette: Palette,
    /// Leaf colors.
    pub leaf_palette: Palette,
    /// Centre pie colors, by slice index.
    pub center_palette: Palette,
    /// Allowed zoom scale range.
    pub zoom_extent: ZoomExtent,
    /// Outer radius multiplier of extended leaves.
    pub extend_factor: f32,
    /// Interaction key override.
    pub highlight_key: Option<KeyField>,
}

impl Default for RadialOptions {
    fn default() -> Self {
        Self {
            inner_color_attr: "k".to_string(),
            leaf_color_attr: "k".to_string(),
            spin: 0.0,
            category_palette: Palette::category10(),
            leaf_palette: Palette::set2(),
            center_palette: Palette::paired(),
            zoom_extent: ZoomExtent::default(),
            extend_factor: 1.05,
            highlight_key: None,
        }
    }
}

impl RadialOptions {
    fn validate(&self) -> Result<()> {
        for (name, palette) in [
            ("category_palette", &self.category_palette),
            ("leaf_palette", &self.leaf_palette),
            ("center_palette", &self.center_palette),
        ] {
            if palette.is_empty() {
                return Err(Error::config(name, "a palette needs at least one color"));
            }
        }
        if !self.spin.is_finite() {
            return Err(Error::config("spin", format!("{} is not an angle", self.spin)));
        }
        if !(self.extend_factor > 0.0) {
            return Err(Error::config("extend_factor", format!("{} is not a positive factor", self.extend_factor)));
        }
        self.zoom_extent.validate()
    }
}

/// Everything a render depends on; the unit exchanged by a swap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RadialConfig {
    /// Tree and centre data.
    pub hierarchy: Hierarchy,
    /// Render options.
    pub options: RadialOptions,
}

impl RadialConfig {
    /// Bundle a hierarchy with its options.
    #[must_use]
    pub fn new(hierarchy: Hierarchy, options: RadialOptions) -> Self {
        Self { hierarchy, options }
    }
}

/// Called with the newly active configuration after a swap or on initialization.
pub type SwapListener = Rc<dyn Fn(&RadialConfig)>;

// Geometry and paint resolved by a render, reused by relayouts.
#[derive(Debug, Clone)]
struct Drawn {
    layout: Layout,
    nodes: Dataset,
    fills: Vec<Rgba>,
    index: IndexMap<Key, usize>,
    center: Dataset,
    center_spans: Vec<ArcSpan>,
    center_fills: Vec<Rgba>,
}

impl Drawn {
    fn arc(&self, i: usize, stroke_width: f32, factor: f32) -> Mark {
        let node = &self.layout.nodes[i];
        let span = node.drawn_span();
        let span = span.with_outer_radius(span.outer_radius * factor);
        Mark::new(
            Shape::Arc {
                center: Point::ORIGIN,
                span,
            },
            Style::fill(self.fills[i])
                .with_stroke(Rgba::WHITE, stroke_width)
                .visible(node.depth > 0),
        )
    }
}

/// The radial hierarchy engine.
pub struct RadialEngine<B = Scene> {
    base: ChartBase<B>,
    burst: ElementBinder,
    center: ElementBinder,
    zoom: ZoomState,
    current: Option<RadialConfig>,
    alternate: Option<RadialConfig>,
    drawn: Option<Drawn>,
    extended: IndexSet<Key>,
    // field of the last `highlight_by`; `None` means the interaction key
    emphasis_field: Option<KeyField>,
    swap_listener: Option<SwapListener>,
    validations: usize,
}

impl<B: std::fmt::Debug> std::fmt::Debug for RadialEngine<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadialEngine")
            .field("base", &self.base)
            .field("zoom", &self.zoom)
            .field("current", &self.current)
            .field("alternate", &self.alternate.is_some())
            .field("extended", &self.extended)
            .field("swap_listener", &self.swap_listener.is_some())
            .finish_non_exhaustive()
    }
}

impl RadialEngine<Scene> {
    /// Engine drawing into an in-memory scene.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self::with_backend(canvas, Scene::new())
    }
}

impl<B: Surface + TooltipHost> RadialEngine<B> {
    /// Engine drawing into `backend`.
    pub fn with_backend(canvas: Canvas, backend: B) -> Self {
        Self {
            zoom: ZoomState::new(canvas.chart_width(), canvas.chart_height()),
            base: ChartBase::new(canvas, backend, BURST, KeyField::single("k")),
            burst: ElementBinder::new(BURST),
            center: ElementBinder::new(CENTER),
            current: None,
            alternate: None,
            drawn: None,
            extended: IndexSet::new(),
            emphasis_field: None,
            swap_listener: None,
            validations: 0,
        }
    }

    /// Shared chart state.
    #[must_use]
    pub fn base(&self) -> &ChartBase<B> {
        &self.base
    }

    /// Drawing collaborator.
    #[must_use]
    pub fn surface(&self) -> &B {
        self.base.surface()
    }

    /// Zoom state.
    #[must_use]
    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    /// The configuration on screen.
    #[must_use]
    pub fn current(&self) -> Option<&RadialConfig> {
        self.current.as_ref()
    }

    /// The configuration a swap would bring in.
    #[must_use]
    pub fn alternate(&self) -> Option<&RadialConfig> {
        self.alternate.as_ref()
    }

    /// Layout of the last render.
    #[must_use]
    pub fn layout(&self) -> Option<&Layout> {
        self.drawn.as_ref().map(|d| &d.layout)
    }

    /// Element key of the node at `path` (keys from the root down).
    #[must_use]
    pub fn element_key(path: &[&str]) -> Key {
        Key::single(path.join("/"))
    }

    /// Element keys of leaves currently extended.
    pub fn extended(&self) -> impl Iterator<Item = &Key> {
        self.extended.iter()
    }

    /// Number of tree validations performed.
    #[must_use]
    pub fn validations(&self) -> usize {
        self.validations
    }

    /// Radius of the outermost ring.
    #[must_use]
    pub fn radius(&self) -> f32 {
        let c = self.base.canvas();
        c.chart_width().min(c.chart_height()) / 2.0 * RADIUS_FILL
    }

    // Centre of the chart area in canvas coordinates.
    fn anchor(&self) -> Point {
        let c = self.base.canvas();
        Point::new(c.margin.left + c.chart_width() / 2.0, c.margin.top + c.chart_height() / 2.0)
    }

    /// Render a hierarchy, keeping any alternate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTree`] for an invalid tree, [`Error::Config`]
    /// for invalid options, [`Error::Schema`] when a color attribute or centre
    /// field is missing, and [`Error::DuplicateKey`] for siblings sharing a key.
    /// Nothing is drawn on error.
    pub fn render(&mut self, hierarchy: Hierarchy, options: RadialOptions) -> Result<RenderResult> {
        let config = RadialConfig::new(hierarchy, options);
        let result = self.draw(&config)?;
        self.current = Some(config);
        Ok(result)
    }

    /// Set the configuration a later [`swap_on`](Self::swap_on) brings in.
    pub fn set_alternate(&mut self, alternate: Option<RadialConfig>) {
        self.alternate = alternate;
    }

    /// Set or clear the listener told about swaps.
    pub fn set_swap_listener(&mut self, listener: Option<SwapListener>) {
        self.swap_listener = listener;
    }

    /// Render `primary`, store `alternate`, and tell the swap listener which
    /// configuration is active so linked views can sync their initial state.
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render).
    pub fn initialize(&mut self, primary: RadialConfig, alternate: Option<RadialConfig>) -> Result<RenderResult> {
        let result = self.draw(&primary)?;
        self.current = Some(primary);
        self.alternate = alternate;
        self.notify();
        Ok(result)
    }

    /// Swap the current and alternate configurations if any of `values` is
    /// among `triggers`. Resets zoom and re-renders. Returns whether a swap
    /// happened.
    ///
    /// # Errors
    ///
    /// Returns the render error of the alternate; both configurations are
    /// left unchanged in that case.
    pub fn swap_on(&mut self, values: &[Key], triggers: &[Key]) -> Result<bool> {
        if !values.iter().any(|v| triggers.contains(v)) {
            return Ok(false);
        }
        let Some(next) = self.alternate.clone() else {
            log::debug!("swap requested without alternate data");
            return Ok(false);
        };
        let saved_zoom = self.zoom.clone();
        self.zoom.reset();
        if let Err(e) = self.draw(&next) {
            self.zoom = saved_zoom;
            return Err(e);
        }
        self.alternate = self.current.replace(next);
        log::info!("radial view swapped data on {}", values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "));
        self.notify();
        Ok(true)
    }

    fn notify(&self) {
        if let (Some(listener), Some(current)) = (&self.swap_listener, &self.current) {
            listener(current);
        }
    }

    /// Apply a zoom gesture.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] before the first render, or a tooltip
    /// accessor error from the relayout.
    pub fn on_zoom(&mut self, requested: ZoomTransform) -> Result<ZoomOutcome> {
        let Some(spin) = self.current.as_ref().map(|c| c.options.spin) else {
            return Err(Error::config("zoom", "radial view has not been rendered"));
        };
        let changed = self.zoom.apply(requested);
        let transform = self.zoom.view_transform(self.anchor(), spin);
        let surface = self.base.surface_mut();
        surface.set_transform(BURST, transform);
        surface.set_transform(CENTER, transform);
        if !changed {
            return Ok(ZoomOutcome::Transformed(transform));
        }
        log::debug!("radial relayout at k = {}", self.zoom.scale());
        self.emit(None)?;
        Ok(ZoomOutcome::Relayout(transform))
    }

    // Validate and resolve everything, then draw.
    fn draw(&mut self, config: &RadialConfig) -> Result<RenderResult> {
        let options = &config.options;
        self.base.canvas().validate()?;
        options.validate()?;
        self.validations += 1;
        config.hierarchy.root.validate()?;

        let layout = partition(&config.hierarchy.root, self.radius());
        let nodes: Dataset = layout
            .nodes
            .iter()
            .map(|n| {
                let id = n.path.values().iter().map(ToString::to_string).collect::<Vec<_>>().join("/");
                n.datum.clone().with(NODE_ID, id)
            })
            .collect();
        let id_field = KeyField::single(NODE_ID);
        check_keys(&nodes, &id_field)?;
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, d)| id_field.extract(d, i).map(|k| (k, i)))
            .collect::<Result<IndexMap<_, _>>>()?;
        self.base.check_tooltips(&nodes)?;

        let (fills, legends) = Self::colors(&layout, options)?;

        let center = config.hierarchy.center.clone().unwrap_or_default();
        check_keys(&center, &KeyField::single("k"))?;
        let values = column(&center, "v")?;
        if let Some(v) = values.iter().find(|v| **v < 0.0) {
            return Err(Error::config("v", format!("centre slice value {v} is negative")));
        }
        let center_radius = layout.radius / ((layout.height + 1) as f32 + 0.05);
        let center_spans = pie_angles(&values, 0.0)
            .into_iter()
            .map(|(start, end)| ArcSpan::new(start, end, 0.0, center_radius))
            .collect();
        let center_fills = (0..center.len()).map(|i| options.center_palette.color(i)).collect();

        let extent_changed = self.zoom.extent() != options.zoom_extent;
        if extent_changed {
            let c = self.base.canvas();
            self.zoom = ZoomState::with_extent(options.zoom_extent, c.chart_width(), c.chart_height())?;
        }

        let transform = self.zoom.view_transform(self.anchor(), options.spin);
        let surface = self.base.surface_mut();
        surface.set_transform(BURST, transform);
        surface.set_transform(CENTER, transform);
        surface.set_axes(&[]);
        surface.set_legends(&legends);

        self.extended.clear();
        self.drawn = Some(Drawn {
            layout,
            nodes,
            fills,
            index,
            center,
            center_spans,
            center_fills,
        });
        let key = self.base.key_for_render(options.highlight_key.as_ref(), KeyField::single("k"));
        let result = self.emit(key.as_ref())?;
        let emphasis_field = self.emphasis_field();
        self.extend_leaves(&emphasis_field);
        Ok(result)
    }

    // Resolve node fills and the two legends.
    fn colors(layout: &Layout, options: &RadialOptions) -> Result<(Vec<Rgba>, Vec<Legend>)> {
        let attr = |node: &LayoutNode, i: usize, field: &str| node.datum.require(field, i).cloned();
        let mut branches = Vec::new();
        let mut leaves = Vec::new();
        for (i, node) in layout.nodes.iter().enumerate() {
            if node.depth == 1 {
                branches.push(attr(node, i, &options.inner_color_attr)?);
            }
            if node.is_leaf && node.depth > 0 {
                leaves.push(attr(node, i, &options.leaf_color_attr)?);
            }
        }
        let branch_scale = OrdinalScale::new(branches, options.category_palette.clone());
        let leaf_scale = OrdinalScale::new(leaves, options.leaf_palette.clone());

        let fills = layout
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| -> Result<Rgba> {
                if node.depth == 0 {
                    return Ok(Rgba::TRANSPARENT);
                }
                if node.is_leaf {
                    let v = attr(node, i, &options.leaf_color_attr)?;
                    return Ok(leaf_scale.color(&v).unwrap_or(Rgba::TRANSPARENT));
                }
                let Some(b) = node.branch else {
                    return Ok(Rgba::TRANSPARENT);
                };
                let v = attr(&layout.nodes[b], b, &options.inner_color_attr)?;
                Ok(branch_scale.color(&v).unwrap_or(Rgba::TRANSPARENT))
            })
            .collect::<Result<Vec<_>>>()?;

        let legend = |title: &str, scale: &OrdinalScale| Legend {
            title: Some(title.to_string()),
            entries: scale.entries().into_iter().map(|(v, c)| (v.to_string(), c)).collect(),
        };
        Ok((
            fills,
            vec![
                legend(&options.inner_color_attr, &branch_scale),
                legend(&options.leaf_color_attr, &leaf_scale),
            ],
        ))
    }

    // Join both layers from the resolved geometry at the current stroke width.
    fn emit(&mut self, key_override: Option<&KeyField>) -> Result<RenderResult> {
        let Some(drawn) = self.drawn.as_ref() else {
            return Err(Error::config("render", "radial view has not been rendered"));
        };
        let stroke = self.zoom.stroke_width();
        let factor = self.current_extend_factor();
        let id_field = KeyField::single(NODE_ID);
        let (live, mut stats) = self.burst.join(
            &drawn.nodes,
            &id_field,
            |_, i| Ok(drawn.arc(i, stroke, 1.0)),
            self.base.surface_mut(),
        )?;
        let (_, center_stats) = self.center.join(
            &drawn.center,
            &KeyField::single("k"),
            |_, i| {
                Ok(Mark::new(
                    Shape::Arc {
                        center: Point::ORIGIN,
                        span: drawn.center_spans[i],
                    },
                    Style::fill(drawn.center_fills[i]).with_stroke(Rgba::WHITE, stroke),
                ))
            },
            self.base.surface_mut(),
        )?;
        stats += center_stats;

        for key in &self.extended {
            if let Some(&i) = drawn.index.get(key) {
                self.base.surface_mut().update(BURST, key, &drawn.arc(i, stroke, factor));
            }
        }
        self.base.finish("radial", live, stats, key_override)
    }

    fn current_extend_factor(&self) -> f32 {
        self.current.as_ref().map_or(RadialOptions::default().extend_factor, |c| c.options.extend_factor)
    }

    fn emphasis_field(&self) -> KeyField {
        self.emphasis_field
            .clone()
            .unwrap_or_else(|| self.base.broker().key_field().clone())
    }

    // Reset previous extensions, then extend leaves matching the emphasized
    // nodes, comparing values under `key_field`.
    fn extend_leaves(&mut self, key_field: &KeyField) {
        let Some(drawn) = self.drawn.as_ref() else {
            return;
        };
        let stroke = self.zoom.stroke_width();
        let factor = self.current_extend_factor();
        for key in self.extended.drain(..) {
            if let Some(&i) = drawn.index.get(&key) {
                self.base.surface_mut().animate(BURST, &key, &drawn.arc(i, stroke, 1.0), EXTEND_DURATION);
            }
        }

        let mut targets = IndexSet::new();
        for element in self.base.broker().emphasized() {
            let Some(&i) = drawn.index.get(element) else {
                continue;
            };
            let node = &drawn.layout.nodes[i];
            let Some(extend_attr) = node.extend_attr.as_deref() else {
                continue;
            };
            let Ok(value) = key_field.extract(&node.datum, i) else {
                continue;
            };
            let by_attr = KeyField::single(extend_attr);
            for (j, leaf) in drawn.layout.nodes.iter().enumerate().filter(|(_, n)| n.is_leaf) {
                let shares_attr = by_attr.extract(&leaf.datum, j).is_ok_and(|k| k == value);
                let same_key = node.is_leaf && key_field.extract(&leaf.datum, j).is_ok_and(|k| k == value);
                if shares_attr || same_key {
                    targets.insert(j);
                }
            }
        }

        for j in targets {
            let Some((key, _)) = drawn.index.get_index(j) else {
                continue;
            };
            self.base.surface_mut().animate(BURST, key, &drawn.arc(j, stroke, factor), EXTEND_DURATION);
            self.extended.insert(key.clone());
        }
    }
}

impl<B: Surface + TooltipHost> Interactive for RadialEngine<B> {
    fn register_handlers(&mut self, handlers: Handlers, key_field: Option<KeyField>) {
        self.base.register_handlers(handlers, key_field);
    }

    fn highlight(&mut self, values: &[Key]) -> usize {
        let n = self.base.highlight(values);
        self.emphasis_field = None;
        let key_field = self.emphasis_field();
        self.extend_leaves(&key_field);
        n
    }

    fn highlight_by(&mut self, values: &[Key], key_field: &KeyField) -> usize {
        let n = self.base.highlight_by(values, key_field);
        self.emphasis_field = Some(key_field.clone());
        self.extend_leaves(key_field);
        n
    }

    fn resolve(&self, event: PointerEvent, element: &Key) -> Result<Option<Triggered>> {
        self.base.resolve(event, element)
    }

    fn interaction_key(&self) -> KeyField {
        self.base.broker().key_field().clone()
    }
}

impl<B: Surface + TooltipHost> Tooltippable for RadialEngine<B> {
    fn set_tooltip(&mut self, accessor: Option<TooltipAccessor>) -> Result<()> {
        self.base.set_tooltip(accessor)
    }

    fn replace_tooltip(&mut self, accessor: Option<TooltipAccessor>) -> Option<TooltipAccessor> {
        self.base.replace_tooltip(accessor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{dispatch, Margin};
    use crate::data::DataPoint;
    use crate::radial::HierarchyNode;
    use crate::tooltip::accessor;
    use approx::assert_relative_eq;
    use std::cell::RefCell;

    fn canvas() -> Canvas {
        // 200 x 200 chart area, outer radius 95
        Canvas::new(210.0, 210.0).with_margin(Margin::new(5.0, 5.0, 5.0, 5.0))
    }

    fn month(key: &str, v: f32, year: &str) -> HierarchyNode {
        HierarchyNode::leaf(key, v).with_attr("year", year)
    }

    fn rainfall() -> Hierarchy {
        Hierarchy::new(HierarchyNode::internal(
            "rain",
            vec![
                HierarchyNode::internal("2019", vec![month("Jan", 3.0, "2019"), month("Feb", 1.0, "2019")])
                    .with_extend_attr("year"),
                HierarchyNode::internal("2020", vec![month("Jan", 2.0, "2020"), month("Feb", 2.0, "2020")]),
            ],
        ))
    }

    fn sunshine() -> Hierarchy {
        Hierarchy::new(HierarchyNode::internal(
            "sun",
            vec![HierarchyNode::leaf("north", 5.0), HierarchyNode::leaf("south", 7.0)],
        ))
    }

    fn rendered() -> RadialEngine {
        let mut engine = RadialEngine::new(canvas());
        engine.render(rainfall(), RadialOptions::default()).expect("operation should succeed");
        engine
    }

    fn key(path: &[&str]) -> Key {
        RadialEngine::<Scene>::element_key(path)
    }

    fn outer(engine: &RadialEngine, path: &[&str]) -> f32 {
        engine
            .surface()
            .element(BURST, &key(path))
            .and_then(|e| e.mark.arc())
            .map(|a| a.outer_radius)
            .expect("arc should exist")
    }

    #[test]
    fn test_every_node_drawn_root_hidden() {
        let engine = rendered();
        assert_eq!(engine.surface().keys(BURST).len(), 7);
        let root = engine.surface().element(BURST, &key(&["rain"])).expect("root should exist");
        assert!(!root.mark.style.visible);
        assert_relative_eq!(engine.radius(), 95.0);
        assert_relative_eq!(outer(&engine, &["rain", "2019", "Jan"]), 95.0, epsilon = 1e-4);
        let inner = engine
            .surface()
            .element(BURST, &key(&["rain", "2019"]))
            .and_then(|e| e.mark.arc())
            .map(|a| a.inner_radius)
            .expect("arc should exist");
        assert_relative_eq!(inner, 95.0 / 3.0 + 0.1, epsilon = 1e-4);
    }

    #[test]
    fn test_layers_centred_in_chart_area() {
        let engine = rendered();
        let t = engine.surface().transform(BURST);
        assert_eq!(t.translate, Point::new(105.0, 105.0));
        assert_eq!(engine.surface().transform(CENTER), t);
    }

    #[test]
    fn test_branch_and_leaf_colors() {
        let engine = rendered();
        let fill = |path: &[&str]| engine.surface().element(BURST, &key(path)).and_then(|e| e.mark.style.fill);
        assert_eq!(fill(&["rain", "2019"]), Some(Palette::CATEGORY10[0]));
        assert_eq!(fill(&["rain", "2020"]), Some(Palette::CATEGORY10[1]));
        assert_eq!(fill(&["rain", "2019", "Jan"]), Some(Palette::SET2[0]));
        assert_eq!(fill(&["rain", "2020", "Feb"]), Some(Palette::SET2[1]));

        let legends = engine.surface().legends();
        assert_eq!(legends.len(), 2);
        assert_eq!(legends[0].entries[1], ("2020".to_string(), Palette::CATEGORY10[1]));
        assert_eq!(legends[1].entries.len(), 2);
    }

    #[test]
    fn test_malformed_tree_draws_nothing() {
        let mut engine = RadialEngine::new(canvas());
        let mut hierarchy = rainfall();
        hierarchy.root.children[1].children.push(HierarchyNode {
            key: "Mar".into(),
            ..HierarchyNode::default()
        });
        let err = engine.render(hierarchy, RadialOptions::default()).expect_err("render should fail");
        assert!(matches!(err, Error::MalformedTree { ref key } if key == "Mar"));
        assert!(engine.surface().keys(BURST).is_empty());
        assert!(engine.current().is_none());
    }

    #[test]
    fn test_duplicate_siblings_rejected() {
        let mut engine = RadialEngine::new(canvas());
        let root = HierarchyNode::internal("r", vec![HierarchyNode::leaf("a", 1.0), HierarchyNode::leaf("a", 2.0)]);
        assert!(matches!(
            engine.render(Hierarchy::new(root), RadialOptions::default()),
            Err(Error::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_missing_color_attribute() {
        let mut engine = RadialEngine::new(canvas());
        let options = RadialOptions {
            inner_color_attr: "region".to_string(),
            ..RadialOptions::default()
        };
        let err = engine.render(rainfall(), options).expect_err("render should fail");
        assert!(matches!(err, Error::Schema { ref field, .. } if field == "region"));
    }

    #[test]
    fn test_center_pie() {
        let mut engine = RadialEngine::new(canvas());
        let center = vec![
            DataPoint::new().with("k", "wet").with("v", 1.0f32),
            DataPoint::new().with("k", "dry").with("v", 3.0f32),
        ];
        engine
            .render(rainfall().with_center(center), RadialOptions::default())
            .expect("operation should succeed");
        assert_eq!(engine.surface().keys(CENTER), vec![Key::single("wet"), Key::single("dry")]);
        let wet = engine.surface().element(CENTER, &Key::single("wet")).expect("slice should exist");
        let span = wet.mark.arc().expect("slice should be an arc");
        assert_relative_eq!(span.outer_radius, 95.0 / 3.05, epsilon = 1e-4);
        assert_relative_eq!(span.fraction(), 0.25, epsilon = 1e-5);
        assert_eq!(wet.mark.style.fill, Some(Palette::PAIRED[0]));
    }

    #[test]
    fn test_highlight_extends_leaves_sharing_attribute() {
        let mut engine = rendered();
        let n = engine.highlight(&[Key::single("2019")]);
        assert_eq!(n, 1);
        assert_eq!(engine.extended().count(), 2);
        assert_relative_eq!(outer(&engine, &["rain", "2019", "Jan"]), 95.0 * 1.05, epsilon = 1e-3);
        assert_relative_eq!(outer(&engine, &["rain", "2020", "Jan"]), 95.0, epsilon = 1e-3);
        let jan = engine
            .surface()
            .element(BURST, &key(&["rain", "2019", "Jan"]))
            .expect("leaf should exist");
        assert_eq!(jan.last_animation, Some(EXTEND_DURATION));

        engine.clear_highlight();
        assert_eq!(engine.extended().count(), 0);
        assert_relative_eq!(outer(&engine, &["rain", "2019", "Jan"]), 95.0, epsilon = 1e-3);
    }

    #[test]
    fn test_highlight_by_field_extends_by_that_field() {
        // the wet-season node carries the year it belongs to
        let season = |year: &str, months: [&str; 2]| {
            HierarchyNode::internal(
                format!("wet {year}"),
                months.iter().map(|m| month(m, 1.0, year)).collect(),
            )
            .with_attr("year", year)
            .with_extend_attr("year")
        };
        let tree = Hierarchy::new(HierarchyNode::internal(
            "rain",
            vec![season("2019", ["Jan", "Feb"]), season("2020", ["Jan", "Feb"])],
        ));
        let mut engine = RadialEngine::new(canvas());
        engine.render(tree, RadialOptions::default()).expect("operation should succeed");

        let n = engine.highlight_by(&[Key::single("2019")], &KeyField::single("year"));
        assert_eq!(n, 3);
        assert_eq!(engine.extended().count(), 2);
        assert_relative_eq!(outer(&engine, &["rain", "wet 2019", "Jan"]), 95.0 * 1.05, epsilon = 1e-3);
        assert_relative_eq!(outer(&engine, &["rain", "wet 2020", "Jan"]), 95.0, epsilon = 1e-3);

        // a relayout keeps the extension under the same field
        engine.on_zoom(ZoomTransform::new(0.0, 0.0, 2.0)).expect("operation should succeed");
        assert_eq!(engine.extended().count(), 2);

        // the interaction key is "k", under which "2019" names no season
        engine.highlight(&[Key::single("2019")]);
        assert_eq!(engine.extended().count(), 0);
    }

    #[test]
    fn test_highlight_without_extend_attribute() {
        let mut engine = rendered();
        assert_eq!(engine.highlight(&[Key::single("Jan")]), 2);
        assert_eq!(engine.extended().count(), 0);
        assert_eq!(engine.highlight(&[Key::single("2020")]), 1);
        assert_eq!(engine.extended().count(), 0);
    }

    #[test]
    fn test_pan_only_moves_viewport() {
        let mut engine = rendered();
        let outcome = engine.on_zoom(ZoomTransform::new(-50.0, -50.0, 2.0)).expect("operation should succeed");
        assert!(outcome.is_relayout());
        assert_eq!(outcome.transform().translate, Point::new(160.0, 160.0));
        let stroke = engine
            .surface()
            .element(BURST, &key(&["rain", "2019"]))
            .map(|e| e.mark.style.stroke_width)
            .expect("arc should exist");
        assert_relative_eq!(stroke, 0.5);

        let before = engine.surface().stats();
        let outcome = engine.on_zoom(ZoomTransform::new(-60.0, -40.0, 2.0)).expect("operation should succeed");
        assert!(!outcome.is_relayout());
        assert_eq!(outcome.transform().translate, Point::new(150.0, 170.0));
        let after = engine.surface().stats();
        assert_eq!(after.updated, before.updated);
        assert_eq!(after.transforms, before.transforms + 2);
        assert_eq!(engine.zoom().relayouts(), 1);
        assert_eq!(engine.validations(), 1);
    }

    #[test]
    fn test_spin_rotates_viewport() {
        let mut engine = RadialEngine::new(canvas());
        let options = RadialOptions {
            spin: 45.0,
            ..RadialOptions::default()
        };
        engine.render(rainfall(), options).expect("operation should succeed");
        assert_relative_eq!(engine.surface().transform(BURST).rotation, 45.0);
        let outcome = engine.on_zoom(ZoomTransform::new(0.0, 0.0, 3.0)).expect("operation should succeed");
        assert_relative_eq!(outcome.transform().rotation, 45.0);
    }

    #[test]
    fn test_zoom_before_render_fails() {
        let mut engine = RadialEngine::new(canvas());
        assert!(matches!(engine.on_zoom(ZoomTransform::IDENTITY), Err(Error::Config { .. })));
    }

    #[test]
    fn test_swap_on_trigger() {
        let mut engine = rendered();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.set_swap_listener(Some(Rc::new(move |config: &RadialConfig| {
            sink.borrow_mut().push(config.hierarchy.root.key.clone());
        })));
        engine.set_alternate(Some(RadialConfig::new(sunshine(), RadialOptions::default())));
        engine.on_zoom(ZoomTransform::new(0.0, 0.0, 4.0)).expect("operation should succeed");

        assert!(!engine.swap_on(&[Key::single("Leith")], &[Key::single("Perth")]).expect("operation should succeed"));
        assert!(engine.swap_on(&[Key::single("Perth")], &[Key::single("Perth")]).expect("operation should succeed"));
        assert_eq!(engine.current().map(|c| c.hierarchy.root.key.as_str()), Some("sun"));
        assert_eq!(engine.alternate().map(|c| c.hierarchy.root.key.as_str()), Some("rain"));
        assert_eq!(engine.zoom().current(), ZoomTransform::IDENTITY);
        assert_eq!(engine.surface().keys(BURST).len(), 3);
        assert_eq!(*seen.borrow(), vec!["sun".to_string()]);
    }

    #[test]
    fn test_swap_without_alternate() {
        let mut engine = rendered();
        assert!(!engine.swap_on(&[Key::single("x")], &[Key::single("x")]).expect("operation should succeed"));
        assert_eq!(engine.current().map(|c| c.hierarchy.root.key.as_str()), Some("rain"));
    }

    #[test]
    fn test_failed_swap_keeps_state() {
        let mut engine = rendered();
        let broken = Hierarchy::new(HierarchyNode::internal("bad", Vec::new()));
        engine.set_alternate(Some(RadialConfig::new(broken, RadialOptions::default())));
        assert!(engine.swap_on(&[Key::single("x")], &[Key::single("x")]).is_err());
        assert_eq!(engine.current().map(|c| c.hierarchy.root.key.as_str()), Some("rain"));
        assert_eq!(engine.surface().keys(BURST).len(), 7);
    }

    #[test]
    fn test_swap_with_failing_tooltip_keeps_tree() {
        let mut engine = rendered();
        engine
            .set_tooltip(Some(accessor(|d| match d.text("k") {
                Some("sun") => Err(Error::Accessor("no label for sun".to_string())),
                k => Ok(k.unwrap_or("?").to_string()),
            })))
            .expect("operation should succeed");
        engine.highlight(&[Key::single("2019")]);
        let before = engine.surface().keys(BURST);
        engine.set_alternate(Some(RadialConfig::new(sunshine(), RadialOptions::default())));

        let err = engine.swap_on(&[Key::single("x")], &[Key::single("x")]).unwrap_err();
        assert!(matches!(err, Error::Accessor(_)));
        assert_eq!(engine.current().map(|c| c.hierarchy.root.key.as_str()), Some("rain"));
        assert_eq!(engine.alternate().map(|c| c.hierarchy.root.key.as_str()), Some("sun"));
        assert_eq!(engine.surface().keys(BURST), before);
        assert_eq!(engine.surface().tooltip_text(BURST, &key(&["rain", "2019"])), Some("2019"));
        assert_eq!(engine.extended().count(), 2);
        assert_eq!(engine.layout().map(|l| l.nodes.len()), Some(7));

        // the kept layout still drives relayouts
        let outcome = engine.on_zoom(ZoomTransform::new(0.0, 0.0, 2.0)).expect("operation should succeed");
        assert!(outcome.is_relayout());
        assert_eq!(engine.surface().keys(BURST), before);
    }

    #[test]
    fn test_initialize_notifies_listener() {
        let mut engine = RadialEngine::new(canvas());
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        engine.set_swap_listener(Some(Rc::new(move |_: &RadialConfig| *sink.borrow_mut() += 1)));
        engine
            .initialize(
                RadialConfig::new(rainfall(), RadialOptions::default()),
                Some(RadialConfig::new(sunshine(), RadialOptions::default())),
            )
            .expect("operation should succeed");
        assert_eq!(*seen.borrow(), 1);
        assert!(engine.alternate().is_some());
    }

    #[test]
    fn test_click_reports_node_key() {
        let engine = Rc::new(RefCell::new(rendered()));
        let clicked = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&clicked);
        engine
            .borrow_mut()
            .register_handlers(Handlers::new().on_click(move |k| *sink.borrow_mut() = Some(k.clone())), None);
        let fired = dispatch(&*engine, PointerEvent::Click, &key(&["rain", "2020"])).expect("operation should succeed");
        assert!(fired);
        assert_eq!(*clicked.borrow(), Some(Key::single("2020")));
    }

    #[test]
    fn test_tooltips_follow_nodes() {
        let mut engine = rendered();
        engine
            .set_tooltip(Some(accessor(|d| Ok(format!("{}: {}", d.text("k").unwrap_or("?"), d.get("v").map(ToString::to_string).unwrap_or_default())))))
            .expect("operation should succeed");
        assert_eq!(engine.surface().tooltips().count(), 7);
        assert_eq!(engine.surface().tooltip_text(BURST, &key(&["rain", "2019"])), Some("2019: 4"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::radial::HierarchyNode;
    use proptest::prelude::*;

    fn burst_marks(engine: &RadialEngine) -> Vec<(Key, Mark)> {
        engine
            .surface()
            .layer(BURST)
            .map(|l| l.iter().map(|(k, e)| (k.clone(), e.mark.clone())).collect())
            .unwrap_or_default()
    }

    fn tree(name: &str, values: &[f32]) -> Hierarchy {
        let leaves = values
            .iter()
            .enumerate()
            .map(|(i, v)| HierarchyNode::leaf(format!("{name}{i}"), *v))
            .collect();
        Hierarchy::new(HierarchyNode::internal(name, leaves))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_double_swap_restores_view(
            a in prop::collection::vec(0.5f32..50.0, 1..8),
            b in prop::collection::vec(0.5f32..50.0, 1..8),
            spin_a in -180.0f32..180.0,
            spin_b in -180.0f32..180.0,
            k in 1.0f32..8.0,
        ) {
            let primary = RadialConfig::new(tree("a", &a), RadialOptions { spin: spin_a, ..RadialOptions::default() });
            let secondary = RadialConfig::new(
                tree("b", &b),
                RadialOptions { spin: spin_b, leaf_palette: Palette::paired(), ..RadialOptions::default() },
            );
            let mut engine = RadialEngine::new(Canvas::new(300.0, 300.0));
            engine.initialize(primary.clone(), Some(secondary.clone())).expect("operation should succeed");
            let marks = burst_marks(&engine);
            let transform = engine.surface().transform(BURST);

            engine.on_zoom(ZoomTransform::new(0.0, 0.0, k)).expect("operation should succeed");
            let trigger = [Key::single("go")];
            prop_assert!(engine.swap_on(&trigger, &trigger).expect("operation should succeed"));
            prop_assert!(engine.swap_on(&trigger, &trigger).expect("operation should succeed"));

            prop_assert_eq!(engine.current(), Some(&primary));
            prop_assert_eq!(engine.alternate(), Some(&secondary));
            prop_assert_eq!(burst_marks(&engine), marks);
            prop_assert_eq!(engine.surface().transform(BURST), transform);
        }
    }
}
