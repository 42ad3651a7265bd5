//! Chart base and capability traits.
//!
//! Every chart variant composes a [`ChartBase`] (canvas geometry, axes, the
//! primary [`InteractionBroker`] and [`TooltipManager`]) with one
//! [`ElementBinder`](crate::binder::ElementBinder) per drawn layer. The render
//! pipeline is the same for all variants: validate, compute scales, draw axes,
//! join elements, then hand the live elements to the broker and tooltips.

mod bar;
mod bubble;
mod line;
mod map;
mod pie;
mod scatter;

pub use bar::{BarChart, BarOptions};
pub use bubble::{BubbleChart, BubbleOptions};
pub use line::{LineChart, LineOptions};
pub use map::{BasePath, EquirectangularProjection, FillRule, MapChart, MapOptions, Projection};
pub use pie::{pie_angles, PieChart, PieOptions};
pub use scatter::{ScatterChart, ScatterOptions};

use crate::binder::{ElementBinder, JoinStats, LiveElements};
use crate::data::{DataPoint, Key, KeyField, Value};
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect, ViewTransform};
use crate::interaction::{Handlers, InteractionBroker, PointerEvent, Triggered};
use crate::scale::{widen_degenerate, AxisOptions, BandScale, LinearScale, Scale, ScaleSpec};
use crate::surface::{AxisSide, AxisSpec, Mark, Scene, Surface, Tick, Title, TooltipHost};
use crate::tooltip::{TooltipAccessor, TooltipManager};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Duration of axis-change and drill transitions.
pub const TRANSITION: Duration = Duration::from_millis(500);

/// Formats tick values.
pub type TickFormat = Rc<dyn Fn(f32) -> String>;

// ============================================================================
// Canvas
// ============================================================================

/// Space around the chart area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margin {
    /// Top margin.
    pub top: f32,
    /// Bottom margin.
    pub bottom: f32,
    /// Left margin.
    pub left: f32,
    /// Right margin.
    pub right: f32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 50.0,
            bottom: 50.0,
            left: 60.0,
            right: 30.0,
        }
    }
}

impl Margin {
    /// Create margins.
    #[must_use]
    pub const fn new(top: f32, bottom: f32, left: f32, right: f32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

/// Drawing area of one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    /// Total width.
    pub width: f32,
    /// Total height.
    pub height: f32,
    /// Margins around the chart area.
    pub margin: Margin,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            margin: Margin::default(),
        }
    }
}

impl Canvas {
    /// Canvas with default margins.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            margin: Margin::default(),
        }
    }

    /// Set the margins.
    #[must_use]
    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    /// Width of the chart area.
    #[must_use]
    pub fn chart_width(&self) -> f32 {
        self.width - self.margin.left - self.margin.right
    }

    /// Height of the chart area.
    #[must_use]
    pub fn chart_height(&self) -> f32 {
        self.height - self.margin.top - self.margin.bottom
    }

    /// The chart area in canvas coordinates.
    #[must_use]
    pub fn chart_area(&self) -> Rect {
        Rect::new(self.margin.left, self.margin.top, self.chart_width(), self.chart_height())
    }

    /// Reject canvases whose chart area has no room.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the chart area is empty.
    pub fn validate(&self) -> Result<()> {
        if !(self.chart_width() > 0.0) || !(self.chart_height() > 0.0) {
            return Err(Error::config(
                "canvas",
                format!(
                    "margins leave no chart area in {}x{}",
                    self.width, self.height
                ),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// What a render step hands to the rest of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    /// The interactive elements after this render.
    pub live: LiveElements,
    /// Field(s) passed to callbacks and matched by highlight.
    pub interaction_key: KeyField,
    /// Join counts summed over all layers.
    pub stats: JoinStats,
}

/// A view that can render data.
pub trait Renderable {
    /// Variant-specific options.
    type Options;

    /// Render (or re-render) `data`.
    ///
    /// # Errors
    ///
    /// Returns configuration, schema and duplicate-key errors before anything is drawn.
    fn render(&mut self, data: &crate::data::ChartData, options: &Self::Options) -> Result<RenderResult>;
}

/// A view that reacts to pointer events and can be highlighted.
pub trait Interactive {
    /// Replace all handlers. `key_field` overrides the field(s) passed to callbacks.
    fn register_handlers(&mut self, handlers: Handlers, key_field: Option<KeyField>);

    /// Emphasize elements whose interaction key is in `values`; `&[]` clears.
    fn highlight(&mut self, values: &[Key]) -> usize;

    /// Emphasize elements whose key under `key_field` is in `values`.
    fn highlight_by(&mut self, values: &[Key], key_field: &KeyField) -> usize;

    /// Resolve a pointer event on an element to its callback.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the element lacks the interaction key.
    fn resolve(&self, event: PointerEvent, element: &Key) -> Result<Option<Triggered>>;

    /// Current interaction key field.
    fn interaction_key(&self) -> KeyField;

    /// Clear all emphasis.
    fn clear_highlight(&mut self) {
        self.highlight(&[]);
    }
}

/// A view with per-element tooltips.
pub trait Tooltippable {
    /// Set or clear the tooltip accessor and refresh tooltips immediately.
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    fn set_tooltip(&mut self, accessor: Option<TooltipAccessor>) -> Result<()>;

    /// Swap in `accessor` for the next render without refreshing; returns
    /// the previous accessor.
    fn replace_tooltip(&mut self, accessor: Option<TooltipAccessor>) -> Option<TooltipAccessor>;
}

/// Deliver a pointer event to a shared view.
///
/// The view is only borrowed while the callback is resolved, so the callback
/// may borrow it again. Returns whether a callback ran.
///
/// # Errors
///
/// Propagates errors from [`Interactive::resolve`].
pub fn dispatch<V: Interactive + ?Sized>(view: &RefCell<V>, event: PointerEvent, element: &Key) -> Result<bool> {
    let triggered = view.borrow().resolve(event, element)?;
    match triggered {
        Some(t) => {
            t.fire();
            Ok(true)
        }
        None => Ok(false),
    }
}

// ============================================================================
// ChartBase
// ============================================================================

/// State shared by all chart variants.
pub struct ChartBase<B = Scene> {
    canvas: Canvas,
    backend: B,
    broker: InteractionBroker,
    tooltips: TooltipManager,
    renders: usize,
}

impl<B: std::fmt::Debug> std::fmt::Debug for ChartBase<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartBase")
            .field("canvas", &self.canvas)
            .field("backend", &self.backend)
            .field("broker", &self.broker)
            .field("tooltips", &self.tooltips)
            .field("renders", &self.renders)
            .finish()
    }
}

impl<B: Surface + TooltipHost> ChartBase<B> {
    /// Create a base whose interactive layer is `layer`, keyed by `key_field`.
    pub fn new(canvas: Canvas, backend: B, layer: &str, key_field: KeyField) -> Self {
        Self {
            canvas,
            backend,
            broker: InteractionBroker::new(layer, key_field),
            tooltips: TooltipManager::new(),
            renders: 0,
        }
    }

    /// Canvas geometry.
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Drawing collaborator.
    #[must_use]
    pub fn surface(&self) -> &B {
        &self.backend
    }

    /// Mutable drawing collaborator.
    pub fn surface_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Interaction state.
    #[must_use]
    pub fn broker(&self) -> &InteractionBroker {
        &self.broker
    }

    /// Number of completed renders.
    #[must_use]
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// True once the first render has completed.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.renders > 0
    }

    /// Translate layers so their origin is the top-left of the chart area.
    pub fn place_layers(&mut self, layers: &[&str]) {
        let origin = Point::new(self.canvas.margin.left, self.canvas.margin.top);
        for layer in layers {
            self.backend
                .set_transform(layer, ViewTransform::new(origin, 0.0, 1.0));
        }
    }

    /// Linear scale for `values` onto `range`, widening a zero-width domain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid axis options.
    pub fn linear_scale(&self, axis: &str, values: &[f32], range: (f32, f32), options: &AxisOptions) -> Result<LinearScale> {
        options.validate()?;
        let spec = ScaleSpec::from_values(values, range, options);
        if spec.domain_min > spec.domain_max {
            return Err(Error::config(
                axis,
                format!("domain [{}, {}] is inverted", spec.domain_min, spec.domain_max),
            ));
        }
        let spec = if spec.is_degenerate() {
            let (lo, hi) = widen_degenerate((spec.domain_min, spec.domain_max));
            log::warn!(
                "{axis} domain [{}, {}] has no width, widened to [{lo}, {hi}]",
                spec.domain_min,
                spec.domain_max
            );
            ScaleSpec {
                domain_min: lo,
                domain_max: hi,
                ..spec
            }
        } else {
            spec
        };
        spec.linear()
    }

    /// Bottom axis for a linear scale.
    #[must_use]
    pub fn bottom_axis(&self, scale: &LinearScale, options: &AxisOptions, title: Option<String>, format: Option<&TickFormat>) -> AxisSpec {
        let ticks = linear_ticks(scale, options.tick_count, format);
        AxisSpec {
            side: AxisSide::Bottom,
            origin: Point::new(self.canvas.margin.left, self.canvas.height - self.canvas.margin.bottom),
            ticks,
            tick_size: options.tick_size,
            title: title.map(|t| self.x_title(t)),
        }
    }

    /// Bottom axis for a band scale, one tick per band centre.
    #[must_use]
    pub fn band_axis(&self, scale: &BandScale, tick_size: f32, title: Option<String>) -> AxisSpec {
        let ticks = scale
            .domain()
            .filter_map(|v| {
                scale.center(v).map(|offset| Tick {
                    offset,
                    label: v.to_string(),
                })
            })
            .collect();
        AxisSpec {
            side: AxisSide::Bottom,
            origin: Point::new(self.canvas.margin.left, self.canvas.height - self.canvas.margin.bottom),
            ticks,
            tick_size,
            title: title.map(|t| self.x_title(t)),
        }
    }

    /// Left axis for a linear scale.
    #[must_use]
    pub fn left_axis(&self, scale: &LinearScale, options: &AxisOptions, title: Option<String>) -> AxisSpec {
        AxisSpec {
            side: AxisSide::Left,
            origin: Point::new(self.canvas.margin.left, self.canvas.margin.top),
            ticks: linear_ticks(scale, options.tick_count, None),
            tick_size: options.tick_size,
            title: title.map(|t| self.y_title(t)),
        }
    }

    // Centred under the chart area, a quarter of the bottom margin up from the bottom edge.
    fn x_title(&self, text: String) -> Title {
        let c = &self.canvas;
        Title {
            text,
            position: Point::new(c.chart_width() / 2.0 + c.margin.left, c.height - c.margin.bottom / 4.0),
            rotation: 0.0,
        }
    }

    // Rotated -90 degrees, so x runs down the chart and y runs in from the left edge.
    fn y_title(&self, text: String) -> Title {
        let c = &self.canvas;
        Title {
            text,
            position: Point::new(-(c.chart_height() / 2.0) - c.margin.top, 3.0 * (c.margin.right / 4.0)),
            rotation: -90.0,
        }
    }

    /// Replace the axes.
    pub fn draw_axes(&mut self, axes: &[AxisSpec]) {
        self.backend.set_axes(axes);
    }

    /// Interaction key to apply on this render: an explicit override, or the
    /// variant's default on the first render only, so keys chosen through
    /// [`register_handlers`](Self::register_handlers) survive re-renders.
    #[must_use]
    pub fn key_for_render(&self, explicit: Option<&KeyField>, default: KeyField) -> Option<KeyField> {
        match explicit {
            Some(k) => Some(k.clone()),
            None if !self.is_rendered() => Some(default),
            None => None,
        }
    }

    /// Hand a fresh render's live elements to the broker and tooltips.
    ///
    /// `key_override` replaces the interaction key field when set.
    ///
    /// # Errors
    ///
    /// Propagates tooltip accessor errors.
    pub fn finish(&mut self, variant: &str, live: LiveElements, stats: JoinStats, key_override: Option<&KeyField>) -> Result<RenderResult> {
        if let Some(key_field) = key_override {
            self.broker.set_key_field(key_field.clone());
        }
        self.broker.bind(live.clone(), &mut self.backend);
        self.tooltips.refresh(self.broker.live(), &mut self.backend)?;
        self.renders += 1;
        log::debug!(
            "{variant} render #{}: {} entered, {} updated, {} exited",
            self.renders,
            stats.entered,
            stats.updated,
            stats.exited
        );
        Ok(RenderResult {
            live,
            interaction_key: self.broker.key_field().clone(),
            stats,
        })
    }

    /// Replace handlers; `key_field` overrides the interaction key when set.
    pub fn register_handlers(&mut self, handlers: Handlers, key_field: Option<KeyField>) {
        let key_field = key_field.unwrap_or_else(|| self.broker.key_field().clone());
        self.broker.register_handlers(handlers, key_field);
    }

    /// See [`Interactive::highlight`].
    pub fn highlight(&mut self, values: &[Key]) -> usize {
        self.broker.highlight(values, &mut self.backend)
    }

    /// See [`Interactive::highlight_by`].
    pub fn highlight_by(&mut self, values: &[Key], key_field: &KeyField) -> usize {
        self.broker.highlight_by(values, key_field, &mut self.backend)
    }

    /// See [`Interactive::resolve`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if the element lacks the interaction key.
    pub fn resolve(&self, event: PointerEvent, element: &Key) -> Result<Option<Triggered>> {
        self.broker.resolve(event, element)
    }

    /// See [`Tooltippable::set_tooltip`].
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn set_tooltip(&mut self, accessor: Option<TooltipAccessor>) -> Result<()> {
        self.tooltips.set_content_accessor(accessor);
        self.tooltips.refresh(self.broker.live(), &mut self.backend)?;
        Ok(())
    }

    /// See [`Tooltippable::replace_tooltip`].
    pub fn replace_tooltip(&mut self, accessor: Option<TooltipAccessor>) -> Option<TooltipAccessor> {
        self.tooltips.replace_content_accessor(accessor)
    }

    /// Run the tooltip accessor over the data a render is about to join.
    ///
    /// Called before the first surface change so an accessor error leaves
    /// the previous render on screen.
    ///
    /// # Errors
    ///
    /// Returns the first accessor error.
    pub fn check_tooltips(&self, data: &[DataPoint]) -> Result<()> {
        self.tooltips.check(data)
    }
}

fn linear_ticks(scale: &LinearScale, count: usize, format: Option<&TickFormat>) -> Vec<Tick> {
    scale
        .ticks(count)
        .into_iter()
        .map(|t| Tick {
            offset: scale.scale(t),
            label: match format {
                Some(f) => f(t),
                None => Value::Number(t).to_string(),
            },
        })
        .collect()
}

/// Join `data` into `binder`'s layer, animating survivors when `transition` is set.
pub(crate) fn join_layer<S, M>(
    binder: &mut ElementBinder,
    data: &[DataPoint],
    key_field: &KeyField,
    mark: M,
    surface: &mut S,
    transition: Option<Duration>,
) -> Result<(LiveElements, JoinStats)>
where
    S: Surface + ?Sized,
    M: FnMut(&DataPoint, usize) -> Result<Mark>,
{
    match transition {
        Some(duration) => binder.join_animated(data, key_field, mark, surface, duration),
        None => binder.join(data, key_field, mark, surface),
    }
}

/// Axis titles: explicit options win, otherwise the `x_title`/`y_title` fields of the first point.
#[must_use]
pub fn axis_titles(first: Option<&DataPoint>, x: &AxisOptions, y: &AxisOptions) -> (Option<String>, Option<String>) {
    let from_data = |field: &str| first.and_then(|d| d.text(field)).map(str::to_string);
    (
        x.title.clone().or_else(|| from_data("x_title")),
        y.title.clone().or_else(|| from_data("y_title")),
    )
}

/// Implements [`Interactive`] and [`Tooltippable`] for a chart with a `base: ChartBase<B>` field.
macro_rules! delegate_interactive {
    ($chart:ident) => {
        impl<B: $crate::surface::Surface + $crate::surface::TooltipHost> $crate::chart::Interactive for $chart<B> {
            fn register_handlers(
                &mut self,
                handlers: $crate::interaction::Handlers,
                key_field: Option<$crate::data::KeyField>,
            ) {
                self.base.register_handlers(handlers, key_field);
            }

            fn highlight(&mut self, values: &[$crate::data::Key]) -> usize {
                self.base.highlight(values)
            }

            fn highlight_by(&mut self, values: &[$crate::data::Key], key_field: &$crate::data::KeyField) -> usize {
                self.base.highlight_by(values, key_field)
            }

            fn resolve(
                &self,
                event: $crate::interaction::PointerEvent,
                element: &$crate::data::Key,
            ) -> $crate::error::Result<Option<$crate::interaction::Triggered>> {
                self.base.resolve(event, element)
            }

            fn interaction_key(&self) -> $crate::data::KeyField {
                self.base.broker().key_field().clone()
            }
        }

        impl<B: $crate::surface::Surface + $crate::surface::TooltipHost> $crate::chart::Tooltippable for $chart<B> {
            fn set_tooltip(&mut self, accessor: Option<$crate::tooltip::TooltipAccessor>) -> $crate::error::Result<()> {
                self.base.set_tooltip(accessor)
            }

            fn replace_tooltip(
                &mut self,
                accessor: Option<$crate::tooltip::TooltipAccessor>,
            ) -> Option<$crate::tooltip::TooltipAccessor> {
                self.base.replace_tooltip(accessor)
            }
        }
    };
}

pub(crate) use delegate_interactive;
