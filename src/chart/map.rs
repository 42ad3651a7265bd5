//! Geographic bubble map.
//!
//! Projection and base-layer paths come from outside; the map positions one
//! bubble per data point and follows the same zoom contract as the radial
//! engine: pans only move the viewport, scale changes relayout so that
//! strokes and bubbles keep their on-screen size.

use super::{delegate_interactive, join_layer, Canvas, ChartBase, RenderResult, Renderable};
use crate::binder::{check_keys, ElementBinder};
use crate::color::Rgba;
use crate::data::{column, ChartData, DataPoint, Dataset, Key, KeyField};
use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::radial::{ZoomExtent, ZoomOutcome, ZoomState, ZoomTransform};
use crate::scale::{AxisOptions, Scale};
use crate::surface::{Mark, Scene, Shape, Style, Surface, TooltipHost};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

const BASE: &str = "base";
const BUBBLES: &str = "bubbles";

/// Maps geographic coordinates to chart-area pixels.
pub trait Projection {
    /// Project `(lon, lat)` in degrees.
    fn project(&self, lon: f32, lat: f32) -> Point;
}

impl<F: Fn(f32, f32) -> Point> Projection for F {
    fn project(&self, lon: f32, lat: f32) -> Point {
        self(lon, lat)
    }
}

/// Plate carrée projection fitted to a bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquirectangularProjection {
    lon_min: f32,
    lat_max: f32,
    scale: f32,
    offset: Point,
}

impl EquirectangularProjection {
    /// Fit `lon` x `lat` (min, max) into `width` x `height`, keeping the aspect ratio and centring.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either span is empty or the target has no area.
    pub fn fit(lon: (f32, f32), lat: (f32, f32), width: f32, height: f32) -> Result<Self> {
        let (lon_span, lat_span) = (lon.1 - lon.0, lat.1 - lat.0);
        if !(lon_span > 0.0) || !(lat_span > 0.0) {
            return Err(Error::config("projection", "bounding box has no extent"));
        }
        if !(width > 0.0) || !(height > 0.0) {
            return Err(Error::config("projection", "target area is empty"));
        }
        let scale = (width / lon_span).min(height / lat_span);
        Ok(Self {
            lon_min: lon.0,
            lat_max: lat.1,
            scale,
            offset: Point::new((width - lon_span * scale) / 2.0, (height - lat_span * scale) / 2.0),
        })
    }
}

impl Projection for EquirectangularProjection {
    fn project(&self, lon: f32, lat: f32) -> Point {
        Point::new(
            (lon - self.lon_min) * self.scale + self.offset.x,
            (self.lat_max - lat) * self.scale + self.offset.y,
        )
    }
}

/// A pre-built base-layer path (land, border, coastline).
#[derive(Debug, Clone, PartialEq)]
pub struct BasePath {
    /// Identity of the path.
    pub id: String,
    /// Path data in chart-area coordinates.
    pub data: String,
    /// Fill.
    pub fill: Option<Rgba>,
    /// Stroke.
    pub stroke: Option<Rgba>,
}

/// Computes a bubble's fill from its datum.
pub type FillRule = Rc<dyn Fn(&DataPoint) -> Rgba>;

/// Map options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Lifecycle key field.
    pub key_field: String,
    /// Longitude field.
    pub lon_field: String,
    /// Latitude field.
    pub lat_field: String,
    /// Bubble size field.
    pub radius_field: String,
    /// Radius of the smallest bubble at zoom 1.
    pub min_radius: f32,
    /// Radius of the largest bubble at zoom 1.
    pub max_radius: f32,
    /// Default bubble fill.
    pub fill: Rgba,
    /// Stroke of selected bubbles.
    pub select_stroke: Rgba,
    /// Interaction key override.
    pub highlight_key: Option<KeyField>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            key_field: "k".to_string(),
            lon_field: "lon".to_string(),
            lat_field: "lat".to_string(),
            radius_field: "r".to_string(),
            min_radius: 3.0,
            max_radius: 10.0,
            fill: Rgba::rgb(70, 130, 180).with_alpha(200),
            select_stroke: Rgba::BLACK,
            highlight_key: None,
        }
    }
}

// Bubbles shrink to a quarter of their size across the zoom extent.
fn zoom_radius_factor(k: f32, extent: ZoomExtent) -> f32 {
    let span = extent.max - extent.min;
    if span <= 0.0 {
        return 1.0;
    }
    1.0 - 0.75 * (k - extent.min) / span
}

/// Geographic bubble map view.
pub struct MapChart<B = Scene> {
    base: ChartBase<B>,
    projection: Box<dyn Projection>,
    paths: Vec<BasePath>,
    base_layer: ElementBinder,
    bubbles: ElementBinder,
    zoom: ZoomState,
    selected: Vec<Key>,
    select_field: KeyField,
    fill_rule: Option<FillRule>,
    last: Option<(Dataset, MapOptions)>,
}

impl<B: std::fmt::Debug> std::fmt::Debug for MapChart<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapChart")
            .field("base", &self.base)
            .field("paths", &self.paths.len())
            .field("zoom", &self.zoom)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl MapChart<Scene> {
    /// Map drawing into an in-memory scene.
    #[must_use]
    pub fn new(canvas: Canvas, projection: impl Projection + 'static) -> Self {
        Self::with_backend(canvas, Scene::new(), projection)
    }
}

impl<B: Surface + TooltipHost> MapChart<B> {
    /// Map drawing into `backend`.
    pub fn with_backend(canvas: Canvas, backend: B, projection: impl Projection + 'static) -> Self {
        let zoom = ZoomState::new(canvas.width, canvas.height);
        Self {
            base: ChartBase::new(canvas, backend, BUBBLES, KeyField::single("k")),
            projection: Box::new(projection),
            paths: Vec::new(),
            base_layer: ElementBinder::new(BASE),
            bubbles: ElementBinder::new(BUBBLES),
            zoom,
            selected: Vec::new(),
            select_field: KeyField::single("k"),
            fill_rule: None,
            last: None,
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

    /// Current zoom state.
    #[must_use]
    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    /// Replace the zoom extent, resetting pan and zoom.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid extent.
    pub fn set_zoom_extent(&mut self, extent: ZoomExtent) -> Result<()> {
        let canvas = self.base.canvas();
        self.zoom = ZoomState::with_extent(extent, canvas.width, canvas.height)?;
        Ok(())
    }

    /// Replace the base-layer paths. Drawn on the next render.
    pub fn set_base_paths(&mut self, paths: Vec<BasePath>) {
        self.paths = paths;
    }

    /// Set or clear the rule that colours bubbles, redrawing if rendered.
    ///
    /// # Errors
    ///
    /// Propagates render errors.
    pub fn set_fill_rule(&mut self, rule: Option<FillRule>) -> Result<()> {
        self.fill_rule = rule;
        self.redraw().map(|_| ())
    }

    /// Outline the bubbles whose key under `key_field` (default `k`) is in
    /// `values`. The selection persists across renders until replaced;
    /// `&[]` clears it. Returns how many live bubbles are selected.
    ///
    /// # Errors
    ///
    /// Propagates render errors.
    pub fn select(&mut self, values: &[Key], key_field: Option<KeyField>) -> Result<usize> {
        self.selected = values.to_vec();
        if let Some(k) = key_field {
            self.select_field = k;
        }
        self.redraw()?;
        Ok(self.selected_count())
    }

    fn selected_count(&self) -> usize {
        self.base
            .broker()
            .live()
            .iter()
            .enumerate()
            .filter(|(i, (_, d))| self.is_selected(d, *i))
            .count()
    }

    fn is_selected(&self, datum: &DataPoint, index: usize) -> bool {
        !self.selected.is_empty()
            && self
                .select_field
                .extract(datum, index)
                .is_ok_and(|k| self.selected.contains(&k))
    }

    /// Apply a zoom gesture. Pans and unchanged scale only move the viewport;
    /// a new scale factor redraws bubbles and paths for that scale.
    ///
    /// # Errors
    ///
    /// Propagates render errors from the relayout.
    pub fn on_zoom(&mut self, requested: ZoomTransform) -> Result<ZoomOutcome> {
        let changed = self.zoom.apply(requested);
        let transform = self.viewport();
        for layer in [BASE, BUBBLES] {
            self.base.surface_mut().set_transform(layer, transform);
        }
        if !changed {
            log::trace!("map pan to ({}, {})", requested.x, requested.y);
            return Ok(ZoomOutcome::Transformed(transform));
        }
        log::debug!("map relayout at zoom {}", self.zoom.scale());
        self.redraw()?;
        Ok(ZoomOutcome::Relayout(transform))
    }

    fn viewport(&self) -> crate::geometry::ViewTransform {
        let m = self.base.canvas().margin;
        self.zoom.view_transform(Point::new(m.left, m.top), 0.0)
    }

    fn redraw(&mut self) -> Result<Option<RenderResult>> {
        match self.last.clone() {
            Some((data, options)) => self.draw(data, options).map(Some),
            None => Ok(None),
        }
    }

    fn draw(&mut self, data: Dataset, options: MapOptions) -> Result<RenderResult> {
        self.base.canvas().validate()?;
        if !(options.min_radius >= 0.0) || !(options.max_radius >= options.min_radius) {
            return Err(Error::config(
                "radius",
                format!("[{}, {}] is not a radius range", options.min_radius, options.max_radius),
            ));
        }
        let key_field = KeyField::single(options.key_field.as_str());
        check_keys(&data, &key_field)?;
        let lons = column(&data, &options.lon_field)?;
        let lats = column(&data, &options.lat_field)?;
        let rs = column(&data, &options.radius_field)?;

        let mut order: Vec<usize> = (0..data.len()).collect();
        order.sort_by(|&a, &b| rs[b].total_cmp(&rs[a]));
        let sorted: Dataset = order.iter().map(|&i| data[i].clone()).collect();

        let k = self.zoom.scale();
        let stroke = self.zoom.stroke_width();
        let factor = zoom_radius_factor(k, self.zoom.extent());
        let r = if data.is_empty() {
            None
        } else {
            let policy = AxisOptions::default().include_zero(false).nice(false);
            Some(self.base.linear_scale("radius", &rs, (options.min_radius, options.max_radius), &policy)?)
        };

        self.base.check_tooltips(&sorted)?;
        self.base.draw_axes(&[]);
        let transform = self.viewport();
        for layer in [BASE, BUBBLES] {
            self.base.surface_mut().set_transform(layer, transform);
        }

        let path_data: Dataset = self.paths.iter().map(|p| DataPoint::new().with("id", p.id.as_str())).collect();
        let paths = &self.paths;
        let path_mark = |_: &DataPoint, i: usize| -> Result<Mark> {
            let p = paths.get(i).ok_or_else(|| Error::Schema {
                field: "id".to_string(),
                index: i,
            })?;
            let mut style = Style {
                fill: p.fill,
                stroke: p.stroke,
                stroke_width: stroke,
                visible: true,
            };
            if style.stroke.is_none() {
                style.stroke_width = 0.0;
            }
            Ok(Mark::new(Shape::Path(p.data.clone()), style))
        };
        let (_, mut stats) = join_layer(&mut self.base_layer, &path_data, &KeyField::single("id"), path_mark, self.base.surface_mut(), None)?;

        let projection = &self.projection;
        let fill_rule = self.fill_rule.clone();
        let selected = &self.selected;
        let select_field = &self.select_field;
        let bubble_mark = |d: &DataPoint, i: usize| -> Result<Mark> {
            let center = projection.project(d.number(&options.lon_field, i)?, d.number(&options.lat_field, i)?);
            let value = d.number(&options.radius_field, i)?;
            let radius = r.as_ref().map_or(options.min_radius, |r| r.scale(value));
            let fill = fill_rule.as_ref().map_or(options.fill, |f| f(d));
            let mut style = Style::fill(fill).with_stroke(Rgba::WHITE, stroke);
            if !selected.is_empty() && select_field.extract(d, i).is_ok_and(|key| selected.contains(&key)) {
                style = style.with_stroke(options.select_stroke, 2.0 * stroke);
            }
            Ok(Mark::new(
                Shape::Circle {
                    center,
                    radius: (radius * factor).max(0.0),
                },
                style,
            ))
        };
        let (live, s) = join_layer(&mut self.bubbles, &sorted, &key_field, bubble_mark, self.base.surface_mut(), None)?;
        stats += s;

        let key = self.base.key_for_render(options.highlight_key.as_ref(), key_field.clone());
        let result = self.base.finish("map", live, stats, key.as_ref())?;
        self.last = Some((sorted, options));
        Ok(result)
    }
}

impl<B: Surface + TooltipHost> Renderable for MapChart<B> {
    type Options = MapOptions;

    fn render(&mut self, data: &ChartData, options: &MapOptions) -> Result<RenderResult> {
        let points: Dataset = data.points().cloned().collect();
        self.draw(points, options.clone())
    }
}

delegate_interactive!(MapChart);
