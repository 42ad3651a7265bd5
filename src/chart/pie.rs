//! Pie and donut chart.

use super::{delegate_interactive, join_layer, Canvas, ChartBase, RenderResult, Renderable};
use crate::binder::{check_keys, ElementBinder, JoinStats, LiveElements};
use crate::color::{Palette, Rgba};
use crate::data::{column, ChartData, DataPoint, Dataset, KeyField};
use crate::error::{Error, Result};
use crate::geometry::{ArcSpan, Point};
use crate::surface::{Anchor, Mark, Scene, Shape, Style, Surface, TooltipHost};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

const SLICES: &str = "slices";
const LABELS: &str = "labels";

/// Angular partition of a full turn proportional to `values`, in input order.
///
/// Each slice is shrunk by `pad_angle / 2` at both ends. The pad is capped
/// so that `n` pads never exceed a full turn. A zero total gives every slice
/// zero width.
#[must_use]
pub fn pie_angles(values: &[f32], pad_angle: f32) -> Vec<(f32, f32)> {
    if values.is_empty() {
        return Vec::new();
    }
    let total: f32 = values.iter().filter(|v| v.is_finite()).sum();
    let pad = if total > 0.0 {
        pad_angle.clamp(0.0, TAU / values.len() as f32)
    } else {
        0.0
    };
    let k = if total > 0.0 {
        (TAU - pad * values.len() as f32) / total
    } else {
        0.0
    };
    let mut angle = 0.0f32;
    values
        .iter()
        .map(|v| {
            let sweep = if v.is_finite() { v * k } else { 0.0 };
            let start = angle + pad / 2.0;
            angle += sweep + pad;
            (start, start + sweep)
        })
        .collect()
}

/// Pie chart options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieOptions {
    /// Slice category field; also the lifecycle key.
    pub key_field: String,
    /// Slice size field.
    pub value_field: String,
    /// Gap between slices in radians.
    pub pad_angle: f32,
    /// Inner radius as a fraction of the available radius (0 for a pie).
    pub inner_radius_factor: f32,
    /// Outer radius as a fraction of the available radius.
    pub outer_radius_factor: f32,
    /// Width of the ring reserved for labels outside the slices.
    pub label_offset: f32,
    /// Slice colors by index.
    pub palette: Palette,
    /// Draw category labels.
    pub show_labels: bool,
    /// Interaction key override.
    pub highlight_key: Option<KeyField>,
}

impl Default for PieOptions {
    fn default() -> Self {
        Self {
            key_field: "k".to_string(),
            value_field: "v".to_string(),
            pad_angle: 0.02,
            inner_radius_factor: 0.2,
            outer_radius_factor: 1.0,
            label_offset: 0.0,
            palette: Palette::category10(),
            show_labels: true,
            highlight_key: None,
        }
    }
}

impl PieOptions {
    fn validate(&self) -> Result<()> {
        if !(self.inner_radius_factor >= 0.0) || !(self.outer_radius_factor >= 0.0) {
            return Err(Error::config("radius_factor", "radius factors must be non-negative"));
        }
        if self.inner_radius_factor > self.outer_radius_factor {
            return Err(Error::config(
                "inner_radius_factor",
                format!(
                    "{} exceeds outer_radius_factor {}",
                    self.inner_radius_factor, self.outer_radius_factor
                ),
            ));
        }
        if !(self.pad_angle >= 0.0) {
            return Err(Error::config("pad_angle", format!("{} is negative", self.pad_angle)));
        }
        if !(self.label_offset >= 0.0) {
            return Err(Error::config("label_offset", format!("{} is negative", self.label_offset)));
        }
        if self.palette.is_empty() {
            return Err(Error::config("palette", "a palette needs at least one color"));
        }
        Ok(())
    }
}

/// Pie/donut view.
#[derive(Debug)]
pub struct PieChart<B = Scene> {
    base: ChartBase<B>,
    slices: ElementBinder,
    labels: ElementBinder,
}

impl PieChart<Scene> {
    /// Pie chart drawing into an in-memory scene.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self::with_backend(canvas, Scene::new())
    }
}

impl<B: Surface + TooltipHost> PieChart<B> {
    /// Pie chart drawing into `backend`.
    pub fn with_backend(canvas: Canvas, backend: B) -> Self {
        Self {
            base: ChartBase::new(canvas, backend, SLICES, KeyField::single("k")),
            slices: ElementBinder::new(SLICES),
            labels: ElementBinder::new(LABELS),
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

    fn draw(&mut self, data: &Dataset, options: &PieOptions) -> Result<RenderResult> {
        self.base.canvas().validate()?;
        options.validate()?;
        let key_field = KeyField::single(options.key_field.as_str());

        check_keys(data, &key_field)?;
        let values = column(data, &options.value_field)?;
        if let Some(v) = values.iter().find(|v| **v < 0.0) {
            return Err(Error::config(options.value_field.as_str(), format!("negative slice size {v}")));
        }

        let canvas = *self.base.canvas();
        let (width, height) = (canvas.chart_width(), canvas.chart_height());
        let center = Point::new(width / 2.0, height / 2.0);
        let available = (width.min(height) / 2.0 - options.label_offset).max(0.0);
        let inner = available * options.inner_radius_factor;
        let outer = available * options.outer_radius_factor;
        let angles = pie_angles(&values, options.pad_angle);
        self.base.check_tooltips(data)?;

        self.base.draw_axes(&[]);
        self.base.place_layers(&[SLICES, LABELS]);

        let span = |i: usize| {
            let (start, end) = angles.get(i).copied().unwrap_or_default();
            ArcSpan::new(start, end, inner, outer)
        };
        let slice_mark = |_: &DataPoint, i: usize| -> Result<Mark> {
            Ok(Mark::new(
                Shape::Arc { center, span: span(i) },
                Style::fill(options.palette.color(i)).with_stroke(Rgba::rgb(128, 128, 128), 1.0),
            ))
        };
        let (live, mut stats) = join_layer(&mut self.slices, data, &key_field, slice_mark, self.base.surface_mut(), None)?;

        let empty: Dataset = Vec::new();
        let label_data = if options.show_labels { data } else { &empty };
        let label_mark = |d: &DataPoint, i: usize| -> Result<Mark> {
            let s = span(i);
            let ring = ArcSpan::new(s.start_angle, s.end_angle, inner + options.label_offset, outer + options.label_offset);
            Ok(Mark::new(
                Shape::Text {
                    position: center.offset(ring.centroid()),
                    content: d.require(&options.key_field, i)?.to_string(),
                    anchor: Anchor::Middle,
                    rotation: 0.0,
                },
                Style::fill(Rgba::BLACK),
            ))
        };
        let (_, label_stats) = join_layer(&mut self.labels, label_data, &key_field, label_mark, self.base.surface_mut(), None)?;
        stats += label_stats;

        let key = self.base.key_for_render(options.highlight_key.as_ref(), key_field.clone());
        self.base.finish("pie", live, stats, key.as_ref())
    }
}

impl<B: Surface + TooltipHost> Renderable for PieChart<B> {
    type Options = PieOptions;

    fn render(&mut self, data: &ChartData, options: &PieOptions) -> Result<RenderResult> {
        let points: Dataset = data.points().cloned().collect();
        if points.is_empty() {
            self.base.canvas().validate()?;
            options.validate()?;
            self.slices.clear(self.base.surface_mut());
            self.labels.clear(self.base.surface_mut());
            let key = self
                .base
                .key_for_render(options.highlight_key.as_ref(), KeyField::single(options.key_field.as_str()));
            return self.base.finish("pie", LiveElements::empty(SLICES), JoinStats::default(), key.as_ref());
        }
        self.draw(&points, options)
    }
}

delegate_interactive!(PieChart);
