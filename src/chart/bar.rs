//! Bar chart: band x axis, linear y axis.

use super::{axis_titles, delegate_interactive, join_layer, Canvas, ChartBase, RenderResult, Renderable, TRANSITION};
use crate::binder::{check_keys, ElementBinder, JoinStats, LiveElements};
use crate::color::Rgba;
use crate::data::{column, ChartData, Dataset, KeyField};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::scale::{AxisOptions, BandScale, Scale};
use crate::surface::{Mark, Scene, Shape, Style, Surface, TooltipHost};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BARS: &str = "bars";

/// Bar chart options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarOptions {
    /// Category field; also the lifecycle key.
    pub key_field: String,
    /// Measure field.
    pub value_field: String,
    /// Inter-band padding in `[0, 1)`.
    pub bar_padding: f32,
    /// Y axis options.
    pub y_axis: AxisOptions,
    /// X axis tick length.
    pub x_tick_size: f32,
    /// Bar fill.
    pub fill: Rgba,
    /// Interaction key override.
    pub highlight_key: Option<KeyField>,
}

impl Default for BarOptions {
    fn default() -> Self {
        Self {
            key_field: "k".to_string(),
            value_field: "v".to_string(),
            bar_padding: 0.15,
            y_axis: AxisOptions::default(),
            x_tick_size: 6.0,
            fill: Rgba::rgb(70, 130, 180),
            highlight_key: None,
        }
    }
}

/// Bar chart view.
#[derive(Debug)]
pub struct BarChart<B = Scene> {
    base: ChartBase<B>,
    bars: ElementBinder,
    last: Option<(Dataset, BarOptions)>,
}

impl BarChart<Scene> {
    /// Bar chart drawing into an in-memory scene.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self::with_backend(canvas, Scene::new())
    }
}

impl<B: Surface + TooltipHost> BarChart<B> {
    /// Bar chart drawing into `backend`.
    pub fn with_backend(canvas: Canvas, backend: B) -> Self {
        Self {
            base: ChartBase::new(canvas, backend, BARS, KeyField::single("k")),
            bars: ElementBinder::new(BARS),
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

    /// Re-render the last data with different y axis options, animating bars and axes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if nothing has been rendered yet, or any render error.
    pub fn rescale(&mut self, y_axis: AxisOptions) -> Result<RenderResult> {
        let Some((data, mut options)) = self.last.clone() else {
            return Err(Error::config("rescale", "bar chart has not been rendered"));
        };
        options.y_axis = y_axis;
        self.draw(data, options, Some(TRANSITION))
    }

    fn draw(&mut self, data: Dataset, options: BarOptions, transition: Option<Duration>) -> Result<RenderResult> {
        self.base.canvas().validate()?;
        if data.is_empty() {
            self.bars.clear(self.base.surface_mut());
            self.base.draw_axes(&[]);
            let key = self.base.key_for_render(options.highlight_key.as_ref(), KeyField::single(options.key_field.as_str()));
            self.last = Some((data, options));
            return self.base.finish("bar", LiveElements::empty(BARS), JoinStats::default(), key.as_ref());
        }

        let key_field = KeyField::single(options.key_field.as_str());
        check_keys(&data, &key_field)?;
        let values = column(&data, &options.value_field)?;

        let canvas = *self.base.canvas();
        let (width, height) = (canvas.chart_width(), canvas.chart_height());
        let categories = data
            .iter()
            .enumerate()
            .map(|(i, d)| d.require(&options.key_field, i).cloned())
            .collect::<Result<Vec<_>>>()?;
        let x = BandScale::new(categories, (0.0, width), options.bar_padding)?;
        let y = self.base.linear_scale("y", &values, (height, 0.0), &options.y_axis)?;
        self.base.check_tooltips(&data)?;

        let (x_title, y_title) = axis_titles(data.first(), &AxisOptions::default(), &options.y_axis);
        let axes = [
            self.base.band_axis(&x, options.x_tick_size, x_title),
            self.base.left_axis(&y, &options.y_axis, y_title),
        ];
        self.base.draw_axes(&axes);
        self.base.place_layers(&[BARS]);

        let style = Style::fill(options.fill);
        let mark = |d: &crate::data::DataPoint, i: usize| -> Result<Mark> {
            let k = d.require(&options.key_field, i)?;
            let v = d.number(&options.value_field, i)?;
            let top = y.scale(v);
            let left = x.position(k).unwrap_or_default();
            Ok(Mark::new(
                Shape::Rect(Rect::new(left, top, x.bandwidth(), height - top)),
                style,
            ))
        };
        let (live, stats) = join_layer(&mut self.bars, &data, &key_field, mark, self.base.surface_mut(), transition)?;

        let key = self.base.key_for_render(options.highlight_key.as_ref(), key_field.clone());
        let result = self.base.finish("bar", live, stats, key.as_ref())?;
        self.last = Some((data, options));
        Ok(result)
    }
}

impl<B: Surface + TooltipHost> Renderable for BarChart<B> {
    type Options = BarOptions;

    fn render(&mut self, data: &ChartData, options: &BarOptions) -> Result<RenderResult> {
        let points: Dataset = data.points().cloned().collect();
        self.draw(points, options.clone(), None)
    }
}

delegate_interactive!(BarChart);
