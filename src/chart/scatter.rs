//! Scatter plot of one or more point groups.

use super::{axis_titles, delegate_interactive, join_layer, Canvas, ChartBase, RenderResult, Renderable, TRANSITION};
use crate::binder::{check_keys, ElementBinder, JoinStats, LiveElements};
use crate::color::Palette;
use crate::data::{column, ChartData, DataPoint, KeyField, SERIES_FIELD};
use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::scale::{AxisOptions, Scale};
use crate::surface::{Legend, Mark, Scene, Shape, Style, Surface, TooltipHost};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const POINTS: &str = "points";

/// Scatter plot options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterOptions {
    /// Numeric x field.
    pub x_field: String,
    /// Numeric y field.
    pub y_field: String,
    /// X axis options.
    pub x_axis: AxisOptions,
    /// Y axis options.
    pub y_axis: AxisOptions,
    /// Point radius.
    pub dot_size: f32,
    /// Group colors by group index.
    pub palette: Palette,
    /// Interaction key override.
    pub highlight_key: Option<KeyField>,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            x_field: "k".to_string(),
            y_field: "v".to_string(),
            x_axis: AxisOptions::default(),
            y_axis: AxisOptions::default(),
            dot_size: 5.0,
            palette: Palette::category10(),
            highlight_key: None,
        }
    }
}

/// Scatter plot view.
#[derive(Debug)]
pub struct ScatterChart<B = Scene> {
    base: ChartBase<B>,
    points: ElementBinder,
    last: Option<(ChartData, ScatterOptions)>,
}

impl ScatterChart<Scene> {
    /// Scatter plot drawing into an in-memory scene.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self::with_backend(canvas, Scene::new())
    }
}

impl<B: Surface + TooltipHost> ScatterChart<B> {
    /// Scatter plot drawing into `backend`.
    pub fn with_backend(canvas: Canvas, backend: B) -> Self {
        Self {
            base: ChartBase::new(canvas, backend, POINTS, KeyField::single("k")),
            points: ElementBinder::new(POINTS),
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

    /// Re-render the last data with different axis options, animating points.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if nothing has been rendered yet, or any render error.
    pub fn rescale(&mut self, x_axis: AxisOptions, y_axis: AxisOptions) -> Result<RenderResult> {
        let Some((data, mut options)) = self.last.clone() else {
            return Err(Error::config("rescale", "scatter chart has not been rendered"));
        };
        options.x_axis = x_axis;
        options.y_axis = y_axis;
        self.draw(&data, &options, Some(TRANSITION))
    }

    fn draw(&mut self, data: &ChartData, options: &ScatterOptions, transition: Option<Duration>) -> Result<RenderResult> {
        self.base.canvas().validate()?;
        if !(options.dot_size >= 0.0) {
            return Err(Error::config("dot_size", format!("{} is not a radius", options.dot_size)));
        }
        if options.palette.is_empty() {
            return Err(Error::config("palette", "a palette needs at least one color"));
        }
        let default_key = KeyField::single(options.x_field.as_str());

        if data.is_empty() {
            self.points.clear(self.base.surface_mut());
            self.base.draw_axes(&[]);
            self.base.surface_mut().set_legends(&[]);
            self.last = Some((data.clone(), options.clone()));
            let key = self.base.key_for_render(options.highlight_key.as_ref(), default_key);
            return self.base.finish("scatter", LiveElements::empty(POINTS), JoinStats::default(), key.as_ref());
        }

        let groups = data.normalize();
        let mut points: Vec<DataPoint> = Vec::with_capacity(data.len());
        let mut xs = Vec::with_capacity(data.len());
        let mut ys = Vec::with_capacity(data.len());
        for (g, group) in groups.iter().enumerate() {
            xs.extend(column(&group.data, &options.x_field)?);
            ys.extend(column(&group.data, &options.y_field)?);
            points.extend(
                group
                    .data
                    .iter()
                    .map(|d| d.clone().with(SERIES_FIELD, group.name.as_str()).with("group_index", g)),
            );
        }
        let point_key = KeyField::composite([SERIES_FIELD, options.x_field.as_str()]);
        check_keys(&points, &point_key)?;

        let canvas = *self.base.canvas();
        let (width, height) = (canvas.chart_width(), canvas.chart_height());
        let x = self.base.linear_scale("x", &xs, (0.0, width), &options.x_axis)?;
        let y = self.base.linear_scale("y", &ys, (height, 0.0), &options.y_axis)?;
        self.base.check_tooltips(&points)?;

        let (x_title, y_title) = axis_titles(data.first(), &options.x_axis, &options.y_axis);
        let axes = [
            self.base.bottom_axis(&x, &options.x_axis, x_title, None),
            self.base.left_axis(&y, &options.y_axis, y_title),
        ];
        self.base.draw_axes(&axes);
        let legend: Vec<Legend> = if groups.len() > 1 {
            vec![Legend {
                title: None,
                entries: groups
                    .iter()
                    .enumerate()
                    .map(|(g, group)| (group.name.clone(), options.palette.color(g)))
                    .collect(),
            }]
        } else {
            Vec::new()
        };
        self.base.surface_mut().set_legends(&legend);
        self.base.place_layers(&[POINTS]);

        let mark = |d: &DataPoint, i: usize| -> Result<Mark> {
            let px = d.number(&options.x_field, i)?;
            let py = d.number(&options.y_field, i)?;
            let g = d.number("group_index", i)? as usize;
            Ok(Mark::new(
                Shape::Circle {
                    center: Point::new(x.scale(px), y.scale(py)),
                    radius: options.dot_size,
                },
                Style::fill(options.palette.color(g)),
            ))
        };
        let (live, stats) = join_layer(&mut self.points, &points, &point_key, mark, self.base.surface_mut(), transition)?;

        let key = self.base.key_for_render(options.highlight_key.as_ref(), default_key);
        let result = self.base.finish("scatter", live, stats, key.as_ref())?;
        self.last = Some((data.clone(), options.clone()));
        Ok(result)
    }
}

impl<B: Surface + TooltipHost> Renderable for ScatterChart<B> {
    type Options = ScatterOptions;

    fn render(&mut self, data: &ChartData, options: &ScatterOptions) -> Result<RenderResult> {
        self.draw(data, options, None)
    }
}

delegate_interactive!(ScatterChart);
