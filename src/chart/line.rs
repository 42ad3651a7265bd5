//! Multi-series line chart with point markers and end-of-line labels.

use super::{axis_titles, delegate_interactive, join_layer, Canvas, ChartBase, RenderResult, Renderable, TickFormat, TRANSITION};
use crate::binder::{check_keys, ElementBinder, JoinStats, LiveElements};
use crate::color::{Palette, Rgba};
use crate::data::{column, ChartData, DataPoint, KeyField, Series, SERIES_FIELD};
use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::scale::{AxisOptions, Scale};
use crate::surface::{Anchor, Curve, Mark, Scene, Shape, Style, Surface, TooltipHost};
use crate::tooltip::{TooltipAccessor, TooltipManager};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const LINES: &str = "lines";
const DOTS: &str = "dots";
const LABELS: &str = "labels";

/// Horizontal gap between the last point of a line and its label.
const LABEL_GAP: f32 = 10.0;

/// Line chart options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineOptions {
    /// Numeric x field.
    pub x_field: String,
    /// Numeric y field.
    pub y_field: String,
    /// X axis options.
    pub x_axis: AxisOptions,
    /// Y axis options.
    pub y_axis: AxisOptions,
    /// Line stroke width.
    pub line_width: f32,
    /// Point marker radius.
    pub dot_size: f32,
    /// Interpolation hint.
    pub curve: Curve,
    /// Label each named series at its last point.
    pub include_labels: bool,
    /// Series colors by series index.
    pub palette: Palette,
    /// Interaction key override for points.
    pub highlight_key: Option<KeyField>,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            x_field: "k".to_string(),
            y_field: "v".to_string(),
            x_axis: AxisOptions::default(),
            y_axis: AxisOptions::default(),
            line_width: 3.0,
            dot_size: 5.0,
            curve: Curve::Natural,
            include_labels: true,
            palette: Palette::set2(),
            highlight_key: None,
        }
    }
}

/// Line chart view. Points are interactive; lines carry their own tooltips.
pub struct LineChart<B = Scene> {
    base: ChartBase<B>,
    lines: ElementBinder,
    dots: ElementBinder,
    labels: ElementBinder,
    line_tips: TooltipManager,
    line_live: LiveElements,
    x_format: Option<TickFormat>,
    last: Option<(ChartData, LineOptions)>,
}

impl<B: std::fmt::Debug> std::fmt::Debug for LineChart<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineChart")
            .field("base", &self.base)
            .field("lines", &self.lines)
            .field("dots", &self.dots)
            .field("has_x_format", &self.x_format.is_some())
            .finish_non_exhaustive()
    }
}

impl LineChart<Scene> {
    /// Line chart drawing into an in-memory scene.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self::with_backend(canvas, Scene::new())
    }
}

// Points of one series, sorted by x.
struct Prepared {
    name: String,
    color: Rgba,
    points: Vec<(f32, f32, DataPoint)>,
}

impl<B: Surface + TooltipHost> LineChart<B> {
    /// Line chart drawing into `backend`.
    pub fn with_backend(canvas: Canvas, backend: B) -> Self {
        Self {
            base: ChartBase::new(canvas, backend, DOTS, KeyField::single("k")),
            lines: ElementBinder::new(LINES),
            dots: ElementBinder::new(DOTS),
            labels: ElementBinder::new(LABELS),
            line_tips: TooltipManager::new(),
            line_live: LiveElements::empty(LINES),
            x_format: None,
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

    /// Format x tick labels. Applies from the next render.
    pub fn set_x_tick_format(&mut self, format: Option<TickFormat>) {
        self.x_format = format;
    }

    /// Set or clear the tooltip accessor of whole lines.
    ///
    /// Line datums carry the series name under [`SERIES_FIELD`].
    ///
    /// # Errors
    ///
    /// Propagates accessor errors.
    pub fn set_line_tooltip(&mut self, accessor: Option<TooltipAccessor>) -> Result<()> {
        self.line_tips.set_content_accessor(accessor);
        self.line_tips.refresh(&self.line_live, self.base.surface_mut())?;
        Ok(())
    }

    /// Re-render the last data with different axis options, animating marks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if nothing has been rendered yet, or any render error.
    pub fn rescale(&mut self, x_axis: AxisOptions, y_axis: AxisOptions) -> Result<RenderResult> {
        let Some((data, mut options)) = self.last.clone() else {
            return Err(Error::config("rescale", "line chart has not been rendered"));
        };
        options.x_axis = x_axis;
        options.y_axis = y_axis;
        self.draw(&data, &options, Some(TRANSITION))
    }

    fn prepare(series: &[Series], options: &LineOptions) -> Result<Vec<Prepared>> {
        series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let xs = column(&s.data, &options.x_field)?;
                let ys = column(&s.data, &options.y_field)?;
                let mut points: Vec<(f32, f32, DataPoint)> = xs
                    .into_iter()
                    .zip(ys)
                    .zip(&s.data)
                    .map(|((x, y), d)| (x, y, d.clone().with(SERIES_FIELD, s.name.as_str())))
                    .collect();
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
                Ok(Prepared {
                    name: s.name.clone(),
                    color: options.palette.color(i),
                    points,
                })
            })
            .collect()
    }

    fn draw(&mut self, data: &ChartData, options: &LineOptions, transition: Option<Duration>) -> Result<RenderResult> {
        self.base.canvas().validate()?;
        if options.palette.is_empty() {
            return Err(Error::config("palette", "a palette needs at least one color"));
        }
        let default_key = KeyField::single(options.x_field.as_str());

        if data.is_empty() {
            let surface = self.base.surface_mut();
            self.lines.clear(surface);
            self.dots.clear(surface);
            self.labels.clear(surface);
            self.line_live = LiveElements::empty(LINES);
            self.line_tips.clear(self.base.surface_mut());
            self.base.draw_axes(&[]);
            self.last = Some((data.clone(), options.clone()));
            let key = self.base.key_for_render(options.highlight_key.as_ref(), default_key);
            return self.base.finish("line", LiveElements::empty(DOTS), JoinStats::default(), key.as_ref());
        }

        let series = data.normalize();
        let prepared = Self::prepare(&series, options)?;

        let line_key = KeyField::single(SERIES_FIELD);
        let dot_key = KeyField::composite([SERIES_FIELD, options.x_field.as_str()]);
        let line_data: Vec<DataPoint> = prepared
            .iter()
            .enumerate()
            .map(|(i, p)| DataPoint::new().with(SERIES_FIELD, p.name.as_str()).with("index", i))
            .collect();
        let dot_data: Vec<DataPoint> = prepared
            .iter()
            .flat_map(|p| p.points.iter().map(|(_, _, d)| d.clone()))
            .collect();
        check_keys(&line_data, &line_key)?;
        check_keys(&dot_data, &dot_key)?;

        let canvas = *self.base.canvas();
        let (width, height) = (canvas.chart_width(), canvas.chart_height());
        let all_x: Vec<f32> = prepared.iter().flat_map(|p| p.points.iter().map(|pt| pt.0)).collect();
        let all_y: Vec<f32> = prepared.iter().flat_map(|p| p.points.iter().map(|pt| pt.1)).collect();
        let x = self.base.linear_scale("x", &all_x, (0.0, width), &options.x_axis)?;
        let y = self.base.linear_scale("y", &all_y, (height, 0.0), &options.y_axis)?;
        self.base.check_tooltips(&dot_data)?;
        self.line_tips.check(&line_data)?;

        let (x_title, y_title) = axis_titles(data.first(), &options.x_axis, &options.y_axis);
        let axes = [
            self.base.bottom_axis(&x, &options.x_axis, x_title, self.x_format.as_ref()),
            self.base.left_axis(&y, &options.y_axis, y_title),
        ];
        self.base.draw_axes(&axes);
        self.base.place_layers(&[LINES, DOTS, LABELS]);

        let mut stats = JoinStats::default();
        let project = |px: f32, py: f32| Point::new(x.scale(px), y.scale(py));

        let line_mark = |_: &DataPoint, i: usize| -> Result<Mark> {
            let p = prepared
                .get(i)
                .ok_or_else(|| Error::Schema { field: SERIES_FIELD.to_string(), index: i })?;
            Ok(Mark::new(
                Shape::Polyline {
                    points: p.points.iter().map(|(px, py, _)| project(*px, *py)).collect(),
                    curve: options.curve,
                },
                Style::stroke(p.color, options.line_width),
            ))
        };
        let (line_live, s) = join_layer(&mut self.lines, &line_data, &line_key, line_mark, self.base.surface_mut(), transition)?;
        stats += s;

        let dot_mark = |d: &DataPoint, i: usize| -> Result<Mark> {
            let (px, py) = (d.number(&options.x_field, i)?, d.number(&options.y_field, i)?);
            let color = d
                .text(SERIES_FIELD)
                .and_then(|name| prepared.iter().find(|p| p.name == name))
                .map_or(Rgba::BLACK, |p| p.color);
            Ok(Mark::new(
                Shape::Circle {
                    center: project(px, py),
                    radius: options.dot_size,
                },
                Style::fill(color).with_stroke(Rgba::WHITE, 1.0),
            ))
        };
        let (dot_live, s) = join_layer(&mut self.dots, &dot_data, &dot_key, dot_mark, self.base.surface_mut(), transition)?;
        stats += s;

        let label_data: Vec<DataPoint> = if options.include_labels {
            line_data
                .iter()
                .zip(&prepared)
                .filter(|(_, p)| !p.name.is_empty() && !p.points.is_empty())
                .map(|(d, _)| d.clone())
                .collect()
        } else {
            Vec::new()
        };
        let label_mark = |d: &DataPoint, i: usize| -> Result<Mark> {
            let name = d.require(SERIES_FIELD, i)?.to_string();
            let p = prepared.iter().find(|p| p.name == name);
            let (anchor, color) = p
                .and_then(|p| p.points.last().map(|(px, py, _)| (project(*px, *py), p.color)))
                .unwrap_or((Point::ORIGIN, Rgba::BLACK));
            Ok(Mark::new(
                Shape::Text {
                    position: Point::new(anchor.x + LABEL_GAP, anchor.y),
                    content: name,
                    anchor: Anchor::Start,
                    rotation: 0.0,
                },
                Style::fill(color),
            ))
        };
        let (_, s) = join_layer(&mut self.labels, &label_data, &line_key, label_mark, self.base.surface_mut(), transition)?;
        stats += s;

        self.line_live = line_live;
        self.line_tips.refresh(&self.line_live, self.base.surface_mut())?;

        let key = self.base.key_for_render(options.highlight_key.as_ref(), default_key);
        let result = self.base.finish("line", dot_live, stats, key.as_ref())?;
        self.last = Some((data.clone(), options.clone()));
        Ok(result)
    }
}

impl<B: Surface + TooltipHost> Renderable for LineChart<B> {
    type Options = LineOptions;

    fn render(&mut self, data: &ChartData, options: &LineOptions) -> Result<RenderResult> {
        self.draw(data, options, None)
    }
}

delegate_interactive!(LineChart);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Interactive, Tooltippable};
    use crate::data::{Key, Value};
    use crate::tooltip::accessor;
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn pt(k: f32, v: f32) -> DataPoint {
        DataPoint::new().with("k", k).with("v", v)
    }

    fn two_series() -> ChartData {
        ChartData::from(vec![
            Series::new("A", vec![pt(3.0, 1.0), pt(1.0, 2.0), pt(2.0, 3.0)]),
            Series::new("B", vec![pt(1.0, 4.0), pt(3.0, 5.0)]),
        ])
    }

    fn dot_key(series: &str, k: f32) -> Key {
        Key::new(vec![Value::from(series), Value::from(k)])
    }

    #[test]
    fn test_flat_data_is_one_series() {
        let mut chart = LineChart::new(Canvas::default());
        let data = ChartData::from(vec![pt(1.0, 1.0), pt(2.0, 2.0)]);
        let result = chart.render(&data, &LineOptions::default()).expect("operation should succeed");
        assert_eq!(chart.surface().keys("lines").len(), 1);
        assert_eq!(result.live.len(), 2);
        // unnamed series get no label
        assert!(chart.surface().keys("labels").is_empty());
    }

    #[test]
    fn test_points_sorted_by_x() {
        let mut chart = LineChart::new(Canvas::default());
        chart.render(&two_series(), &LineOptions::default()).expect("operation should succeed");
        let line = chart
            .surface()
            .element("lines", &Key::single("A"))
            .expect("line A should exist");
        match &line.mark.shape {
            Shape::Polyline { points, curve } => {
                assert_eq!(points.len(), 3);
                assert!(points.windows(2).all(|w| w[0].x < w[1].x));
                assert_eq!(*curve, Curve::Natural);
            }
            other => panic!("Expected polyline, got {other:?}"),
        }
    }

    #[test]
    fn test_series_colors_by_index() {
        let mut chart = LineChart::new(Canvas::default());
        chart.render(&two_series(), &LineOptions::default()).expect("operation should succeed");
        let color_of = |s: &str| {
            chart
                .surface()
                .element("lines", &Key::single(s))
                .and_then(|e| e.mark.style.stroke)
        };
        assert_eq!(color_of("A"), Some(Palette::SET2[0]));
        assert_eq!(color_of("B"), Some(Palette::SET2[1]));
        let dot = chart
            .surface()
            .element("dots", &dot_key("B", 3.0))
            .expect("dot should exist");
        assert_eq!(dot.mark.style.fill, Some(Palette::SET2[1]));
        assert_relative_eq!(dot.mark.circle().map(|c| c.1).unwrap_or_default(), 5.0);
    }

    #[test]
    fn test_label_right_of_last_point() {
        let mut chart = LineChart::new(Canvas::default());
        chart.render(&two_series(), &LineOptions::default()).expect("operation should succeed");
        let last_dot = chart
            .surface()
            .element("dots", &dot_key("A", 3.0))
            .and_then(|e| e.mark.circle())
            .expect("dot should exist");
        let label = chart
            .surface()
            .element("labels", &Key::single("A"))
            .expect("label should exist");
        match &label.mark.shape {
            Shape::Text { position, content, .. } => {
                assert_eq!(content, "A");
                assert_relative_eq!(position.x, last_dot.0.x + LABEL_GAP);
                assert_relative_eq!(position.y, last_dot.0.y);
            }
            other => panic!("Expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_labels_can_be_disabled() {
        let mut chart = LineChart::new(Canvas::default());
        let options = LineOptions {
            include_labels: false,
            ..LineOptions::default()
        };
        chart.render(&two_series(), &options).expect("operation should succeed");
        assert!(chart.surface().keys("labels").is_empty());
    }

    #[test]
    fn test_duplicate_x_within_series_rejected() {
        let mut chart = LineChart::new(Canvas::default());
        let data = ChartData::from(vec![Series::new("A", vec![pt(1.0, 1.0), pt(1.0, 2.0)])]);
        assert!(matches!(
            chart.render(&data, &LineOptions::default()),
            Err(Error::DuplicateKey { .. })
        ));
        assert!(chart.surface().keys("lines").is_empty());
    }

    #[test]
    fn test_composite_highlight_single_dot() {
        let mut chart = LineChart::new(Canvas::default());
        let options = LineOptions {
            highlight_key: Some(KeyField::composite([SERIES_FIELD, "k"])),
            ..LineOptions::default()
        };
        chart.render(&two_series(), &options).expect("operation should succeed");
        assert_eq!(chart.highlight(&[dot_key("A", 3.0)]), 1);
        assert_eq!(chart.surface().emphasized("dots"), vec![dot_key("A", 3.0)]);

        // single-field highlight on the same x hits both series
        assert_eq!(chart.highlight_by(&[Key::single(3.0f32)], &KeyField::single("k")), 2);
    }

    #[test]
    fn test_line_and_dot_tooltips() {
        let mut chart = LineChart::new(Canvas::default());
        chart.render(&two_series(), &LineOptions::default()).expect("operation should succeed");
        chart
            .set_line_tooltip(Some(accessor(|d| Ok(d.text(SERIES_FIELD).unwrap_or_default().to_string()))))
            .expect("operation should succeed");
        chart
            .set_tooltip(Some(accessor(|d| Ok(format!("{}", d.get("v").cloned().unwrap_or_default())))))
            .expect("operation should succeed");
        assert_eq!(chart.surface().tooltip_text("lines", &Key::single("B")), Some("B"));
        assert_eq!(chart.surface().tooltip_text("dots", &dot_key("B", 3.0)), Some("5"));
        assert_eq!(chart.surface().tooltips().count(), 7);
    }

    #[test]
    fn test_tooltip_error_keeps_previous_render() {
        let mut chart = LineChart::new(Canvas::default());
        chart.render(&two_series(), &LineOptions::default()).expect("operation should succeed");
        chart
            .set_tooltip(Some(accessor(|d| match d.text(SERIES_FIELD) {
                Some("C") => Err(Error::Accessor("series C has no label".to_string())),
                s => Ok(s.unwrap_or_default().to_string()),
            })))
            .expect("operation should succeed");

        let three = ChartData::from(vec![
            Series::new("A", vec![pt(1.0, 2.0)]),
            Series::new("C", vec![pt(1.0, 9.0)]),
        ]);
        let err = chart.render(&three, &LineOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Accessor(_)));
        assert_eq!(chart.surface().keys("lines"), vec![Key::single("A"), Key::single("B")]);
        assert_eq!(chart.surface().keys("dots").len(), 5);
        assert_eq!(chart.surface().tooltip_text("dots", &dot_key("B", 3.0)), Some("B"));
    }

    #[test]
    fn test_x_tick_format() {
        let mut chart = LineChart::new(Canvas::default());
        chart.set_x_tick_format(Some(Rc::new(|v| format!("M{v}"))));
        chart.render(&two_series(), &LineOptions::default()).expect("operation should succeed");
        let axis = &chart.surface().axes()[0];
        assert!(axis.ticks.iter().all(|t| t.label.starts_with('M')));
    }

    #[test]
    fn test_rescale_animates_dots() {
        let mut chart = LineChart::new(Canvas::default());
        chart.render(&two_series(), &LineOptions::default()).expect("operation should succeed");
        chart
            .rescale(AxisOptions::default(), AxisOptions::default().fixed(None, Some(50.0)))
            .expect("operation should succeed");
        let dot = chart
            .surface()
            .element("dots", &dot_key("A", 1.0))
            .expect("dot should exist");
        assert_eq!(dot.last_animation, Some(TRANSITION));
    }
}
