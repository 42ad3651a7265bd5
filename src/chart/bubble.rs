//! Bubble chart: x/y position plus a radius channel.
//!
//! The radius range is derived from the room available per bubble so that a
//! dense dataset does not collapse into one overlapping blob. Bubbles are
//! entered largest first, which leaves small bubbles on top.

use super::{axis_titles, delegate_interactive, join_layer, Canvas, ChartBase, RenderResult, Renderable, TRANSITION};
use crate::binder::{check_keys, ElementBinder, JoinStats, LiveElements};
use crate::color::Rgba;
use crate::data::{column, ChartData, DataPoint, Dataset, KeyField};
use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::scale::{radius_range, AxisOptions, Scale};
use crate::surface::{Mark, Scene, Shape, Style, Surface, TooltipHost};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BUBBLES: &str = "bubbles";

/// Bubble chart options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleOptions {
    /// Lifecycle key field.
    pub key_field: String,
    /// Numeric x field.
    pub x_field: String,
    /// Numeric y field.
    pub y_field: String,
    /// Numeric radius field.
    pub radius_field: String,
    /// X axis options.
    pub x_axis: AxisOptions,
    /// Y axis options.
    pub y_axis: AxisOptions,
    /// Largest bubble radius. Defaults to `min(width, height) / n`.
    pub max_radius: Option<f32>,
    /// Smallest bubble radius. Defaults to `max_radius / n`.
    pub min_radius: Option<f32>,
    /// Bubble fill.
    pub fill: Rgba,
    /// Interaction key override.
    pub highlight_key: Option<KeyField>,
}

impl Default for BubbleOptions {
    fn default() -> Self {
        Self {
            key_field: "k".to_string(),
            x_field: "x".to_string(),
            y_field: "y".to_string(),
            radius_field: "r".to_string(),
            x_axis: AxisOptions::default(),
            y_axis: AxisOptions::default(),
            max_radius: None,
            min_radius: None,
            fill: Rgba::rgb(70, 130, 180).with_alpha(180),
            highlight_key: None,
        }
    }
}

/// Bubble chart view.
#[derive(Debug)]
pub struct BubbleChart<B = Scene> {
    base: ChartBase<B>,
    bubbles: ElementBinder,
    last: Option<(Dataset, BubbleOptions)>,
}

impl BubbleChart<Scene> {
    /// Bubble chart drawing into an in-memory scene.
    #[must_use]
    pub fn new(canvas: Canvas) -> Self {
        Self::with_backend(canvas, Scene::new())
    }
}

impl<B: Surface + TooltipHost> BubbleChart<B> {
    /// Bubble chart drawing into `backend`.
    pub fn with_backend(canvas: Canvas, backend: B) -> Self {
        Self {
            base: ChartBase::new(canvas, backend, BUBBLES, KeyField::single("k")),
            bubbles: ElementBinder::new(BUBBLES),
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

    /// Re-render the last data with different axis options, animating bubbles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if nothing has been rendered yet, or any render error.
    pub fn rescale(&mut self, x_axis: AxisOptions, y_axis: AxisOptions) -> Result<RenderResult> {
        let Some((data, mut options)) = self.last.clone() else {
            return Err(Error::config("rescale", "bubble chart has not been rendered"));
        };
        options.x_axis = x_axis;
        options.y_axis = y_axis;
        self.draw(data, options, Some(TRANSITION))
    }

    fn draw(&mut self, data: Dataset, options: BubbleOptions, transition: Option<Duration>) -> Result<RenderResult> {
        self.base.canvas().validate()?;
        for (name, r) in [("max_radius", options.max_radius), ("min_radius", options.min_radius)] {
            if let Some(r) = r {
                if !(r >= 0.0) {
                    return Err(Error::config(name, format!("{r} is not a radius")));
                }
            }
        }
        let key_field = KeyField::single(options.key_field.as_str());

        if data.is_empty() {
            self.bubbles.clear(self.base.surface_mut());
            self.base.draw_axes(&[]);
            let key = self.base.key_for_render(options.highlight_key.as_ref(), key_field);
            self.last = Some((data, options));
            return self.base.finish("bubble", LiveElements::empty(BUBBLES), JoinStats::default(), key.as_ref());
        }

        check_keys(&data, &key_field)?;
        let xs = column(&data, &options.x_field)?;
        let ys = column(&data, &options.y_field)?;
        let rs = column(&data, &options.radius_field)?;

        let mut order: Vec<usize> = (0..data.len()).collect();
        order.sort_by(|&a, &b| rs[b].total_cmp(&rs[a]));
        let sorted: Dataset = order.iter().map(|&i| data[i].clone()).collect();

        let canvas = *self.base.canvas();
        let (width, height) = (canvas.chart_width(), canvas.chart_height());
        let x = self.base.linear_scale("x", &xs, (0.0, width), &options.x_axis)?;
        let y = self.base.linear_scale("y", &ys, (height, 0.0), &options.y_axis)?;
        let data_max = rs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let range = radius_range(width, height, data.len(), data_max, options.max_radius, options.min_radius);
        let r = self.base.linear_scale("radius", &rs, range, &AxisOptions::default().nice(false))?;
        self.base.check_tooltips(&sorted)?;

        let (x_title, y_title) = axis_titles(sorted.first(), &options.x_axis, &options.y_axis);
        let axes = [
            self.base.bottom_axis(&x, &options.x_axis, x_title, None),
            self.base.left_axis(&y, &options.y_axis, y_title),
        ];
        self.base.draw_axes(&axes);
        self.base.place_layers(&[BUBBLES]);

        let style = Style::fill(options.fill).with_stroke(Rgba::WHITE, 1.0);
        let mark = |d: &DataPoint, i: usize| -> Result<Mark> {
            let center = Point::new(x.scale(d.number(&options.x_field, i)?), y.scale(d.number(&options.y_field, i)?));
            Ok(Mark::new(
                Shape::Circle {
                    center,
                    radius: r.scale(d.number(&options.radius_field, i)?).max(0.0),
                },
                style,
            ))
        };
        let (live, stats) = join_layer(&mut self.bubbles, &sorted, &key_field, mark, self.base.surface_mut(), transition)?;

        let key = self.base.key_for_render(options.highlight_key.as_ref(), key_field.clone());
        let result = self.base.finish("bubble", live, stats, key.as_ref())?;
        self.last = Some((sorted, options));
        Ok(result)
    }
}

impl<B: Surface + TooltipHost> Renderable for BubbleChart<B> {
    type Options = BubbleOptions;

    fn render(&mut self, data: &ChartData, options: &BubbleOptions) -> Result<RenderResult> {
        let points: Dataset = data.points().cloned().collect();
        self.draw(points, options.clone(), None)
    }
}

delegate_interactive!(BubbleChart);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Key;
    use approx::assert_relative_eq;

    fn bubble(k: &str, x: f32, y: f32, r: f32) -> DataPoint {
        DataPoint::new().with("k", k).with("x", x).with("y", y).with("r", r)
    }

    fn city_data() -> ChartData {
        ChartData::from(vec![
            bubble("Leith", 1.0, 1.0, 10.0),
            bubble("Perth", 2.0, 3.0, 40.0),
            bubble("Ayr", 3.0, 2.0, 20.0),
        ])
    }

    fn radius_of(chart: &BubbleChart, k: &str) -> f32 {
        chart
            .surface()
            .element("bubbles", &Key::single(k))
            .and_then(|e| e.mark.circle())
            .map(|c| c.1)
            .expect("bubble should exist")
    }

    #[test]
    fn test_drawn_largest_first() {
        let mut chart = BubbleChart::new(Canvas::new(400.0, 300.0));
        chart.render(&city_data(), &BubbleOptions::default()).expect("operation should succeed");
        assert_eq!(
            chart.surface().keys("bubbles"),
            vec![Key::single("Perth"), Key::single("Ayr"), Key::single("Leith")]
        );
    }

    #[test]
    fn test_default_radius_range() {
        // chart area 310 x 200, three bubbles: max = 200/3, min = max/3, capped by data max 40
        let mut chart = BubbleChart::new(Canvas::new(400.0, 300.0));
        chart.render(&city_data(), &BubbleOptions::default()).expect("operation should succeed");
        let min_r = 200.0 / 9.0;
        assert_relative_eq!(radius_of(&chart, "Perth"), 40.0, epsilon = 1e-3);
        // domain [0, 40] onto [min_r, 40]
        assert_relative_eq!(radius_of(&chart, "Leith"), min_r + (40.0 - min_r) * 0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_explicit_radius_bounds() {
        let mut chart = BubbleChart::new(Canvas::new(400.0, 300.0));
        let options = BubbleOptions {
            max_radius: Some(20.0),
            min_radius: Some(0.0),
            ..BubbleOptions::default()
        };
        chart.render(&city_data(), &options).expect("operation should succeed");
        assert_relative_eq!(radius_of(&chart, "Perth"), 20.0, epsilon = 1e-3);
        assert_relative_eq!(radius_of(&chart, "Ayr"), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn test_negative_radius_option_rejected() {
        let mut chart = BubbleChart::new(Canvas::default());
        let options = BubbleOptions {
            min_radius: Some(-1.0),
            ..BubbleOptions::default()
        };
        assert!(matches!(
            chart.render(&city_data(), &options),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_missing_radius_field() {
        let mut chart = BubbleChart::new(Canvas::default());
        let data = ChartData::from(vec![bubble("a", 1.0, 1.0, 1.0), DataPoint::new().with("k", "b").with("x", 1.0f32).with("y", 2.0f32)]);
        let err = chart.render(&data, &BubbleOptions::default()).expect_err("render should fail");
        assert!(matches!(err, Error::Schema { ref field, index: 1 } if field == "r"));
        assert!(chart.surface().keys("bubbles").is_empty());
    }

    #[test]
    fn test_rerender_keeps_creation_order() {
        let mut chart = BubbleChart::new(Canvas::new(400.0, 300.0));
        chart.render(&city_data(), &BubbleOptions::default()).expect("operation should succeed");
        let grown = ChartData::from(vec![
            bubble("Leith", 1.0, 1.0, 80.0),
            bubble("Perth", 2.0, 3.0, 40.0),
            bubble("Ayr", 3.0, 2.0, 20.0),
        ]);
        let result = chart.render(&grown, &BubbleOptions::default()).expect("operation should succeed");
        assert_eq!(result.stats.updated, 3);
        assert_eq!(chart.surface().keys("bubbles")[0], Key::single("Perth"));
    }
}
