//! Geometric primitives for chart layout.
//!
//! Angles follow the usual chart convention: radians, zero at twelve o'clock,
//! increasing clockwise, with the y axis pointing down.

use std::f32::consts::{FRAC_PI_2, TAU};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Origin point (0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point at `radius` from the origin along `angle` (zero at twelve o'clock, clockwise).
    #[must_use]
    pub fn polar(angle: f32, radius: f32) -> Self {
        let a = angle - FRAC_PI_2;
        Self::new(a.cos() * radius, a.sin() * radius)
    }

    /// Calculate the distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Offset by another point.
    #[must_use]
    pub fn offset(self, by: Self) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }
}

/// A rectangle defined by position and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// X coordinate of the top-left corner.
    pub x: f32,
    /// Y coordinate of the top-left corner.
    pub y: f32,
    /// Width of the rectangle.
    pub width: f32,
    /// Height of the rectangle.
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Check if a point is inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Get the center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// An annular sector: the angular span of a pie slice or sunburst band.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcSpan {
    /// Start angle in radians.
    pub start_angle: f32,
    /// End angle in radians.
    pub end_angle: f32,
    /// Inner radius (0 for a solid slice).
    pub inner_radius: f32,
    /// Outer radius.
    pub outer_radius: f32,
}

impl ArcSpan {
    /// Create a new arc span.
    #[must_use]
    pub const fn new(start_angle: f32, end_angle: f32, inner_radius: f32, outer_radius: f32) -> Self {
        Self {
            start_angle,
            end_angle,
            inner_radius,
            outer_radius,
        }
    }

    /// Angular extent in radians.
    #[must_use]
    pub fn sweep(&self) -> f32 {
        self.end_angle - self.start_angle
    }

    /// Fraction of a full turn covered by this span.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.sweep() / TAU
    }

    /// Midpoint of the span, halfway along both the angle and the radius.
    #[must_use]
    pub fn centroid(&self) -> Point {
        let r = (self.inner_radius + self.outer_radius) / 2.0;
        let a = (self.start_angle + self.end_angle) / 2.0;
        Point::polar(a, r)
    }

    /// Same span with a different outer radius.
    #[must_use]
    pub fn with_outer_radius(self, outer_radius: f32) -> Self {
        Self {
            outer_radius,
            ..self
        }
    }
}

/// Viewport transform applied to a whole layer: translate, then rotate, then scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Translation in pixels.
    pub translate: Point,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Uniform scale factor.
    pub scale: f32,
}

impl ViewTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translate: Point::ORIGIN,
        rotation: 0.0,
        scale: 1.0,
    };

    /// Create a transform.
    #[must_use]
    pub const fn new(translate: Point, rotation: f32, scale: f32) -> Self {
        Self {
            translate,
            rotation,
            scale,
        }
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert!((p1.distance(p2) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_polar_zero_is_up() {
        let p = Point::polar(0.0, 10.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, -10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_polar_quarter_turn_is_right() {
        let p = Point::polar(FRAC_PI_2, 5.0);
        assert_relative_eq!(p.x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Point::new(5.0, 5.0)));
        assert!(!rect.contains(Point::new(15.0, 5.0)));
        assert_eq!(rect.center(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_arc_centroid_half_turn() {
        let arc = ArcSpan::new(0.0, PI, 10.0, 20.0);
        let c = arc.centroid();
        assert_relative_eq!(c.x, 15.0, epsilon = 1e-4);
        assert_relative_eq!(c.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(arc.fraction(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_arc_with_outer_radius_keeps_angles() {
        let arc = ArcSpan::new(0.5, 1.0, 2.0, 3.0).with_outer_radius(4.0);
        assert_eq!(arc.start_angle, 0.5);
        assert_eq!(arc.end_angle, 1.0);
        assert_eq!(arc.outer_radius, 4.0);
    }

    #[test]
    fn test_view_transform_default_is_identity() {
        assert_eq!(ViewTransform::default(), ViewTransform::IDENTITY);
    }
}
