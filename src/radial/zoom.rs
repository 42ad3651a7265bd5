//! Zoom and pan state.
//!
//! A pan or a zoom gesture that keeps the scale factor only moves the
//! viewport. A change of scale factor is reported as a relayout so the owner
//! can recompute geometry that depends on `k` (stroke widths, point radii).

use crate::error::{Error, Result};
use crate::geometry::{Point, ViewTransform};
use serde::{Deserialize, Serialize};

/// Allowed range of the zoom scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomExtent {
    /// Smallest scale factor.
    pub min: f32,
    /// Largest scale factor.
    pub max: f32,
}

impl Default for ZoomExtent {
    fn default() -> Self {
        Self { min: 1.0, max: 8.0 }
    }
}

impl ZoomExtent {
    /// Create an extent.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Reject extents that are empty or not positive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] unless `0 < min <= max`.
    pub fn validate(&self) -> Result<()> {
        if !(self.min > 0.0) || !(self.max >= self.min) {
            return Err(Error::config(
                "zoom_extent",
                format!("[{}, {}] is not a positive range", self.min, self.max),
            ));
        }
        Ok(())
    }

    /// Clamp a scale factor into the extent.
    #[must_use]
    pub fn clamp(&self, k: f32) -> f32 {
        if k.is_nan() {
            return self.min;
        }
        k.clamp(self.min, self.max)
    }
}

/// A zoom gesture result: pan offset plus scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    /// Horizontal pan.
    pub x: f32,
    /// Vertical pan.
    pub y: f32,
    /// Scale factor.
    pub k: f32,
}

impl ZoomTransform {
    /// No pan, no zoom.
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, k: 1.0 };

    /// Create a transform.
    #[must_use]
    pub const fn new(x: f32, y: f32, k: f32) -> Self {
        Self { x, y, k }
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// What a zoom event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomOutcome {
    /// Only the viewport transform changed.
    Transformed(ViewTransform),
    /// The scale factor changed and geometry was recomputed.
    Relayout(ViewTransform),
}

impl ZoomOutcome {
    /// The viewport transform applied.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        match self {
            Self::Transformed(t) | Self::Relayout(t) => *t,
        }
    }

    /// True if geometry was recomputed.
    #[must_use]
    pub fn is_relayout(&self) -> bool {
        matches!(self, Self::Relayout(_))
    }
}

/// Zoom state of one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomState {
    extent: ZoomExtent,
    width: f32,
    height: f32,
    current: ZoomTransform,
    layout_scale: f32,
    relayouts: usize,
}

impl ZoomState {
    /// Zoom state for a `width` x `height` viewport with the default `[1, 8]` extent.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            extent: ZoomExtent::default(),
            width,
            height,
            current: ZoomTransform::IDENTITY,
            layout_scale: 1.0,
            relayouts: 0,
        }
    }

    /// Zoom state with a custom extent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid extent.
    pub fn with_extent(extent: ZoomExtent, width: f32, height: f32) -> Result<Self> {
        extent.validate()?;
        let k = extent.clamp(1.0);
        Ok(Self {
            extent,
            current: ZoomTransform::new(0.0, 0.0, k),
            layout_scale: k,
            ..Self::new(width, height)
        })
    }

    /// Apply a requested transform, clamping scale to the extent and pan so
    /// the viewport stays inside the canvas. Returns whether the scale factor
    /// changed since the last layout.
    pub fn apply(&mut self, requested: ZoomTransform) -> bool {
        let k = self.extent.clamp(requested.k);
        let clamp_pan = |v: f32, size: f32| {
            let lo = size - size * k;
            if v.is_nan() {
                0.0
            } else {
                v.clamp(lo.min(0.0), 0.0)
            }
        };
        self.current = ZoomTransform::new(clamp_pan(requested.x, self.width), clamp_pan(requested.y, self.height), k);
        #[allow(clippy::float_cmp)]
        let changed = k != self.layout_scale;
        if changed {
            self.layout_scale = k;
            self.relayouts += 1;
        }
        changed
    }

    /// Viewport transform that zooms around `anchor`, with an extra rotation in degrees.
    #[must_use]
    pub fn view_transform(&self, anchor: Point, rotation: f32) -> ViewTransform {
        let k = self.current.k;
        ViewTransform::new(
            Point::new(anchor.x * k + self.current.x, anchor.y * k + self.current.y),
            rotation,
            k,
        )
    }

    /// Forget pan and zoom.
    pub fn reset(&mut self) {
        let k = self.extent.clamp(1.0);
        self.current = ZoomTransform::new(0.0, 0.0, k);
        self.layout_scale = k;
    }

    /// Current transform after clamping.
    #[must_use]
    pub fn current(&self) -> ZoomTransform {
        self.current
    }

    /// Scale factor the current geometry was laid out for.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.layout_scale
    }

    /// Stroke width that stays one pixel wide on screen.
    #[must_use]
    pub fn stroke_width(&self) -> f32 {
        1.0 / self.layout_scale
    }

    /// Number of scale changes seen.
    #[must_use]
    pub fn relayouts(&self) -> usize {
        self.relayouts
    }

    /// The allowed scale range.
    #[must_use]
    pub fn extent(&self) -> ZoomExtent {
        self.extent
    }
}
