//! Scale functions for data-to-visual mappings.
//!
//! Domains are computed by one policy shared by every chart: optional fixed
//! bounds replace the data extrema, `include_zero` pulls the minimum down to
//! zero, padding is then applied in data units, and "nice" rounding may only
//! expand the result.

use crate::color::{Palette, Rgba};
use crate::data::Value;
use crate::error::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Trait for scale functions that map domain values to range values.
pub trait Scale<D, R> {
    /// Transform a domain value to a range value.
    fn scale(&self, value: D) -> R;

    /// Get the domain extent.
    fn domain(&self) -> (D, D);

    /// Get the range extent.
    fn range(&self) -> (R, R);
}

// ============================================================================
// Domain policy
// ============================================================================

/// Domain of `values` under the zero/pad policy.
///
/// With `include_zero` the minimum is `min(0, data_min)`. Padding is applied
/// afterwards in data units: `(min - pad.0, max + pad.1)`. An empty slice yields
/// `(0, 0)`; callers guard against the degenerate scale.
#[must_use]
pub fn compute_domain(values: &[f32], include_zero: bool, pad: (f32, f32)) -> (f32, f32) {
    match extent(values) {
        Some((lo, hi)) => apply_policy(lo, hi, include_zero, pad),
        None => (0.0, 0.0),
    }
}

fn extent(values: &[f32]) -> Option<(f32, f32)> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    finite.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn apply_policy(lo: f32, hi: f32, include_zero: bool, pad: (f32, f32)) -> (f32, f32) {
    let lo = if include_zero { lo.min(0.0) } else { lo };
    (lo - pad.0, hi + pad.1)
}

/// A 1-2-5 step close to `raw`.
#[must_use]
pub fn nice_step(raw: f32) -> f32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let power = raw.log10().floor();
    let base = 10f32.powf(power);
    let n = raw / base;
    let nice = if n <= 1.0 {
        1.0
    } else if n <= 2.0 {
        2.0
    } else if n <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * base
}

/// Expand a domain outward to multiples of a nice step for about `count` ticks.
///
/// The result always contains the input domain, so a minimum at or below
/// zero stays at or below zero.
#[must_use]
pub fn nice_domain(domain: (f32, f32), count: usize) -> (f32, f32) {
    let (lo, hi) = domain;
    if !(hi > lo) || count == 0 {
        return domain;
    }
    let step = nice_step((hi - lo) / count as f32);
    let nice_lo = ((lo / step).floor() * step).min(lo);
    let nice_hi = ((hi / step).ceil() * step).max(hi);
    (nice_lo, nice_hi)
}

/// Tick values inside `domain` at a nice step for about `count` ticks.
#[must_use]
pub fn ticks(domain: (f32, f32), count: usize) -> Vec<f32> {
    let (lo, hi) = (domain.0.min(domain.1), domain.0.max(domain.1));
    if !lo.is_finite() || !hi.is_finite() || count == 0 {
        return Vec::new();
    }
    if hi - lo <= 0.0 {
        return vec![lo];
    }
    let step = nice_step((hi - lo) / count as f32);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f32 * step).collect()
}

/// Replace a zero-width domain with a usable one.
///
/// Returns the input unchanged when it already has width. Anything else is
/// widened by one unit either side of its midpoint, so the result is always
/// ascending.
#[must_use]
pub fn widen_degenerate(domain: (f32, f32)) -> (f32, f32) {
    let (lo, hi) = domain;
    if hi > lo {
        return domain;
    }
    if lo == 0.0 && hi == 0.0 {
        return (0.0, 1.0);
    }
    let mid = (lo + hi) / 2.0;
    (mid - 1.0, mid + 1.0)
}

// ============================================================================
// Axis options and scale specs
// ============================================================================

/// Per-axis options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisOptions {
    /// Pull the domain minimum down to zero.
    pub include_zero: bool,
    /// Padding `(low, high)` in data units.
    pub pad: (f32, f32),
    /// Round the domain outward to nice tick boundaries.
    pub nice: bool,
    /// Fixed lower bound replacing the data minimum.
    pub fixed_min: Option<f32>,
    /// Fixed upper bound replacing the data maximum.
    pub fixed_max: Option<f32>,
    /// Tick length in pixels.
    pub tick_size: f32,
    /// Approximate number of ticks.
    pub tick_count: usize,
    /// Axis title. Falls back to the data's title field when absent.
    pub title: Option<String>,
}

impl Default for AxisOptions {
    fn default() -> Self {
        Self {
            include_zero: true,
            pad: (0.0, 0.0),
            nice: true,
            fixed_min: None,
            fixed_max: None,
            tick_size: 6.0,
            tick_count: 10,
            title: None,
        }
    }
}

impl AxisOptions {
    /// Set `include_zero`.
    #[must_use]
    pub fn include_zero(mut self, include_zero: bool) -> Self {
        self.include_zero = include_zero;
        self
    }

    /// Set padding in data units.
    #[must_use]
    pub fn pad(mut self, low: f32, high: f32) -> Self {
        self.pad = (low, high);
        self
    }

    /// Set nice rounding.
    #[must_use]
    pub fn nice(mut self, nice: bool) -> Self {
        self.nice = nice;
        self
    }

    /// Fix the domain bounds. `None` keeps the data extreme.
    #[must_use]
    pub fn fixed(mut self, min: Option<f32>, max: Option<f32>) -> Self {
        self.fixed_min = min;
        self.fixed_max = max;
        self
    }

    /// Set the axis title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Check option ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for non-finite padding, a zero tick count or
    /// inverted fixed bounds.
    pub fn validate(&self) -> Result<()> {
        if !self.pad.0.is_finite() || !self.pad.1.is_finite() {
            return Err(Error::config("pad", "padding must be finite"));
        }
        if self.pad.0 < 0.0 || self.pad.1 < 0.0 {
            return Err(Error::config("pad", "padding must not be negative"));
        }
        if self.tick_count == 0 {
            return Err(Error::config("tick_count", "must be at least 1"));
        }
        if let (Some(lo), Some(hi)) = (self.fixed_min, self.fixed_max) {
            if lo > hi {
                return Err(Error::config("fixed_min", format!("{lo} is above fixed_max {hi}")));
            }
        }
        Ok(())
    }

    /// Domain of `values` under these options, before nice rounding.
    #[must_use]
    pub fn raw_domain(&self, values: &[f32]) -> (f32, f32) {
        let data = extent(values);
        let lo = self.fixed_min.or(data.map(|d| d.0));
        let hi = self.fixed_max.or(data.map(|d| d.1));
        match (lo, hi) {
            (Some(lo), Some(hi)) => apply_policy(lo, hi, self.include_zero, self.pad),
            _ => (0.0, 0.0),
        }
    }
}

/// A resolved continuous scale description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleSpec {
    /// Domain lower bound.
    pub domain_min: f32,
    /// Domain upper bound.
    pub domain_max: f32,
    /// Output range `(a, b)`; `a > b` for an upward y axis.
    pub range: (f32, f32),
    /// Whether zero was forced into the domain.
    pub include_zero: bool,
    /// Padding applied in data units.
    pub pad: (f32, f32),
    /// Whether nice rounding was applied.
    pub nice: bool,
}

impl ScaleSpec {
    /// Resolve a spec for `values` onto `range`.
    #[must_use]
    pub fn from_values(values: &[f32], range: (f32, f32), options: &AxisOptions) -> Self {
        let raw = options.raw_domain(values);
        let (domain_min, domain_max) = if options.nice {
            nice_domain(raw, options.tick_count)
        } else {
            raw
        };
        Self {
            domain_min,
            domain_max,
            range,
            include_zero: options.include_zero,
            pad: options.pad,
            nice: options.nice,
        }
    }

    /// True when the domain has zero width.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.domain_max > self.domain_min)
    }

    /// Build the linear scale.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateScale`] when the domain has zero width.
    pub fn linear(&self) -> Result<LinearScale> {
        LinearScale::new((self.domain_min, self.domain_max), self.range)
    }
}

// ============================================================================
// Linear
// ============================================================================

/// Linear scale for continuous-to-continuous mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_min: f32,
    domain_max: f32,
    range_min: f32,
    range_max: f32,
}

impl LinearScale {
    /// Create a new linear scale.
    ///
    /// # Errors
    ///
    /// Returns an error if domain_min equals domain_max.
    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Result<Self> {
        if (domain.0 - domain.1).abs() < f32::EPSILON || !domain.0.is_finite() || !domain.1.is_finite() {
            return Err(Error::DegenerateScale(format!(
                "domain [{}, {}] has no width",
                domain.0, domain.1
            )));
        }

        Ok(Self {
            domain_min: domain.0,
            domain_max: domain.1,
            range_min: range.0,
            range_max: range.1,
        })
    }

    /// Invert the scale (range to domain).
    #[must_use]
    pub fn invert(&self, value: f32) -> f32 {
        let t = (value - self.range_min) / (self.range_max - self.range_min);
        self.domain_min + t * (self.domain_max - self.domain_min)
    }

    /// Tick values inside the domain.
    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<f32> {
        ticks((self.domain_min, self.domain_max), count)
    }
}

impl Scale<f32, f32> for LinearScale {
    fn scale(&self, value: f32) -> f32 {
        let t = (value - self.domain_min) / (self.domain_max - self.domain_min);
        self.range_min + t * (self.range_max - self.range_min)
    }

    fn domain(&self) -> (f32, f32) {
        (self.domain_min, self.domain_max)
    }

    fn range(&self) -> (f32, f32) {
        (self.range_min, self.range_max)
    }
}

// ============================================================================
// Band
// ============================================================================

/// Categorical position scale: each distinct value gets an equal padded band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: IndexSet<Value>,
    range: (f32, f32),
    padding: f32,
    start: f32,
    step: f32,
    bandwidth: f32,
}

impl BandScale {
    /// Create a band scale. Band order is first-seen order of `domain`.
    ///
    /// `padding` is used for both inner and outer padding, as a fraction of the step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] unless `0 <= padding < 1`.
    pub fn new<I>(domain: I, range: (f32, f32), padding: f32) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        if !(0.0..1.0).contains(&padding) {
            return Err(Error::config("band_padding", format!("{padding} is outside [0, 1)")));
        }
        let domain: IndexSet<Value> = domain.into_iter().collect();
        let n = domain.len() as f32;
        let (r0, r1) = (range.0.min(range.1), range.0.max(range.1));
        let step = (r1 - r0) / (n - padding + padding * 2.0).max(1.0);
        let start = r0 + (r1 - r0 - step * (n - padding)) * 0.5;
        Ok(Self {
            domain,
            range,
            padding,
            start,
            step,
            bandwidth: step * (1.0 - padding),
        })
    }

    /// Start of the band for `value`, or `None` if it is not in the domain.
    #[must_use]
    pub fn position(&self, value: &Value) -> Option<f32> {
        let i = self.domain.get_index_of(value)?;
        let i = if self.range.1 < self.range.0 {
            self.domain.len() - 1 - i
        } else {
            i
        };
        Some(self.start + self.step * i as f32)
    }

    /// Centre of the band for `value`.
    #[must_use]
    pub fn center(&self, value: &Value) -> Option<f32> {
        self.position(value).map(|p| p + self.bandwidth / 2.0)
    }

    /// Width of each band.
    #[must_use]
    pub fn bandwidth(&self) -> f32 {
        self.bandwidth
    }

    /// Distance between the starts of adjacent bands.
    #[must_use]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Padding fraction.
    #[must_use]
    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Distinct domain values in band order.
    pub fn domain(&self) -> impl Iterator<Item = &Value> {
        self.domain.iter()
    }

    /// Output range.
    #[must_use]
    pub fn range(&self) -> (f32, f32) {
        self.range
    }
}

// ============================================================================
// Ordinal
// ============================================================================

/// Categorical color scale: distinct values in first-seen order cycle through a palette.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalScale {
    domain: IndexSet<Value>,
    palette: Palette,
}

impl OrdinalScale {
    /// Create an ordinal scale over `domain`.
    #[must_use]
    pub fn new<I>(domain: I, palette: Palette) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Self {
            domain: domain.into_iter().collect(),
            palette,
        }
    }

    /// Color for `value`, or `None` if it is not in the domain.
    #[must_use]
    pub fn color(&self, value: &Value) -> Option<Rgba> {
        self.domain.get_index_of(value).map(|i| self.palette.color(i))
    }

    /// Distinct domain values in color order.
    pub fn domain(&self) -> impl Iterator<Item = &Value> {
        self.domain.iter()
    }

    /// `(value, color)` pairs in domain order, as shown in a legend.
    #[must_use]
    pub fn entries(&self) -> Vec<(Value, Rgba)> {
        self.domain
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), self.palette.color(i)))
            .collect()
    }
}

// ============================================================================
// Radius
// ============================================================================

/// Radius range for `count` bubbles in a `width` x `height` area.
///
/// The default maximum is `min(width, height) / count` and the default
/// minimum is `max / count`; the maximum is then capped at `data_max`.
#[must_use]
pub fn radius_range(
    width: f32,
    height: f32,
    count: usize,
    data_max: f32,
    max_radius: Option<f32>,
    min_radius: Option<f32>,
) -> (f32, f32) {
    let n = count.max(1) as f32;
    let max_r = max_radius.unwrap_or_else(|| width.min(height) / n);
    let min_r = min_radius.unwrap_or(max_r / n);
    (min_r.max(0.0), max_r.min(data_max))
}
