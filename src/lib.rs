//! # chartlink
//!
//! Coordination layer for linked, interactive chart views.
//!
//! chartlink does not rasterize. Each view turns a dataset into keyed target
//! geometry and hands it to a drawing collaborator ([`surface::Surface`])
//! through enter/update/exit calls, so the host keeps control of pixels and
//! animation. What the crate owns is everything between the data and those
//! calls:
//!
//! - scales and domain policy (`include_zero`, padding, nice rounding),
//! - keyed element lifecycle, so re-renders update instead of rebuilding,
//! - tooltips, pointer callbacks and highlight emphasis per view,
//! - cross-view highlight fan-out, including composite keys,
//! - drill-down navigation between aggregation levels,
//! - a radial hierarchy (sunburst) engine with zoom, leaf extension and
//!   reversible dataset swap.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartlink::prelude::*;
//!
//! let data: Vec<DataPoint> = [("Jan", 10.0f32), ("Feb", 20.0)]
//!     .into_iter()
//!     .map(|(k, v)| DataPoint::new().with("k", k).with("v", v))
//!     .collect();
//!
//! let mut bars = BarChart::new(Canvas::default());
//! let result = bars.render(&ChartData::from(data), &BarOptions::default())?;
//! assert_eq!(result.live.len(), 2);
//!
//! bars.highlight(&[Key::single("Feb")]);
//! assert_eq!(bars.surface().emphasized("bars"), vec![Key::single("Feb")]);
//! # Ok::<(), chartlink::Error>(())
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and never
//! installs a logger.

#![warn(missing_docs)]
// Allow unwrap() in tests only
#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow common patterns in graphics/visualization code
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Core Modules
// ============================================================================

/// Colors and categorical palettes.
pub mod color;

/// Geometric primitives (points, rectangles, arcs, view transforms).
pub mod geometry;

/// Data points, datasets, series and element keys.
pub mod data;

/// Scale functions for data-to-visual mappings.
pub mod scale;

// ============================================================================
// Element Lifecycle and Interaction
// ============================================================================

/// Drawing and tooltip collaborator interfaces, plus the in-memory scene.
pub mod surface;

/// Keyed enter/update/exit reconciliation.
pub mod binder;

/// Tooltip instance management.
pub mod tooltip;

/// Pointer callbacks and highlight emphasis.
pub mod interaction;

// ============================================================================
// Views
// ============================================================================

/// Chart base, capability traits and chart variants.
pub mod chart;

/// Radial hierarchy layout and sunburst view.
pub mod radial;

/// Drill-down navigation.
pub mod drill;

/// Cross-view highlight fan-out.
pub mod coordinator;

// ============================================================================
// Configuration and Errors
// ============================================================================

/// YAML configuration of chart defaults.
pub mod config;

/// Error types for chartlink operations.
pub mod error;

pub use error::{Error, Result};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types and traits for convenient imports.
///
/// ```rust
/// use chartlink::prelude::*;
/// ```
pub mod prelude {
    pub use crate::binder::{ElementBinder, JoinStats, LiveElements};
    pub use crate::chart::{
        dispatch, BarChart, BarOptions, BubbleChart, BubbleOptions, Canvas, Interactive, LineChart, LineOptions,
        MapChart, MapOptions, Margin, PieChart, PieOptions, RenderResult, Renderable, ScatterChart, ScatterOptions,
        Tooltippable,
    };
    pub use crate::color::{Palette, Rgba};
    pub use crate::config::Config;
    pub use crate::coordinator::{broadcast, clear, HighlightKey, Target};
    pub use crate::data::{ChartData, DataPoint, Dataset, Key, KeyField, Series, Value};
    pub use crate::drill::{DrillController, DrillSource, LevelId, LevelSpec, ViewState};
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{ArcSpan, Point, Rect, ViewTransform};
    pub use crate::interaction::{Handlers, PointerEvent};
    pub use crate::radial::{Hierarchy, HierarchyNode, RadialConfig, RadialEngine, RadialOptions, ZoomTransform};
    pub use crate::scale::{AxisOptions, BandScale, LinearScale, OrdinalScale, Scale};
    pub use crate::surface::{Scene, Surface, TooltipHost};
    pub use crate::tooltip::accessor;
}
