//! Radial hierarchy (sunburst) layout and view.

mod engine;
mod hierarchy;
mod layout;
mod zoom;

pub use engine::{RadialConfig, RadialEngine, RadialOptions, SwapListener, BURST, CENTER, EXTEND_DURATION, NODE_ID};
pub use hierarchy::{Hierarchy, HierarchyNode};
pub use layout::{partition, Layout, LayoutNode, RING_GAP};
pub use zoom::{ZoomExtent, ZoomOutcome, ZoomState, ZoomTransform};
