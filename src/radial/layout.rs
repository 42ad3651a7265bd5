//! Radial partition layout.
//!
//! The root owns the full turn. Each child takes a share of its parent's
//! angle proportional to its sum, in input order. Depth `d` occupies the ring
//! `[d * t, (d + 1) * t]` where `t = radius / (height + 1)`.

use super::hierarchy::HierarchyNode;
use crate::data::{DataPoint, Key, Value};
use crate::geometry::ArcSpan;
use std::f32::consts::TAU;

/// Gap between a ring and the one inside it, in pixels.
pub const RING_GAP: f32 = 0.1;

/// One positioned node.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    /// Keys from the root down to this node.
    pub path: Key,
    /// Distance from the root.
    pub depth: usize,
    /// Angular and radial extent, before the ring gap.
    pub span: ArcSpan,
    /// Sum of leaf values under the node.
    pub value: f32,
    /// True for leaves.
    pub is_leaf: bool,
    /// Node attributes as a data point, see [`HierarchyNode::datum`].
    pub datum: DataPoint,
    /// Index of the depth-1 ancestor (the node itself at depth 1).
    pub branch: Option<usize>,
    /// Extension attribute of the node.
    pub extend_attr: Option<String>,
}

impl LayoutNode {
    /// Span as drawn: the inner radius pushed out by [`RING_GAP`].
    #[must_use]
    pub fn drawn_span(&self) -> ArcSpan {
        ArcSpan {
            inner_radius: self.span.inner_radius + RING_GAP,
            ..self.span
        }
    }
}

/// Result of [`partition`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    /// Nodes in pre-order; index 0 is the root.
    pub nodes: Vec<LayoutNode>,
    /// Outer radius of the deepest ring.
    pub radius: f32,
    /// Tree height in edges.
    pub height: usize,
}

impl Layout {
    /// Thickness of one ring.
    #[must_use]
    pub fn ring(&self) -> f32 {
        self.radius / (self.height + 1) as f32
    }

    /// Leaves in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.iter().filter(|n| n.is_leaf)
    }
}

/// Partition a validated tree into rings of total radius `radius`.
#[must_use]
pub fn partition(root: &HierarchyNode, radius: f32) -> Layout {
    let height = root.height();
    let ring = radius / (height + 1) as f32;
    let mut nodes = Vec::with_capacity(root.len());
    place(root, &mut Vec::new(), 0, (0.0, TAU), ring, None, &mut nodes);
    Layout { nodes, radius, height }
}

fn place(
    node: &HierarchyNode,
    path: &mut Vec<Value>,
    depth: usize,
    (start, end): (f32, f32),
    ring: f32,
    branch: Option<usize>,
    out: &mut Vec<LayoutNode>,
) {
    path.push(Value::from(node.key.as_str()));
    let index = out.len();
    let branch = if depth == 1 { Some(index) } else { branch };
    let value = node.sum();
    out.push(LayoutNode {
        path: Key::new(path.clone()),
        depth,
        span: ArcSpan::new(start, end, depth as f32 * ring, (depth + 1) as f32 * ring),
        value,
        is_leaf: node.is_leaf(),
        datum: node.datum(),
        branch,
        extend_attr: node.extend_attr.clone(),
    });

    let per_unit = if value > 0.0 { (end - start) / value } else { 0.0 };
    let last = node.children.len().saturating_sub(1);
    let mut angle = start;
    for (i, child) in node.children.iter().enumerate() {
        // the last child ends exactly on the parent's end angle
        let child_end = if i == last && value > 0.0 {
            end
        } else {
            angle + child.sum() * per_unit
        };
        place(child, path, depth + 1, (angle, child_end), ring, branch, out);
        angle = child_end;
    }
    path.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tree() -> HierarchyNode {
        HierarchyNode::internal(
            "root",
            vec![
                HierarchyNode::internal("a", vec![HierarchyNode::leaf("a1", 1.0), HierarchyNode::leaf("a2", 2.0)]),
                HierarchyNode::leaf("b", 1.0),
            ],
        )
    }

    #[test]
    fn test_root_owns_full_turn() {
        let layout = partition(&tree(), 90.0);
        let root = &layout.nodes[0];
        assert_relative_eq!(root.span.start_angle, 0.0);
        assert_relative_eq!(root.span.end_angle, TAU);
        assert_eq!(root.depth, 0);
        assert_eq!(layout.height, 2);
        assert_relative_eq!(layout.ring(), 30.0);
    }

    #[test]
    fn test_children_in_input_order() {
        let layout = partition(&tree(), 90.0);
        let names: Vec<_> = layout.nodes.iter().map(|n| n.path.to_string()).collect();
        assert_eq!(names.len(), 5);
        let a = &layout.nodes[1];
        let b = &layout.nodes[4];
        assert_relative_eq!(a.span.end_angle, TAU * 0.75, epsilon = 1e-5);
        assert_relative_eq!(b.span.start_angle, a.span.end_angle);
        assert_relative_eq!(b.span.end_angle, TAU);
    }

    #[test]
    fn test_ring_radii() {
        let layout = partition(&tree(), 90.0);
        let a1 = &layout.nodes[2];
        assert_eq!(a1.depth, 2);
        assert_relative_eq!(a1.span.inner_radius, 60.0);
        assert_relative_eq!(a1.span.outer_radius, 90.0);
        assert_relative_eq!(a1.drawn_span().inner_radius, 60.1);
    }

    #[test]
    fn test_branch_index() {
        let layout = partition(&tree(), 90.0);
        assert_eq!(layout.nodes[0].branch, None);
        assert_eq!(layout.nodes[1].branch, Some(1));
        assert_eq!(layout.nodes[3].branch, Some(1));
        assert_eq!(layout.nodes[4].branch, Some(4));
    }

    #[test]
    fn test_path_keys_are_unique() {
        let root = HierarchyNode::internal(
            "r",
            vec![
                HierarchyNode::internal("2019", vec![HierarchyNode::leaf("Jan", 1.0)]),
                HierarchyNode::internal("2020", vec![HierarchyNode::leaf("Jan", 1.0)]),
            ],
        );
        let layout = partition(&root, 10.0);
        assert_ne!(layout.nodes[2].path, layout.nodes[4].path);
        assert_eq!(layout.nodes[2].datum.text("k"), layout.nodes[4].datum.text("k"));
    }

    #[test]
    fn test_zero_sum_subtree_has_no_width() {
        let root = HierarchyNode::internal(
            "r",
            vec![
                HierarchyNode::internal("empty", vec![HierarchyNode::leaf("z", 0.0)]),
                HierarchyNode::leaf("full", 2.0),
            ],
        );
        let layout = partition(&root, 10.0);
        assert_relative_eq!(layout.nodes[1].span.sweep(), 0.0);
        assert_relative_eq!(layout.nodes[2].span.sweep(), 0.0);
        assert_relative_eq!(layout.nodes[3].span.sweep(), TAU);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_tree() -> impl Strategy<Value = HierarchyNode> {
        let leaf = (0.1f32..100.0).prop_map(|v| HierarchyNode::leaf("leaf", v));
        leaf.prop_recursive(3, 40, 5, |inner| {
            prop::collection::vec(inner, 1..5).prop_map(|children| {
                let children = children
                    .into_iter()
                    .enumerate()
                    .map(|(i, mut c)| {
                        c.key = format!("n{i}");
                        c
                    })
                    .collect();
                HierarchyNode::internal("node", children)
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_span_matches_value_share(root in arb_tree()) {
            let total = root.sum();
            let layout = partition(&root, 100.0);
            for node in &layout.nodes {
                let expected = node.value / total * TAU;
                prop_assert!((node.span.sweep() - expected).abs() < 1e-3);
            }
        }

        #[test]
        fn prop_children_tile_parent(root in arb_tree()) {
            let layout = partition(&root, 100.0);
            for (i, parent) in layout.nodes.iter().enumerate() {
                if parent.is_leaf {
                    continue;
                }
                let children: Vec<_> = layout.nodes[i + 1..]
                    .iter()
                    .take_while(|n| n.depth > parent.depth)
                    .filter(|n| n.depth == parent.depth + 1)
                    .collect();
                let sweep: f32 = children.iter().map(|c| c.span.sweep()).sum();
                prop_assert!((sweep - parent.span.sweep()).abs() < 1e-3);
                prop_assert!((children[0].span.start_angle - parent.span.start_angle).abs() < 1e-5);
            }
        }
    }
}
