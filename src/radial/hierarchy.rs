//! Hierarchical input for the radial engine.

use crate::data::{DataPoint, Dataset, Value};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A node of a value tree.
///
/// Exactly one of `value` (a leaf) or a non-empty `children` list (an
/// internal node) must be present. An internal node's size is the sum of its
/// leaves.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HierarchyNode {
    /// Node name, unique among siblings.
    pub key: String,
    /// Leaf size.
    pub value: Option<f32>,
    /// Child nodes in display order.
    pub children: Vec<HierarchyNode>,
    /// Extra attributes, used for colouring and highlight matching.
    pub attrs: BTreeMap<String, Value>,
    /// Attribute naming which leaves to extend when this node is highlighted.
    pub extend_attr: Option<String>,
}

impl HierarchyNode {
    /// A leaf of size `value`.
    #[must_use]
    pub fn leaf(key: impl Into<String>, value: f32) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            ..Self::default()
        }
    }

    /// An internal node.
    #[must_use]
    pub fn internal(key: impl Into<String>, children: Vec<HierarchyNode>) -> Self {
        Self {
            key: key.into(),
            children,
            ..Self::default()
        }
    }

    /// Set an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the extension attribute.
    #[must_use]
    pub fn with_extend_attr(mut self, attr: impl Into<String>) -> Self {
        self.extend_attr = Some(attr.into());
        self
    }

    /// True for leaves.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Check the leaf/internal invariant for the whole subtree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedTree`] naming the first offending node: one
    /// with both or neither of a value and children, or with a negative or
    /// non-finite value.
    pub fn validate(&self) -> Result<()> {
        let malformed = || Error::MalformedTree { key: self.key.clone() };
        match (self.value, self.children.is_empty()) {
            (Some(v), true) if v.is_finite() && v >= 0.0 => Ok(()),
            (None, false) => self.children.iter().try_for_each(HierarchyNode::validate),
            _ => Err(malformed()),
        }
    }

    /// Sum of leaf values under this node.
    #[must_use]
    pub fn sum(&self) -> f32 {
        match self.value {
            Some(v) if self.children.is_empty() => v,
            _ => self.children.iter().map(HierarchyNode::sum).sum(),
        }
    }

    /// Longest path from this node to a leaf, in edges.
    #[must_use]
    pub fn height(&self) -> usize {
        self.children.iter().map(|c| c.height() + 1).max().unwrap_or(0)
    }

    /// Number of nodes in the subtree.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::len).sum::<usize>()
    }

    /// Always false: a node counts itself.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The node as a data point: attributes plus `k` (key) and `v` (sum).
    #[must_use]
    pub fn datum(&self) -> DataPoint {
        let mut d = DataPoint::new();
        for (name, value) in &self.attrs {
            d.insert(name.as_str(), value.clone());
        }
        d.insert("k", self.key.as_str());
        d.insert("v", self.sum());
        d
    }
}

/// A tree plus an optional flat dataset drawn as a pie in the middle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hierarchy {
    /// Root node. Drawn as the hidden centre ring.
    pub root: HierarchyNode,
    /// Centre pie data: `k` names a slice, `v` sizes it.
    pub center: Option<Dataset>,
}

impl Hierarchy {
    /// A hierarchy without centre data.
    #[must_use]
    pub fn new(root: HierarchyNode) -> Self {
        Self { root, center: None }
    }

    /// Attach centre pie data.
    #[must_use]
    pub fn with_center(mut self, center: Dataset) -> Self {
        self.center = Some(center);
        self
    }
}
