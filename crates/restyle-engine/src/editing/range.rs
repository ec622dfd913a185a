//! Selection normalization.
//!
//! The host hands the engine a raw anchor/focus pair on every interaction.
//! [`EditRange`] snapshots it into a stable value: boundaries ordered into
//! document order, the collapsed flag, the nearest block ancestor, and the
//! atomic custom leaf containing the start (if any). The range is rebuilt
//! from the live selection per user gesture and discarded after use.

use crate::dom::{DocTree, NodeId};

/// A raw selection as the host reports it: two (container, offset) points.
/// Anchor and focus may be in either document order; boundaries must be
/// text or atomic custom leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSelection {
    pub anchor: (NodeId, usize),
    pub focus: (NodeId, usize),
}

impl HostSelection {
    pub fn new(anchor: (NodeId, usize), focus: (NodeId, usize)) -> Self {
        Self { anchor, focus }
    }

    /// A collapsed selection at one point.
    pub fn caret(node: NodeId, offset: usize) -> Self {
        Self {
            anchor: (node, offset),
            focus: (node, offset),
        }
    }

    pub fn is_caret(&self) -> bool {
        self.anchor == self.focus
    }
}

/// One normalized selection boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

/// Normalized snapshot of the host selection plus editor-derived metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRange {
    /// First boundary in document order.
    pub start: Boundary,
    /// Last boundary in document order.
    pub end: Boundary,
    pub collapsed: bool,
    /// Deepest node containing both boundaries.
    pub common_ancestor: NodeId,
    /// Nearest Block ancestor of the common ancestor (the editor root when
    /// the selection sits outside any block).
    pub block_parent: NodeId,
    /// The atomic custom leaf containing the selection start, if any.
    pub custom_anchor: Option<NodeId>,
}

impl EditRange {
    /// Build a range from the live host selection.
    ///
    /// Returns `None` when either boundary is not a text/custom leaf, is
    /// detached, or carries an out-of-bounds offset — the precondition
    /// failures that abort an operation before it touches the tree.
    pub fn from_selection(tree: &DocTree, selection: &HostSelection) -> Option<Self> {
        let a = Boundary {
            node: selection.anchor.0,
            offset: selection.anchor.1,
        };
        let b = Boundary {
            node: selection.focus.0,
            offset: selection.focus.1,
        };
        for boundary in [&a, &b] {
            if !tree.is_boundary_leaf(boundary.node) || !tree.is_reachable(boundary.node) {
                return None;
            }
            if boundary.offset > boundary_len(tree, boundary.node) {
                return None;
            }
        }

        let (start, end) = order_boundaries(tree, a, b)?;
        let common_ancestor = tree.common_ancestor(start.node, end.node)?;
        let block_parent = tree.nearest_block_ancestor(common_ancestor);
        let custom_anchor = custom_anchor_of(tree, start.node);

        Some(Self {
            collapsed: start == end,
            start,
            end,
            common_ancestor,
            block_parent,
            custom_anchor,
        })
    }

    /// Collapse to a point and rebuild from it.
    pub fn set_cursor(&mut self, tree: &DocTree, node: NodeId, offset: usize) -> bool {
        match Self::from_selection(tree, &HostSelection::caret(node, offset)) {
            Some(range) => {
                *self = range;
                true
            }
            None => false,
        }
    }

    /// Whether any atomic custom leaf intersects [start, end]. The shell
    /// uses this to block destructive operations that would orphan one.
    pub fn contains_atomic_nodes(&self, tree: &DocTree) -> bool {
        let order = tree.descendants(self.common_ancestor);
        let start_at = order.iter().position(|&n| n == self.start.node);
        let end_at = order.iter().position(|&n| n == self.end.node);
        let (Some(start_at), Some(end_at)) = (start_at, end_at) else {
            return false;
        };
        order[start_at..=end_at].iter().any(|&n| tree.is_custom(n))
    }
}

/// Maximum meaningful offset inside a boundary leaf: the text length, or 1
/// for an atomic custom leaf (before/after).
fn boundary_len(tree: &DocTree, node: NodeId) -> usize {
    tree.text(node).map(str::len).unwrap_or(1)
}

fn order_boundaries(tree: &DocTree, a: Boundary, b: Boundary) -> Option<(Boundary, Boundary)> {
    if a.node == b.node {
        return Some(if a.offset <= b.offset { (a, b) } else { (b, a) });
    }
    let path_a = tree.path(a.node)?;
    let path_b = tree.path(b.node)?;
    Some(if path_a <= path_b { (a, b) } else { (b, a) })
}

/// Walk up from `node` looking for an atomic custom element, stopping at the
/// structural boundary (the editor root).
fn custom_anchor_of(tree: &DocTree, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        if tree.is_custom(current) {
            return Some(current);
        }
        if current == tree.root() {
            return None;
        }
        current = tree.parent(current)?;
    }
}
