//! Phase classification for selection-relative tree walks.
//!
//! A rewrite visits nodes in one left-to-right depth-first pass and needs to
//! know, per node, where it stands relative to the selection: before it,
//! on its first boundary, inside it, on its last, or past it. The tracker is
//! a tiny state machine scoped to a single rewrite call; classifications
//! never regress within one pass.

use crate::dom::{DocTree, NodeId};

use super::range::EditRange;

/// Position of a visited node relative to the selection boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the selection start.
    Pre,
    /// The node carrying the selection start.
    First,
    /// Strictly between the boundaries.
    During,
    /// Start and end share this node.
    Both,
    /// The node carrying the selection end.
    Last,
    /// Past the selection end.
    Post,
}

impl Phase {
    /// Whether any part of the selection touches a node in this phase.
    pub fn selected(self) -> bool {
        !matches!(self, Phase::Pre | Phase::Post)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Before,
    Inside,
    After,
}

/// Single-pass boundary tracker. Construct one per rewrite call, feed it
/// every candidate node in traversal order.
#[derive(Debug)]
pub struct PhaseTracker {
    start_target: NodeId,
    end_target: NodeId,
    zone: Zone,
}

impl PhaseTracker {
    /// Track the selection's leaf containers directly. Used by the style
    /// reformatter, which classifies text and custom leaves.
    pub fn inline(range: &EditRange) -> Self {
        Self {
            start_target: range.start.node,
            end_target: range.end.node,
            zone: Zone::Before,
        }
    }

    /// Track the nearest block ancestors of the boundaries. Used by the
    /// block reformatter, which classifies one node per content line. A
    /// boundary leaf sitting outside any block (bare text under the editor
    /// root) is its own target.
    pub fn blocks(tree: &DocTree, range: &EditRange) -> Self {
        Self {
            start_target: block_target(tree, range.start.node),
            end_target: block_target(tree, range.end.node),
            zone: Zone::Before,
        }
    }

    /// Classify the next visited node. Monotonic: once the walk has passed a
    /// boundary the tracker never reports an earlier phase.
    pub fn classify(&mut self, node: NodeId) -> Phase {
        let hits_start = node == self.start_target;
        let hits_end = node == self.end_target;
        match self.zone {
            Zone::Before => {
                if hits_start && hits_end {
                    self.zone = Zone::After;
                    Phase::Both
                } else if hits_start {
                    self.zone = Zone::Inside;
                    Phase::First
                } else {
                    Phase::Pre
                }
            }
            Zone::Inside => {
                if hits_end {
                    self.zone = Zone::After;
                    Phase::Last
                } else {
                    Phase::During
                }
            }
            Zone::After => Phase::Post,
        }
    }
}

fn block_target(tree: &DocTree, leaf: NodeId) -> NodeId {
    let block = tree.nearest_block_ancestor(leaf);
    if block == tree.root() { leaf } else { block }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::range::HostSelection;
    use crate::markup::{parse_fragment, CustomTags};
    use pretty_assertions::assert_eq;

    fn text_leaves(tree: &DocTree) -> Vec<NodeId> {
        tree.descendants(tree.root())
            .into_iter()
            .filter(|&n| tree.is_text(n))
            .collect()
    }

    #[test]
    fn inline_walk_phases_across_leaves() {
        let tree =
            parse_fragment("<p>aa</p><p>bb</p><p>cc</p><p>dd</p><p>ee</p>", &CustomTags::standard())
                .unwrap();
        let leaves = text_leaves(&tree);
        let range = EditRange::from_selection(
            &tree,
            &HostSelection::new((leaves[1], 0), (leaves[3], 2)),
        )
        .unwrap();

        let mut tracker = PhaseTracker::inline(&range);
        let phases: Vec<Phase> = leaves.iter().map(|&leaf| tracker.classify(leaf)).collect();

        assert_eq!(
            phases,
            vec![Phase::Pre, Phase::First, Phase::During, Phase::Last, Phase::Post]
        );
    }

    #[test]
    fn shared_container_reports_both() {
        let tree = parse_fragment("<p>aa</p><p>bb</p>", &CustomTags::standard()).unwrap();
        let leaves = text_leaves(&tree);
        let range = EditRange::from_selection(
            &tree,
            &HostSelection::new((leaves[0], 0), (leaves[0], 2)),
        )
        .unwrap();

        let mut tracker = PhaseTracker::inline(&range);
        assert_eq!(tracker.classify(leaves[0]), Phase::Both);
        assert_eq!(tracker.classify(leaves[1]), Phase::Post);
    }

    #[test]
    fn block_mode_targets_covering_blocks() {
        let tree = parse_fragment(
            "<p>aa</p><ul><li>bb</li><li>cc</li></ul><p>dd</p>",
            &CustomTags::standard(),
        )
        .unwrap();
        let leaves = text_leaves(&tree);
        let range = EditRange::from_selection(
            &tree,
            &HostSelection::new((leaves[1], 1), (leaves[2], 1)),
        )
        .unwrap();

        let blocks: Vec<NodeId> = leaves.iter().map(|&l| tree.nearest_block_ancestor(l)).collect();
        let mut tracker = PhaseTracker::blocks(&tree, &range);
        let phases: Vec<Phase> = blocks.iter().map(|&b| tracker.classify(b)).collect();

        assert_eq!(
            phases,
            vec![Phase::Pre, Phase::First, Phase::Last, Phase::Post]
        );
    }

    #[test]
    fn phases_never_regress() {
        let tree = parse_fragment("<p>aa</p><p>bb</p>", &CustomTags::standard()).unwrap();
        let leaves = text_leaves(&tree);
        let range = EditRange::from_selection(
            &tree,
            &HostSelection::new((leaves[0], 0), (leaves[1], 1)),
        )
        .unwrap();

        let mut tracker = PhaseTracker::inline(&range);
        assert_eq!(tracker.classify(leaves[0]), Phase::First);
        // Re-presenting the start container after the walk moved on must not
        // rewind the state machine.
        assert_eq!(tracker.classify(leaves[0]), Phase::During);
        assert_eq!(tracker.classify(leaves[1]), Phase::Last);
        assert_eq!(tracker.classify(leaves[1]), Phase::Post);
    }
}
