//! Selection preservation across destructive rewrites.
//!
//! The reformatters rebuild whole subtrees, so the host's selection would
//! dangle without help. Instead of round-tripping sentinel bytes through the
//! text (fragile when content contains the sentinel, or when the bearing
//! node is deleted), the rewrite records explicit (node, offset) coordinates
//! as it emits output. Resolution is checked against the finished tree;
//! a boundary whose bearing leaf did not survive resolves to nothing and the
//! selection degrades to empty — silently, never as an error.

use crate::dom::{DocTree, NodeId};

use super::range::{EditRange, HostSelection};

/// Start/end coordinates carried through one rewrite.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    start: Option<(NodeId, usize)>,
    end: Option<(NodeId, usize)>,
}

impl MarkerSet {
    /// Empty set; the rewriter records boundaries as it emits them.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded from a range whose boundary leaves are moved, not
    /// rebuilt — their ids stay valid through the rewrite.
    pub fn from_range(range: &EditRange) -> Self {
        Self {
            start: Some((range.start.node, range.start.offset)),
            end: Some((range.end.node, range.end.offset)),
        }
    }

    /// Record where the selection start landed. First write wins: a rewrite
    /// emits each boundary run exactly once.
    pub fn record_start(&mut self, node: NodeId, offset: usize) {
        self.start.get_or_insert((node, offset));
    }

    pub fn record_end(&mut self, node: NodeId, offset: usize) {
        self.end = Some((node, offset));
    }

    /// Reconstruct a live selection from the recorded coordinates.
    ///
    /// Both boundaries must exist, still be attached under the root, and
    /// carry an in-bounds offset; otherwise the whole selection is dropped.
    pub fn resolve(&self, tree: &DocTree) -> Option<HostSelection> {
        let (start, end) = (self.start?, self.end?);
        for (node, offset) in [start, end] {
            if !tree.is_reachable(node) || !tree.is_boundary_leaf(node) {
                return None;
            }
            let len = tree.text(node).map(str::len).unwrap_or(1);
            if offset > len {
                return None;
            }
        }
        Some(HostSelection::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{BlockTag, Tag};
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_recorded_coordinates() {
        let mut tree = DocTree::new();
        let p = tree.alloc_element(Tag::Block(BlockTag::P));
        let leaf = tree.alloc_text("world");
        tree.append(p, leaf);
        let root = tree.root();
        tree.append(root, p);

        let mut markers = MarkerSet::new();
        markers.record_start(leaf, 0);
        markers.record_end(leaf, 5);

        assert_eq!(
            markers.resolve(&tree),
            Some(HostSelection::new((leaf, 0), (leaf, 5)))
        );
    }

    #[test]
    fn first_start_write_wins() {
        let mut tree = DocTree::new();
        let leaf = tree.alloc_text("ab");
        let root = tree.root();
        tree.append(root, leaf);

        let mut markers = MarkerSet::new();
        markers.record_start(leaf, 1);
        markers.record_start(leaf, 2);
        markers.record_end(leaf, 2);

        assert_eq!(
            markers.resolve(&tree),
            Some(HostSelection::new((leaf, 1), (leaf, 2)))
        );
    }

    #[test]
    fn missing_boundary_degrades_to_no_selection() {
        let tree = DocTree::new();
        let mut markers = MarkerSet::new();
        markers.record_end(tree.root(), 0);

        assert_eq!(markers.resolve(&tree), None);
    }

    #[test]
    fn detached_bearing_leaf_degrades_to_no_selection() {
        let mut tree = DocTree::new();
        let leaf = tree.alloc_text("gone");
        let root = tree.root();
        tree.append(root, leaf);

        let mut markers = MarkerSet::new();
        markers.record_start(leaf, 0);
        markers.record_end(leaf, 4);
        tree.detach(leaf);

        assert_eq!(markers.resolve(&tree), None);
    }

    #[test]
    fn out_of_bounds_offset_degrades_to_no_selection() {
        let mut tree = DocTree::new();
        let leaf = tree.alloc_text("ab");
        let root = tree.root();
        tree.append(root, leaf);

        let mut markers = MarkerSet::new();
        markers.record_start(leaf, 0);
        markers.record_end(leaf, 3);

        assert_eq!(markers.resolve(&tree), None);
    }
}
