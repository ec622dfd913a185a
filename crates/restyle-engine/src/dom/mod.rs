//! Arena-indexed document tree.
//!
//! The entire editable document lives in one [`DocTree`] value: a flat arena
//! of nodes addressed by [`NodeId`]. Rewrites build replacement subtrees in
//! the same arena and splice them in; nodes that fall out of the reachable
//! tree simply become garbage until the next full reload (undo/redo parses a
//! fresh tree). Keeping the document a plain value with no handle back to a
//! rendering surface is what makes the reformatters unit-testable.

mod style;

use serde::{Deserialize, Serialize};

pub use style::{dedupe_styles, merge_styles, StyleDecl, StyleProperty};

/// Index of a node in the [`DocTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Paragraph-level structural tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    P,
    Blockquote,
    Li,
}

impl BlockTag {
    pub fn as_name(self) -> &'static str {
        match self {
            BlockTag::H1 => "h1",
            BlockTag::H2 => "h2",
            BlockTag::H3 => "h3",
            BlockTag::H4 => "h4",
            BlockTag::H5 => "h5",
            BlockTag::H6 => "h6",
            BlockTag::P => "p",
            BlockTag::Blockquote => "blockquote",
            BlockTag::Li => "li",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "h1" => BlockTag::H1,
            "h2" => BlockTag::H2,
            "h3" => BlockTag::H3,
            "h4" => BlockTag::H4,
            "h5" => BlockTag::H5,
            "h6" => BlockTag::H6,
            "p" => BlockTag::P,
            "blockquote" => BlockTag::Blockquote,
            "li" => BlockTag::Li,
            _ => return None,
        })
    }
}

/// Ordered/unordered list container tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListTag {
    Ol,
    Ul,
}

impl ListTag {
    pub fn as_name(self) -> &'static str {
        match self {
            ListTag::Ol => "ol",
            ListTag::Ul => "ul",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ol" => ListTag::Ol,
            "ul" => ListTag::Ul,
            _ => return None,
        })
    }
}

/// A block or list tag as it appears in a format stack.
///
/// This is the unit the block reformatter reasons about: a node's "format"
/// is the chain of these from its top-level ancestor down to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Block(BlockTag),
    List(ListTag),
}

impl FormatTag {
    pub fn as_name(self) -> &'static str {
        match self {
            FormatTag::Block(tag) => tag.as_name(),
            FormatTag::List(tag) => tag.as_name(),
        }
    }

    pub fn to_tag(self) -> Tag {
        match self {
            FormatTag::Block(tag) => Tag::Block(tag),
            FormatTag::List(tag) => Tag::List(tag),
        }
    }
}

/// Structural tag of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// The editor root. Exactly one per tree, never serialized.
    Root,
    Block(BlockTag),
    List(ListTag),
    /// Inline style run. Declarations live on the node, not the tag.
    Span,
    /// Line break, childless.
    Br,
}

/// Payload of a tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        tag: Tag,
        /// Ordered, property-unique style declarations. Only meaningful for
        /// `Tag::Span`; empty for everything else.
        styles: Vec<StyleDecl>,
    },
    Text(String),
    /// Atomic custom leaf (link/image/comment/action/mention). Opaque to
    /// every formatting operation: never entered, never split. The inner
    /// markup is carried verbatim as an uninterpreted string.
    Custom {
        tag: String,
        attrs: Vec<(String, String)>,
        inner: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// The document tree. See module docs for the arena model.
#[derive(Debug, Clone, PartialEq)]
pub struct DocTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl DocTree {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element {
                tag: Tag::Root,
                styles: Vec::new(),
            },
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn alloc_element(&mut self, tag: Tag) -> NodeId {
        self.push(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element {
                tag,
                styles: Vec::new(),
            },
        })
    }

    pub fn alloc_span(&mut self, styles: Vec<StyleDecl>) -> NodeId {
        self.push(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Element {
                tag: Tag::Span,
                styles: dedupe_styles(&styles),
            },
        })
    }

    pub fn alloc_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Text(text.into()),
        })
    }

    pub fn alloc_custom(
        &mut self,
        tag: impl Into<String>,
        attrs: Vec<(String, String)>,
        inner: impl Into<String>,
    ) -> NodeId {
        self.push(Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Custom {
                tag: tag.into(),
                attrs,
                inner: inner.into(),
            },
        })
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn tag(&self, id: NodeId) -> Option<&Tag> {
        match &self.nodes[id.index()].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.index()].kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let NodeKind::Text(current) = &mut self.nodes[id.index()].kind {
            *current = text.into();
        }
    }

    pub fn styles(&self, id: NodeId) -> &[StyleDecl] {
        match &self.nodes[id.index()].kind {
            NodeKind::Element { styles, .. } => styles,
            _ => &[],
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_))
    }

    pub fn is_custom(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Custom { .. })
    }

    /// Text and atomic custom leaves are the only valid selection containers.
    pub fn is_boundary_leaf(&self, id: NodeId) -> bool {
        self.is_text(id) || self.is_custom(id)
    }

    pub fn is_block(&self, id: NodeId) -> bool {
        matches!(self.tag(id), Some(Tag::Block(_)))
    }

    pub fn is_list(&self, id: NodeId) -> bool {
        matches!(self.tag(id), Some(Tag::List(_)))
    }

    pub fn is_inline(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Text(_) | NodeKind::Custom { .. } => true,
            NodeKind::Element { tag, .. } => matches!(tag, Tag::Span | Tag::Br),
        }
    }

    /// Attach `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Remove `id` from its parent's child list. No-op for parentless nodes.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != id);
        }
    }

    /// Replace the whole child list of `parent`. Old children are detached,
    /// new ones reattached in order.
    pub fn replace_children(&mut self, parent: NodeId, new_children: Vec<NodeId>) {
        let old = std::mem::take(&mut self.nodes[parent.index()].children);
        for child in old {
            self.nodes[child.index()].parent = None;
        }
        for child in new_children {
            self.append(parent, child);
        }
    }

    /// Replace the child range `[from, to]` (inclusive indices) of `parent`
    /// with `replacement`.
    pub fn splice_children(
        &mut self,
        parent: NodeId,
        from: usize,
        to: usize,
        replacement: Vec<NodeId>,
    ) {
        let removed: Vec<NodeId> = self.nodes[parent.index()].children[from..=to].to_vec();
        for child in removed {
            self.nodes[child.index()].parent = None;
        }
        for &child in &replacement {
            // Detach without disturbing the pending splice range.
            if let Some(old_parent) = self.nodes[child.index()].parent.take()
                && old_parent != parent
            {
                self.nodes[old_parent.index()].children.retain(|&c| c != child);
            }
            self.nodes[child.index()].parent = Some(parent);
        }
        self.nodes[parent.index()]
            .children
            .splice(from..=to, replacement);
    }

    /// Insert `nodes` as children of `parent` starting at position `at`,
    /// detaching each from any previous parent first. `at` is clamped to the
    /// current child count.
    pub fn insert_children(&mut self, parent: NodeId, at: usize, nodes: Vec<NodeId>) {
        for &child in &nodes {
            self.detach(child);
            self.nodes[child.index()].parent = Some(parent);
        }
        let children = &mut self.nodes[parent.index()].children;
        let at = at.min(children.len());
        children.splice(at..at, nodes);
    }

    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Whether `id` is still attached under the document root.
    pub fn is_reachable(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Ancestor chain from `id` (inclusive) up to the root (inclusive).
    pub fn ancestors_with_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == ancestor {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain_a = self.ancestors_with_self(a);
        let mut current = b;
        loop {
            if chain_a.contains(&current) {
                return Some(current);
            }
            current = self.parent(current)?;
        }
    }

    /// Nearest Block-tagged ancestor of `id`, or `id` itself if it is one.
    /// Stops at (and returns) the root when no block is found.
    pub fn nearest_block_ancestor(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            if self.is_block(current) || current == self.root {
                return current;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// The direct child of the editor root on the path to `id`, if `id` is
    /// attached under the root at all.
    pub fn top_level_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if parent == self.root {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Path of child indices from the root down to `id`, for document-order
    /// comparison.
    pub fn path(&self, id: NodeId) -> Option<Vec<usize>> {
        let mut indices = Vec::new();
        let mut current = id;
        while current != self.root {
            indices.push(self.child_index(current)?);
            current = self.parent(current)?;
        }
        indices.reverse();
        Some(indices)
    }

    /// Pre-order traversal of the subtree rooted at `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            for &child in self.children(node).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Concatenated text of all text leaves under `id`, in document order.
    /// Atomic custom leaves contribute nothing.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// Map a byte offset into `text_content(id)` back to a (leaf, offset)
    /// coordinate. Offsets at a leaf boundary resolve into the earlier leaf;
    /// offsets past the end of the content resolve to `None`.
    pub fn locate_text_offset(&self, id: NodeId, offset: usize) -> Option<(NodeId, usize)> {
        let mut consumed = 0;
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                if offset <= consumed + text.len() {
                    return Some((node, offset - consumed));
                }
                consumed += text.len();
            }
        }
        None
    }
}

impl Default for DocTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph_with_text(tree: &mut DocTree, text: &str) -> (NodeId, NodeId) {
        let p = tree.alloc_element(Tag::Block(BlockTag::P));
        let leaf = tree.alloc_text(text);
        tree.append(p, leaf);
        let root = tree.root();
        tree.append(root, p);
        (p, leaf)
    }

    #[test]
    fn append_sets_parent_and_order() {
        let mut tree = DocTree::new();
        let (p, leaf) = paragraph_with_text(&mut tree, "hello");

        assert_eq!(tree.parent(leaf), Some(p));
        assert_eq!(tree.parent(p), Some(tree.root()));
        assert_eq!(tree.children(tree.root()), &[p]);
    }

    #[test]
    fn append_detaches_from_previous_parent() {
        let mut tree = DocTree::new();
        let (p1, leaf) = paragraph_with_text(&mut tree, "hello");
        let (p2, _) = paragraph_with_text(&mut tree, "world");

        tree.append(p2, leaf);

        assert_eq!(tree.children(p1), &[] as &[NodeId]);
        assert_eq!(tree.parent(leaf), Some(p2));
        assert_eq!(tree.children(p2).len(), 2);
    }

    #[test]
    fn detached_nodes_are_unreachable() {
        let mut tree = DocTree::new();
        let (p, leaf) = paragraph_with_text(&mut tree, "hello");

        assert!(tree.is_reachable(leaf));
        tree.detach(p);
        assert!(!tree.is_reachable(leaf));
        assert!(!tree.is_reachable(p));
    }

    #[test]
    fn splice_children_replaces_sibling_range() {
        let mut tree = DocTree::new();
        let (a, _) = paragraph_with_text(&mut tree, "a");
        let (b, _) = paragraph_with_text(&mut tree, "b");
        let (c, _) = paragraph_with_text(&mut tree, "c");
        let (d, _) = paragraph_with_text(&mut tree, "d");

        let h = tree.alloc_element(Tag::Block(BlockTag::H2));
        let root = tree.root();
        tree.splice_children(root, 1, 2, vec![h]);

        assert_eq!(tree.children(root), &[a, h, d]);
        assert!(!tree.is_reachable(b));
        assert!(!tree.is_reachable(c));
    }

    #[test]
    fn insert_children_places_detached_nodes_at_index() {
        let mut tree = DocTree::new();
        let (a, _) = paragraph_with_text(&mut tree, "a");
        let (c, _) = paragraph_with_text(&mut tree, "c");

        let b = tree.alloc_element(Tag::Block(BlockTag::P));
        let root = tree.root();
        tree.insert_children(root, 1, vec![b]);

        assert_eq!(tree.children(root), &[a, b, c]);
        assert_eq!(tree.parent(b), Some(root));
    }

    #[test]
    fn insert_children_clamps_past_the_end() {
        let mut tree = DocTree::new();
        let (a, _) = paragraph_with_text(&mut tree, "a");

        let b = tree.alloc_element(Tag::Block(BlockTag::P));
        let root = tree.root();
        tree.insert_children(root, 9, vec![b]);

        assert_eq!(tree.children(root), &[a, b]);
    }

    #[test]
    fn nearest_block_ancestor_walks_past_spans() {
        let mut tree = DocTree::new();
        let (p, _) = paragraph_with_text(&mut tree, "hello ");
        let span = tree.alloc_span(vec![StyleDecl::bold()]);
        let inner = tree.alloc_text("world");
        tree.append(span, inner);
        tree.append(p, span);

        assert_eq!(tree.nearest_block_ancestor(inner), p);
        assert_eq!(tree.nearest_block_ancestor(span), p);
        assert_eq!(tree.nearest_block_ancestor(p), p);
    }

    #[test]
    fn common_ancestor_of_siblings_is_parent() {
        let mut tree = DocTree::new();
        let (p, leaf) = paragraph_with_text(&mut tree, "hello ");
        let other = tree.alloc_text("world");
        tree.append(p, other);

        assert_eq!(tree.common_ancestor(leaf, other), Some(p));
        assert_eq!(tree.common_ancestor(leaf, leaf), Some(leaf));
    }

    #[test]
    fn text_content_skips_custom_leaves() {
        let mut tree = DocTree::new();
        let (p, _) = paragraph_with_text(&mut tree, "see ");
        let custom = tree.alloc_custom(
            "x-link",
            vec![("href".to_string(), "https://example.com".to_string())],
            "docs",
        );
        tree.append(p, custom);
        let tail = tree.alloc_text(" here");
        tree.append(p, tail);

        assert_eq!(tree.text_content(p), "see  here");
    }

    #[test]
    fn locate_text_offset_crosses_leaves() {
        let mut tree = DocTree::new();
        let (p, first) = paragraph_with_text(&mut tree, "abc");
        let second = tree.alloc_text("def");
        tree.append(p, second);

        assert_eq!(tree.locate_text_offset(p, 0), Some((first, 0)));
        assert_eq!(tree.locate_text_offset(p, 2), Some((first, 2)));
        assert_eq!(tree.locate_text_offset(p, 3), Some((first, 3)));
        assert_eq!(tree.locate_text_offset(p, 4), Some((second, 1)));
        assert_eq!(tree.locate_text_offset(p, 6), Some((second, 3)));
        assert_eq!(tree.locate_text_offset(p, 7), None);
    }

    #[test]
    fn path_orders_document_positions() {
        let mut tree = DocTree::new();
        let (_, first) = paragraph_with_text(&mut tree, "one");
        let (_, second) = paragraph_with_text(&mut tree, "two");

        assert!(tree.path(first).unwrap() < tree.path(second).unwrap());
    }
}
