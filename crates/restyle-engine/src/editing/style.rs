//! Inline style reformatter.
//!
//! Rewrites the style runs spanned by a selection. The whole subtree under
//! the rewrite root is regenerated, not patched: every text run is re-emitted
//! flat with its accumulated (inherited) declarations, which is what keeps
//! the output canonical — one span per run, no nesting, no duplicate
//! properties. Atomic custom leaves pass through untouched; wrapping from
//! ancestor spans outside the rewritten subtree is never altered.

use std::slice;

use crate::dom::{merge_styles, DocTree, NodeId, NodeKind, StyleDecl, StyleProperty, Tag};

use super::markers::MarkerSet;
use super::phase::{Phase, PhaseTracker};
use super::range::EditRange;
use super::RewriteOutcome;

/// Inline style operation as requested by a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleOp {
    /// Ensure the declaration is present on the selected run. Idempotent.
    Apply(StyleDecl),
    /// Strip one property from the selected run.
    Remove(StyleProperty),
    /// Apply when inactive at the selection, remove when active — the
    /// toolbar-button behavior.
    Toggle(StyleDecl),
    /// Strip every recognized inline property, regardless of toggle state.
    Clear,
}

/// The resolved action after toggle disambiguation.
#[derive(Debug, Clone)]
enum Action {
    Apply(StyleDecl),
    Remove(StyleProperty),
    Clear,
}

/// Rewrite the inline styling spanned by `range`.
///
/// Returns `None` without touching the tree when the selection is collapsed
/// (style operations need at least one selected character) or the rewrite
/// root cannot be resolved.
pub fn apply(tree: &mut DocTree, range: &EditRange, op: StyleOp) -> Option<RewriteOutcome> {
    if range.collapsed {
        return None;
    }
    let action = match op {
        StyleOp::Apply(decl) => Action::Apply(decl),
        StyleOp::Remove(property) => Action::Remove(property),
        StyleOp::Clear => Action::Clear,
        StyleOp::Toggle(decl) => {
            if is_style_active(tree, range, &decl) {
                Action::Remove(decl.property)
            } else {
                Action::Apply(decl)
            }
        }
    };
    let root = rewrite_root(tree, range)?;

    let mut rewrite = Rewrite {
        range,
        action,
        tracker: PhaseTracker::inline(range),
        markers: MarkerSet::new(),
    };
    let children: Vec<NodeId> = tree.children(root).to_vec();
    let mut out = Vec::new();
    for child in children {
        rewrite.parse_node(tree, child, &[], &mut out);
    }
    tree.replace_children(root, out);

    Some(RewriteOutcome {
        selection: rewrite.markers.resolve(tree),
    })
}

/// Whether the declaration is in effect at the selection start, considering
/// every style run between the leaf and its block.
pub fn is_style_active(tree: &DocTree, range: &EditRange, decl: &StyleDecl) -> bool {
    effective_styles_at(tree, range.start.node)
        .iter()
        .any(|d| d == decl)
}

/// Accumulated declarations wrapping `node`, outermost first, innermost
/// value winning per property.
pub fn effective_styles_at(tree: &DocTree, node: NodeId) -> Vec<StyleDecl> {
    let mut spans = Vec::new();
    let mut current = node;
    loop {
        let Some(parent) = tree.parent(current) else {
            break;
        };
        if tree.is_block(parent) || tree.is_list(parent) || parent == tree.root() {
            break;
        }
        if matches!(tree.tag(parent), Some(Tag::Span)) {
            spans.push(parent);
        }
        current = parent;
    }
    spans.reverse();
    let mut styles = Vec::new();
    for span in spans {
        styles = merge_styles(&styles, tree.styles(span));
    }
    styles
}

/// The subtree to regenerate: the common ancestor itself when it is
/// structural, otherwise its nearest block ancestor.
fn rewrite_root(tree: &DocTree, range: &EditRange) -> Option<NodeId> {
    let common = range.common_ancestor;
    let root = if tree.is_inline(common) {
        range.block_parent
    } else {
        common
    };
    tree.is_reachable(root).then_some(root)
}

struct Rewrite<'a> {
    range: &'a EditRange,
    action: Action,
    tracker: PhaseTracker,
    markers: MarkerSet,
}

impl Rewrite<'_> {
    fn parse_node(
        &mut self,
        tree: &mut DocTree,
        node: NodeId,
        inherited: &[StyleDecl],
        out: &mut Vec<NodeId>,
    ) {
        match tree.kind(node).clone() {
            NodeKind::Text(text) => self.parse_text_node(tree, node, &text, inherited, out),
            // Atomic leaves pass through opaque and unmodified; they still
            // advance the phase tracker and can carry a boundary.
            NodeKind::Custom { .. } => {
                let phase = self.tracker.classify(node);
                if matches!(phase, Phase::First | Phase::Both) {
                    self.markers.record_start(node, self.range.start.offset);
                }
                if matches!(phase, Phase::Both | Phase::Last) {
                    self.markers.record_end(node, self.range.end.offset);
                }
                tree.detach(node);
                out.push(node);
            }
            NodeKind::Element { tag: Tag::Span, styles } => {
                // Style runs contribute their declarations and disappear;
                // descendants are re-emitted flat.
                let merged = merge_styles(inherited, &styles);
                let children: Vec<NodeId> = tree.children(node).to_vec();
                for child in children {
                    self.parse_node(tree, child, &merged, out);
                }
            }
            NodeKind::Element { tag: Tag::Br, .. } => {
                tree.detach(node);
                out.push(node);
            }
            NodeKind::Element { tag, .. } => {
                // Block/list shells are preserved; only their inline
                // content is regenerated.
                let shell = tree.alloc_element(tag);
                let children: Vec<NodeId> = tree.children(node).to_vec();
                let mut inner = Vec::new();
                for child in children {
                    self.parse_node(tree, child, inherited, &mut inner);
                }
                for child in inner {
                    tree.append(shell, child);
                }
                out.push(shell);
            }
        }
    }

    /// Split a text leaf into (pre, selected, post) against the selection
    /// boundaries and emit each non-empty run.
    fn parse_text_node(
        &mut self,
        tree: &mut DocTree,
        node: NodeId,
        text: &str,
        inherited: &[StyleDecl],
        out: &mut Vec<NodeId>,
    ) {
        let phase = self.tracker.classify(node);
        let start = clamp_to_char_boundary(text, self.range.start.offset);
        let end = clamp_to_char_boundary(text, self.range.end.offset);
        let (pre, selected, post) = match phase {
            Phase::Pre | Phase::Post => (text, "", ""),
            Phase::First => (&text[..start], &text[start..], ""),
            Phase::Both => (&text[..start], &text[start..end], &text[end..]),
            Phase::During => ("", text, ""),
            Phase::Last => ("", &text[..end], &text[end..]),
        };

        if !pre.is_empty() {
            out.push(generate_text(tree, inherited, pre).0);
        }
        if !selected.is_empty() {
            let styled = self.selected_styles(inherited);
            let (emitted, leaf) = generate_text(tree, &styled, selected);
            if matches!(phase, Phase::First | Phase::Both) {
                self.markers.record_start(leaf, 0);
            }
            // Every selected run updates the end; the last one wins, which
            // also covers an end boundary sitting at offset 0 of its leaf.
            self.markers.record_end(leaf, selected.len());
            out.push(emitted);
        }
        if !post.is_empty() {
            out.push(generate_text(tree, inherited, post).0);
        }
    }

    fn selected_styles(&self, inherited: &[StyleDecl]) -> Vec<StyleDecl> {
        match &self.action {
            Action::Apply(decl) => {
                if inherited.contains(decl) {
                    // Already present: idempotent no-op merge.
                    inherited.to_vec()
                } else {
                    merge_styles(inherited, slice::from_ref(decl))
                }
            }
            Action::Remove(property) => inherited
                .iter()
                .filter(|d| d.property != *property)
                .cloned()
                .collect(),
            Action::Clear => Vec::new(),
        }
    }
}

/// Emit one run: bare text when the style set is empty, otherwise a single
/// span wrapping the text. Returns (emitted node, inner text leaf).
fn generate_text(tree: &mut DocTree, styles: &[StyleDecl], text: &str) -> (NodeId, NodeId) {
    let leaf = tree.alloc_text(text);
    if styles.is_empty() {
        return (leaf, leaf);
    }
    let span = tree.alloc_span(styles.to_vec());
    tree.append(span, leaf);
    (span, leaf)
}

fn clamp_to_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
