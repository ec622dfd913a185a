//! Editor facade: one value owning the document, the live selection, and
//! the undo history.
//!
//! Every host interaction flows through `&mut Editor`, so a rewrite can
//! never observe a half-updated document and operations need no shared
//! state beyond the editor itself. Operations that cannot proceed (invalid
//! selection, unresolvable structure) return `false` and leave the document
//! untouched; the document is never left partially rewritten.

use std::time::{Duration, Instant};

use anyhow::Context;

use crate::dom::{BlockTag, DocTree, FormatTag, NodeId, StyleDecl, Tag};
use crate::editing::{block, style, BlockTarget, EditRange, History, HostSelection, StyleOp};
use crate::markup::{parse_fragment, write_markup, CustomTags};

/// Construction-time knobs. The defaults match a plain interactive editor.
#[derive(Debug, Clone)]
pub struct EditorOptions {
    /// Atomic element vocabulary accepted by the parser.
    pub custom_tags: CustomTags,
    /// Maximum retained undo snapshots.
    pub history_size: usize,
    /// Keystrokes closer together than this coalesce into one undo step.
    pub debounce: Duration,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            custom_tags: CustomTags::standard(),
            history_size: 100,
            debounce: Duration::from_millis(300),
        }
    }
}

/// Formatting in effect at the selection start, for control rendering.
/// Serializable so shells can ship it across a host boundary as-is.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FormatState {
    /// The innermost block format covering the selection, reported as the
    /// containing list for list items. `None` for bare content.
    pub block: Option<FormatTag>,
    pub styles: Vec<StyleDecl>,
}

impl FormatState {
    pub fn is_style_active(&self, decl: &StyleDecl) -> bool {
        self.styles.contains(decl)
    }
}

/// Coalesces keystroke bursts into single undo steps.
///
/// The clock is injected by the caller, which keeps burst behavior
/// deterministic under test.
#[derive(Debug)]
pub struct TypingDebounce {
    interval: Duration,
    last: Option<Instant>,
}

impl TypingDebounce {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Note a keystroke at `now`; true when it starts a new burst.
    pub fn note(&mut self, now: Instant) -> bool {
        let boundary = self
            .last
            .is_none_or(|last| now.duration_since(last) >= self.interval);
        self.last = Some(now);
        boundary
    }
}

pub struct Editor {
    tree: DocTree,
    selection: Option<HostSelection>,
    history: History,
    custom_tags: CustomTags,
    debounce: TypingDebounce,
    /// Typing happened since the last history snapshot.
    pending_text: bool,
}

impl Editor {
    pub fn from_markup(markup: &str) -> anyhow::Result<Self> {
        Self::with_options(markup, EditorOptions::default())
    }

    pub fn with_options(markup: &str, options: EditorOptions) -> anyhow::Result<Self> {
        let tree = parse_fragment(markup, &options.custom_tags)
            .context("failed to parse initial document markup")?;
        let mut history = History::new(options.history_size);
        history.update(&write_markup(&tree));
        Ok(Self {
            tree,
            selection: None,
            history,
            custom_tags: options.custom_tags,
            debounce: TypingDebounce::new(options.debounce),
            pending_text: false,
        })
    }

    pub fn markup(&self) -> String {
        write_markup(&self.tree)
    }

    pub fn tree(&self) -> &DocTree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&HostSelection> {
        self.selection.as_ref()
    }

    /// Adopt a selection reported by the host. Rejected (and cleared) when
    /// either boundary is not a live text/atomic leaf of this document.
    pub fn set_selection(&mut self, selection: HostSelection) -> bool {
        match EditRange::from_selection(&self.tree, &selection) {
            Some(_) => {
                self.selection = Some(selection);
                true
            }
            None => {
                self.selection = None;
                false
            }
        }
    }

    pub fn set_cursor(&mut self, node: NodeId, offset: usize) -> bool {
        self.set_selection(HostSelection::caret(node, offset))
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Retarget the block structure of the selected lines.
    pub fn apply_block_format(&mut self, target: BlockTarget) -> bool {
        self.flush_typing();
        let Some(range) = self.live_range() else {
            return false;
        };
        let Some(outcome) = block::apply(&mut self.tree, &range, target) else {
            return false;
        };
        self.selection = outcome.selection;
        self.history.update(&write_markup(&self.tree));
        true
    }

    /// Rewrite the inline styling of the selected run.
    pub fn apply_inline_style(&mut self, op: StyleOp) -> bool {
        self.flush_typing();
        let Some(range) = self.live_range() else {
            return false;
        };
        let Some(outcome) = style::apply(&mut self.tree, &range, op) else {
            return false;
        };
        self.selection = outcome.selection;
        self.history.update(&write_markup(&self.tree));
        true
    }

    /// Replace the text of one leaf, coalescing rapid keystrokes into a
    /// single undo step.
    pub fn replace_text(&mut self, node: NodeId, text: &str, now: Instant) -> bool {
        if !self.tree.is_text(node) || !self.tree.is_reachable(node) {
            return false;
        }
        if self.debounce.note(now) {
            self.flush_typing();
        }
        self.tree.set_text(node, text);
        self.pending_text = true;
        true
    }

    /// Append a plain paragraph at the end of the document.
    pub fn insert_paragraph(&mut self, text: &str) -> NodeId {
        self.flush_typing();
        let p = self.tree.alloc_element(Tag::Block(BlockTag::P));
        let leaf = self.tree.alloc_text(text);
        self.tree.append(p, leaf);
        let root = self.tree.root();
        self.tree.append(root, p);
        self.history.update(&write_markup(&self.tree));
        leaf
    }

    /// Insert an atomic custom element at the caret, splitting the text
    /// leaf under it. An `id` attribute is generated when absent so hosts
    /// can address the element across rewrites.
    pub fn insert_atomic(
        &mut self,
        tag: &str,
        mut attrs: Vec<(String, String)>,
        inner: &str,
    ) -> bool {
        if !self.custom_tags.contains(tag) {
            return false;
        }
        self.flush_typing();
        let Some(range) = self.live_range() else {
            return false;
        };
        if !range.collapsed || !self.tree.is_text(range.start.node) {
            return false;
        }
        let node = range.start.node;
        let Some(parent) = self.tree.parent(node) else {
            return false;
        };
        let Some(slot) = self.tree.child_index(node) else {
            return false;
        };
        if !attrs.iter().any(|(key, _)| key == "id") {
            attrs.push(("id".to_string(), uuid::Uuid::new_v4().to_string()));
        }

        let text = self.tree.text(node).unwrap_or_default().to_string();
        let at = clamp_to_char_boundary(&text, range.start.offset);
        let custom = self.tree.alloc_custom(tag, attrs, inner);
        let mut replacement = Vec::new();
        if !text[..at].is_empty() {
            self.tree.set_text(node, &text[..at]);
            replacement.push(node);
        }
        replacement.push(custom);
        if !text[at..].is_empty() {
            let tail = self.tree.alloc_text(&text[at..]);
            replacement.push(tail);
        }
        self.tree.splice_children(parent, slot, slot, replacement);

        self.selection = Some(HostSelection::caret(custom, 1));
        self.history.update(&write_markup(&self.tree));
        true
    }

    /// Delete the selected content, leaving a caret at the former start.
    ///
    /// Refuses when the selection covers an atomic custom leaf unless
    /// `delete_atomics` is set; hosts confirm with the user first.
    pub fn delete_selection(&mut self, delete_atomics: bool) -> bool {
        self.flush_typing();
        let Some(range) = self.live_range() else {
            return false;
        };
        if range.collapsed {
            return false;
        }
        if !delete_atomics && range.contains_atomic_nodes(&self.tree) {
            return false;
        }

        let order = self.tree.descendants(range.common_ancestor);
        let Some(start_at) = order.iter().position(|&n| n == range.start.node) else {
            return false;
        };
        let Some(end_at) = order.iter().position(|&n| n == range.end.node) else {
            return false;
        };
        for &node in &order[start_at..=end_at] {
            if self.tree.is_custom(node) {
                // A boundary sitting beside (not across) the leaf spares it.
                let spared = (node == range.start.node && range.start.offset == 1)
                    || (node == range.end.node && range.end.offset == 0);
                if !spared {
                    self.tree.detach(node);
                }
            } else if self.tree.is_text(node) {
                let text = self.tree.text(node).unwrap_or_default().to_string();
                let cut_from = if node == range.start.node {
                    clamp_to_char_boundary(&text, range.start.offset)
                } else {
                    0
                };
                let cut_to = if node == range.end.node {
                    clamp_to_char_boundary(&text, range.end.offset)
                } else {
                    text.len()
                };
                if cut_from == 0 && cut_to == text.len() && node != range.start.node {
                    self.tree.detach(node);
                } else {
                    self.tree
                        .set_text(node, format!("{}{}", &text[..cut_from], &text[cut_to..]));
                }
            }
        }

        self.selection = None;
        if self.tree.is_reachable(range.start.node) && self.tree.is_text(range.start.node) {
            self.set_cursor(range.start.node, range.start.offset);
        }
        self.history.update(&write_markup(&self.tree));
        true
    }

    pub fn undo(&mut self) -> bool {
        self.flush_typing();
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        let snapshot = snapshot.to_string();
        self.restore(&snapshot)
    }

    pub fn redo(&mut self) -> bool {
        self.flush_typing();
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        let snapshot = snapshot.to_string();
        self.restore(&snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.pending_text || self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Formatting at the selection start, for rendering control state.
    pub fn format_state(&self) -> FormatState {
        let Some(range) = self.live_range() else {
            return FormatState::default();
        };
        FormatState {
            block: block_format_at(&self.tree, range.start.node),
            styles: style::effective_styles_at(&self.tree, range.start.node),
        }
    }

    fn live_range(&self) -> Option<EditRange> {
        let selection = self.selection.as_ref()?;
        EditRange::from_selection(&self.tree, selection)
    }

    /// Commit any coalesced typing burst as one history entry.
    fn flush_typing(&mut self) {
        if self.pending_text {
            self.history.update(&write_markup(&self.tree));
            self.pending_text = false;
        }
    }

    fn restore(&mut self, snapshot: &str) -> bool {
        match parse_fragment(snapshot, &self.custom_tags) {
            Ok(tree) => {
                self.tree = tree;
                self.selection = None;
                true
            }
            Err(_) => false,
        }
    }
}

fn block_format_at(tree: &DocTree, leaf: NodeId) -> Option<FormatTag> {
    let block = tree.nearest_block_ancestor(leaf);
    if block == tree.root() {
        return None;
    }
    match tree.tag(block) {
        Some(Tag::Block(BlockTag::Li)) => {
            let mut current = block;
            while let Some(parent) = tree.parent(current) {
                if let Some(Tag::List(list)) = tree.tag(parent) {
                    return Some(FormatTag::List(*list));
                }
                current = parent;
            }
            Some(FormatTag::Block(BlockTag::Li))
        }
        Some(Tag::Block(tag)) => Some(FormatTag::Block(*tag)),
        _ => None,
    }
}

fn clamp_to_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
