//! Block structure reformatter.
//!
//! Retargets the paragraph-level structure of every content line the
//! selection touches. The affected top-level slice of the document is
//! flattened into lines (inline content plus its format chain), each line
//! gets a new chain according to the target and its phase, and the slice is
//! regenerated by a builder that reuses shared chain prefixes between
//! consecutive lines. Inline content moves into the new structure intact,
//! which is what keeps selection coordinates valid across the rewrite.

use crate::dom::{BlockTag, DocTree, FormatTag, NodeId, Tag};

use super::markers::MarkerSet;
use super::phase::{Phase, PhaseTracker};
use super::range::EditRange;
use super::RewriteOutcome;

/// Paragraph-level target as requested by a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTarget {
    /// Retarget selected lines to this block or list format.
    Tag(FormatTag),
    /// Reset selected lines to plain paragraphs.
    Clear,
}

/// One content line of the affected slice: the inline payload of a leaf
/// block, or a bare inline run sitting directly under the editor root.
#[derive(Debug)]
struct Line {
    /// Format chain from the top-level ancestor down to the line's block,
    /// empty for a bare inline run.
    formats: Vec<FormatTag>,
    /// Inline nodes moved (not rebuilt) into the regenerated structure.
    content: Vec<NodeId>,
    phase: Phase,
    /// Whether the line's block is the first item of its list parent.
    first_in_list: bool,
}

/// Rewrite the block structure spanned by `range`.
///
/// A collapsed selection formats the caret's line. Returns `None` without
/// touching the tree when the affected top-level slice cannot be resolved.
pub fn apply(tree: &mut DocTree, range: &EditRange, target: BlockTarget) -> Option<RewriteOutcome> {
    let root = tree.root();
    let start_top = tree.top_level_ancestor(line_target(tree, range.start.node))?;
    let end_top = tree.top_level_ancestor(line_target(tree, range.end.node))?;
    let from = tree.child_index(start_top)?;
    let to = tree.child_index(end_top)?;

    let mut tracker = PhaseTracker::blocks(tree, range);
    let tops: Vec<NodeId> = tree.children(root)[from..=to].to_vec();
    let mut lines = collect_lines(tree, &tops, &mut tracker);
    let chains = target_chains(&lines, target);

    // Lift the affected slice out before rebuilding: moving content into
    // fresh blocks must not disturb the root's child list while `from` is
    // still live. Bare leaves in the slice are root children themselves.
    for &top in &tops {
        tree.detach(top);
    }
    let mut builder = LineBuilder::default();
    for (line, chain) in lines.drain(..).zip(chains) {
        builder.push_line(tree, &chain, line.content);
    }
    tree.insert_children(root, from, builder.output);

    Some(RewriteOutcome {
        selection: MarkerSet::from_range(range).resolve(tree),
    })
}

/// The node the phase tracker targets for a boundary leaf: its covering
/// block, or the leaf itself when it sits bare under the root.
fn line_target(tree: &DocTree, leaf: NodeId) -> NodeId {
    let block = tree.nearest_block_ancestor(leaf);
    if block == tree.root() { leaf } else { block }
}

/// Flatten the top-level slice into lines in document order.
fn collect_lines(tree: &DocTree, tops: &[NodeId], tracker: &mut PhaseTracker) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut bare: Vec<NodeId> = Vec::new();
    for &top in tops {
        if tree.is_inline(top) {
            bare.push(top);
            continue;
        }
        flush_bare_run(tree, &mut bare, tracker, &mut lines);
        let mut chain = Vec::new();
        collect_structural(tree, top, &mut chain, tracker, &mut lines);
    }
    flush_bare_run(tree, &mut bare, tracker, &mut lines);
    lines
}

/// Contiguous bare inline siblings under the root form one unformatted line.
fn flush_bare_run(
    tree: &DocTree,
    bare: &mut Vec<NodeId>,
    tracker: &mut PhaseTracker,
    lines: &mut Vec<Line>,
) {
    if bare.is_empty() {
        return;
    }
    let content = std::mem::take(bare);
    let phase = line_phase(tree, tracker, None, &content);
    lines.push(Line {
        formats: Vec::new(),
        content,
        phase,
        first_in_list: false,
    });
}

fn collect_structural(
    tree: &DocTree,
    node: NodeId,
    chain: &mut Vec<FormatTag>,
    tracker: &mut PhaseTracker,
    lines: &mut Vec<Line>,
) {
    let format = match tree.tag(node) {
        Some(Tag::Block(tag)) => FormatTag::Block(*tag),
        Some(Tag::List(tag)) => FormatTag::List(*tag),
        _ => return,
    };
    chain.push(format);
    let children: Vec<NodeId> = tree.children(node).to_vec();
    let (content, structural): (Vec<NodeId>, Vec<NodeId>) =
        children.into_iter().partition(|&c| tree.is_inline(c));

    // A block is a line when it carries inline content of its own; an empty
    // block is a line too so empty paragraphs survive the rewrite. List
    // containers are never lines.
    if tree.is_block(node) && (!content.is_empty() || structural.is_empty()) {
        let phase = line_phase(tree, tracker, Some(node), &content);
        let first_in_list = tree
            .parent(node)
            .is_some_and(|p| tree.is_list(p) && tree.child_index(node) == Some(0));
        lines.push(Line {
            formats: chain.clone(),
            content,
            phase,
            first_in_list,
        });
    }
    for child in structural {
        collect_structural(tree, child, chain, tracker, lines);
    }
    chain.pop();
}

/// Classify a line by feeding its block and content subtrees through the
/// tracker in document order and merging the answers.
fn line_phase(
    tree: &DocTree,
    tracker: &mut PhaseTracker,
    block: Option<NodeId>,
    content: &[NodeId],
) -> Phase {
    let mut merged: Option<Phase> = None;
    let feed = |phase: Phase, merged: &mut Option<Phase>| {
        *merged = Some(match *merged {
            None => phase,
            Some(current) => merge_phase(current, phase),
        });
    };
    if let Some(block) = block {
        feed(tracker.classify(block), &mut merged);
    }
    for &node in content {
        for descendant in tree.descendants(node) {
            feed(tracker.classify(descendant), &mut merged);
        }
    }
    merged.unwrap_or(Phase::Post)
}

fn merge_phase(a: Phase, b: Phase) -> Phase {
    use Phase::*;
    match (a, b) {
        (Both, _) | (_, Both) => Both,
        (First, Last) | (Last, First) => Both,
        (First, _) | (_, First) => First,
        (Last, _) | (_, Last) => Last,
        (During, _) | (_, During) => During,
        (Pre, Post) | (Post, Pre) => During,
        (Pre, _) => Pre,
        (Post, Post) => Post,
    }
}

/// Compute the new format chain for every line.
///
/// Unselected lines keep their chain. Selected lines get the target: block
/// targets always produce a single fresh block per line; list targets enter
/// at the first selected line (retagging the list when that line opens one,
/// nesting a sublist when it is a later item) and pull every following
/// selected line into the same chain.
fn target_chains(lines: &[Line], target: BlockTarget) -> Vec<Vec<FormatTag>> {
    let mut chains = Vec::with_capacity(lines.len());
    let mut selected_chain: Option<Vec<FormatTag>> = None;
    for line in lines {
        let chain = if !line.phase.selected() {
            line.formats.clone()
        } else {
            match target {
                BlockTarget::Clear => vec![FormatTag::Block(BlockTag::P)],
                BlockTarget::Tag(FormatTag::Block(tag)) => vec![FormatTag::Block(tag)],
                BlockTarget::Tag(FormatTag::List(tag)) => match line.phase {
                    Phase::First | Phase::Both => list_entry_chain(line, tag),
                    _ => selected_chain.clone().unwrap_or_else(|| {
                        vec![FormatTag::List(tag), FormatTag::Block(BlockTag::Li)]
                    }),
                },
            }
        };
        if line.phase.selected() {
            selected_chain = Some(chain.clone());
        }
        chains.push(chain);
    }
    chains
}

fn list_entry_chain(line: &Line, list: crate::dom::ListTag) -> Vec<FormatTag> {
    let is_item = matches!(line.formats.last(), Some(FormatTag::Block(BlockTag::Li)));
    if !is_item {
        return vec![FormatTag::List(list), FormatTag::Block(BlockTag::Li)];
    }
    if line.first_in_list {
        // Retag the list the selection starts in.
        let mut chain = line.formats.clone();
        if let Some(slot) = chain.iter().rposition(|f| matches!(f, FormatTag::List(_))) {
            chain[slot] = FormatTag::List(list);
        }
        chain
    } else {
        // A later item nests a fresh sublist under the preceding item.
        let mut chain = line.formats.clone();
        chain.push(FormatTag::List(list));
        chain.push(FormatTag::Block(BlockTag::Li));
        chain
    }
}

/// Regenerates the top-level slice line by line.
///
/// Consecutive lines share the longest common prefix of their chains; the
/// final tag of a chain is always opened fresh so every line lands in its
/// own block. An empty chain emits the content bare at the top level.
#[derive(Debug, Default)]
struct LineBuilder {
    open_formats: Vec<FormatTag>,
    open_nodes: Vec<NodeId>,
    output: Vec<NodeId>,
}

impl LineBuilder {
    fn push_line(&mut self, tree: &mut DocTree, chain: &[FormatTag], content: Vec<NodeId>) {
        if chain.is_empty() {
            self.open_formats.clear();
            self.open_nodes.clear();
            self.output.extend(content);
            return;
        }
        let shared = common_prefix_len(&self.open_formats, chain);
        let keep = shared.min(chain.len() - 1);
        self.open_formats.truncate(keep);
        self.open_nodes.truncate(keep);
        for &format in &chain[keep..] {
            let element = tree.alloc_element(format.to_tag());
            match self.open_nodes.last() {
                Some(&parent) => tree.append(parent, element),
                None => self.output.push(element),
            }
            self.open_formats.push(format);
            self.open_nodes.push(element);
        }
        let line_block = *self.open_nodes.last().unwrap();
        for node in content {
            tree.append(line_block, node);
        }
    }
}

fn common_prefix_len(a: &[FormatTag], b: &[FormatTag]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
