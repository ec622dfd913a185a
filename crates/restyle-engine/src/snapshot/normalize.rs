use std::collections::BTreeMap;

use serde::Serialize;

use crate::dom::{DocTree, NodeId, NodeKind, StyleDecl, Tag, merge_styles};

#[derive(Serialize)]
pub struct Snap {
    pub blocks: Vec<BlockSnap>,
}

/// One content line: a leaf block, or a bare inline run under the root.
#[derive(Serialize)]
pub struct BlockSnap {
    pub kind: String,
    /// Structural ancestors above the line, outermost first.
    pub containers: Vec<String>,
    /// Concatenated text of the line's text runs.
    pub text: String,
    pub inline: Vec<InlineSnap>,
}

#[derive(Serialize)]
pub struct InlineSnap {
    pub kind: String,
    pub text: String,
    /// Effective declarations on the run, span nesting already merged.
    pub styles: Vec<String>,
    pub attrs: BTreeMap<String, String>,
}

/// Flatten a document tree into its content lines, in document order.
pub fn normalize(tree: &DocTree) -> Snap {
    let mut blocks = Vec::new();
    walk(tree, tree.root(), &mut Vec::new(), &mut blocks);
    Snap { blocks }
}

fn walk(tree: &DocTree, node: NodeId, containers: &mut Vec<String>, out: &mut Vec<BlockSnap>) {
    let mut bare: Vec<InlineSnap> = Vec::new();
    for &child in tree.children(node) {
        if node == tree.root() && tree.is_inline(child) {
            collect_run(tree, child, &[], &mut bare);
            continue;
        }
        flush_bare(&mut bare, containers, out);
        match tree.tag(child) {
            Some(Tag::Block(tag)) => {
                let name = tag.as_name().to_string();
                let inline = inline_runs(tree, child);
                let has_structural = tree.children(child).iter().any(|&c| !tree.is_inline(c));
                if !inline.is_empty() || !has_structural {
                    out.push(line(name.clone(), containers.clone(), inline));
                }
                containers.push(name);
                walk(tree, child, containers, out);
                containers.pop();
            }
            Some(Tag::List(tag)) => {
                containers.push(tag.as_name().to_string());
                walk(tree, child, containers, out);
                containers.pop();
            }
            _ => {}
        }
    }
    flush_bare(&mut bare, containers, out);
}

fn flush_bare(bare: &mut Vec<InlineSnap>, containers: &[String], out: &mut Vec<BlockSnap>) {
    if bare.is_empty() {
        return;
    }
    out.push(line("bare".to_string(), containers.to_vec(), std::mem::take(bare)));
}

fn line(kind: String, containers: Vec<String>, inline: Vec<InlineSnap>) -> BlockSnap {
    let text = inline
        .iter()
        .filter(|run| run.kind == "text")
        .map(|run| run.text.as_str())
        .collect();
    BlockSnap {
        kind,
        containers,
        text,
        inline,
    }
}

fn inline_runs(tree: &DocTree, block: NodeId) -> Vec<InlineSnap> {
    let mut runs = Vec::new();
    for &child in tree.children(block) {
        if tree.is_inline(child) {
            collect_run(tree, child, &[], &mut runs);
        }
    }
    runs
}

fn collect_run(tree: &DocTree, node: NodeId, inherited: &[StyleDecl], runs: &mut Vec<InlineSnap>) {
    match tree.kind(node) {
        NodeKind::Text(text) => runs.push(InlineSnap {
            kind: "text".to_string(),
            text: text.clone(),
            styles: inherited.iter().map(ToString::to_string).collect(),
            attrs: BTreeMap::new(),
        }),
        NodeKind::Custom { tag, attrs, inner } => runs.push(InlineSnap {
            kind: format!("custom({tag})"),
            text: inner.clone(),
            styles: Vec::new(),
            attrs: attrs.iter().cloned().collect(),
        }),
        NodeKind::Element { tag: Tag::Span, .. } => {
            let merged = merge_styles(inherited, tree.styles(node));
            for &child in tree.children(node) {
                collect_run(tree, child, &merged, runs);
            }
        }
        NodeKind::Element { tag: Tag::Br, .. } => runs.push(InlineSnap {
            kind: "br".to_string(),
            text: String::new(),
            styles: Vec::new(),
            attrs: BTreeMap::new(),
        }),
        NodeKind::Element { .. } => {}
    }
}
