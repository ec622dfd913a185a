//! Markup writer. The inverse of the parser: every element is emitted
//! fully closed, text is entity-escaped, and atomic custom leaves are
//! reproduced byte-for-byte.

use std::fmt::Write;

use crate::dom::{DocTree, NodeId, NodeKind, StyleDecl, Tag};

/// Serialize the whole document (the editor root's content).
pub fn write_markup(tree: &DocTree) -> String {
    let mut out = String::new();
    for &child in tree.children(tree.root()) {
        write_node(tree, child, &mut out);
    }
    out
}

/// Serialize one subtree, including the node itself.
pub fn write_subtree(tree: &DocTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

fn write_node(tree: &DocTree, id: NodeId, out: &mut String) {
    match tree.kind(id) {
        NodeKind::Text(text) => {
            out.push_str(&html_escape::encode_text(text));
        }
        NodeKind::Custom { tag, attrs, inner } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                let _ = write!(
                    out,
                    " {}=\"{}\"",
                    name,
                    html_escape::encode_double_quoted_attribute(value)
                );
            }
            if inner.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                out.push_str(inner);
                let _ = write!(out, "</{tag}>");
            }
        }
        NodeKind::Element { tag, styles } => match tag {
            Tag::Root => {
                for &child in tree.children(id) {
                    write_node(tree, child, out);
                }
            }
            Tag::Br => out.push_str("<br/>"),
            Tag::Span => {
                out.push_str("<span");
                if !styles.is_empty() {
                    let _ = write!(out, " style=\"{}\"", style_attribute(styles));
                }
                out.push('>');
                for &child in tree.children(id) {
                    write_node(tree, child, out);
                }
                out.push_str("</span>");
            }
            Tag::Block(block) => write_container(tree, id, block.as_name(), out),
            Tag::List(list) => write_container(tree, id, list.as_name(), out),
        },
    }
}

fn write_container(tree: &DocTree, id: NodeId, name: &str, out: &mut String) {
    let _ = write!(out, "<{name}>");
    for &child in tree.children(id) {
        write_node(tree, child, out);
    }
    let _ = write!(out, "</{name}>");
}

fn style_attribute(styles: &[StyleDecl]) -> String {
    styles.iter().map(ToString::to_string).collect()
}
