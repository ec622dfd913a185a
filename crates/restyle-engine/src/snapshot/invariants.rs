use crate::dom::{BlockTag, DocTree, NodeId, NodeKind, Tag};

/// Assert the structural invariants every (rewritten) document must hold.
/// Panics on violation; intended for test assertions, not production paths.
pub fn check(tree: &DocTree) {
    check_node(tree, tree.root());
}

fn check_node(tree: &DocTree, node: NodeId) {
    for &child in tree.children(node) {
        assert_eq!(
            tree.parent(child),
            Some(node),
            "child/parent links must agree"
        );
        check_node(tree, child);
    }
    match tree.kind(node) {
        NodeKind::Element {
            tag: Tag::Span,
            styles,
        } => {
            for (at, decl) in styles.iter().enumerate() {
                assert!(
                    styles[..at].iter().all(|d| d.property != decl.property),
                    "style runs carry one declaration per property"
                );
            }
        }
        NodeKind::Element {
            tag: Tag::List(_), ..
        } => {
            for &child in tree.children(node) {
                assert!(
                    matches!(
                        tree.tag(child),
                        Some(Tag::Block(BlockTag::Li)) | Some(Tag::List(_))
                    ),
                    "list containers hold only items and nested lists"
                );
            }
        }
        NodeKind::Element { tag: Tag::Br, .. } | NodeKind::Text(_) | NodeKind::Custom { .. } => {
            assert!(tree.children(node).is_empty(), "leaves are childless");
        }
        NodeKind::Element { .. } => {}
    }
}
