//! Fixture-driven rewrite snapshots.
//!
//! Each test loads a markup fixture from `tests/fixtures/`, runs one
//! formatting operation through the editor facade, checks the structural
//! invariants of the rewritten tree, and snapshots its normalized form.

use restyle_engine::snapshot;
use restyle_engine::{
    BlockTarget, Editor, FormatTag, HostSelection, ListTag, StyleDecl, StyleOp,
};

#[test]
fn fixture_bold_toggle() {
    assert_fixture("bold_toggle", |editor| {
        select_text(editor, 6, 11);
        assert!(editor.apply_inline_style(StyleOp::Toggle(StyleDecl::bold())));
    });
}

#[test]
fn fixture_heading_to_list() {
    assert_fixture("heading_to_list", |editor| {
        select_text(editor, 0, 5);
        assert!(editor.apply_block_format(BlockTarget::Tag(FormatTag::List(ListTag::Ol))));
    });
}

#[test]
fn fixture_merge_into_list() {
    assert_fixture("merge_into_list", |editor| {
        select_text(editor, 0, 9);
        assert!(editor.apply_block_format(BlockTarget::Tag(FormatTag::List(ListTag::Ul))));
    });
}

#[test]
fn fixture_clear_nested_styles() {
    assert_fixture("clear_nested_styles", |editor| {
        select_text(editor, 0, 4);
        assert!(editor.apply_inline_style(StyleOp::Clear));
    });
}

#[test]
fn fixture_atomic_in_list() {
    assert_fixture("atomic_in_list", |editor| {
        select_text(editor, 0, 3);
        assert!(editor.apply_block_format(BlockTarget::Tag(FormatTag::List(ListTag::Ol))));
    });
}

fn assert_fixture(name: &str, op: impl FnOnce(&mut Editor)) {
    let path = format!("{}/tests/fixtures/{name}.html", env!("CARGO_MANIFEST_DIR"));
    let markup = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read fixture {path}: {err}"));
    let mut editor = Editor::from_markup(markup.trim()).unwrap();

    op(&mut editor);
    snapshot::invariants(editor.tree());

    let snap = snapshot::normalize(editor.tree());
    insta::assert_yaml_snapshot!(name, snap);
}

/// Select by offsets into the document's visible text, as a host would.
fn select_text(editor: &mut Editor, start: usize, end: usize) {
    let tree = editor.tree();
    let anchor = tree.locate_text_offset(tree.root(), start).unwrap();
    let focus = tree.locate_text_offset(tree.root(), end).unwrap();
    assert!(editor.set_selection(HostSelection::new(anchor, focus)));
}
