//! Control descriptors for host toolbars.
//!
//! A control pairs an engine operation with the capabilities it opts into.
//! Capabilities are declared, never inferred from which methods a plugin
//! happens to expose; hosts branch on the flags, the engine computes
//! enabled/active state from the document. Plugin business logic (dialogs,
//! uploads, comment threads) stays in the host.

use crate::dom::{BlockTag, FormatTag, ListTag, StyleDecl};
use crate::editing::{BlockTarget, StyleOp};
use crate::editor::Editor;

/// What a control does when pressed.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    /// Block-structure button: heading, list, paragraph, or reset.
    Block(BlockTarget),
    /// Inline style toggle.
    Style(StyleDecl),
    /// Strip every recognized inline style from the selection.
    ClearStyles,
    Undo,
    Redo,
    /// Atomic element plugin. The host runs its own dialog and calls
    /// [`Editor::insert_atomic`]; pressing through the engine is a no-op.
    Atomic { tag: String },
}

/// Capabilities a control declares explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Participates in format rewrites and reflects active state.
    pub formattable: bool,
    /// Renders a panel in the host sidebar.
    pub sidebarable: bool,
}

/// One toolbar entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub id: &'static str,
    pub kind: ControlKind,
    pub capabilities: Capabilities,
}

/// Render state of a control against the current document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
    pub active: bool,
}

impl Control {
    pub fn block(id: &'static str, target: BlockTarget) -> Self {
        Self {
            id,
            kind: ControlKind::Block(target),
            capabilities: Capabilities {
                formattable: true,
                sidebarable: false,
            },
        }
    }

    pub fn style(id: &'static str, decl: StyleDecl) -> Self {
        Self {
            id,
            kind: ControlKind::Style(decl),
            capabilities: Capabilities {
                formattable: true,
                sidebarable: false,
            },
        }
    }

    pub fn atomic(id: &'static str, tag: &str, sidebarable: bool) -> Self {
        Self {
            id,
            kind: ControlKind::Atomic {
                tag: tag.to_string(),
            },
            capabilities: Capabilities {
                formattable: false,
                sidebarable,
            },
        }
    }

    /// Compute enablement and active highlight for the current editor state.
    pub fn state(&self, editor: &Editor) -> ControlState {
        let has_selection = editor.selection().is_some();
        let is_caret = editor.selection().is_some_and(|s| s.is_caret());
        let format = editor.format_state();
        match &self.kind {
            ControlKind::Block(target) => ControlState {
                enabled: has_selection,
                active: matches!(target, BlockTarget::Tag(tag) if format.block == Some(*tag)),
            },
            ControlKind::Style(decl) => ControlState {
                enabled: has_selection && !is_caret,
                active: format.is_style_active(decl),
            },
            ControlKind::ClearStyles => ControlState {
                enabled: has_selection && !is_caret,
                active: false,
            },
            ControlKind::Undo => ControlState {
                enabled: editor.can_undo(),
                active: false,
            },
            ControlKind::Redo => ControlState {
                enabled: editor.can_redo(),
                active: false,
            },
            ControlKind::Atomic { .. } => ControlState {
                enabled: is_caret,
                active: false,
            },
        }
    }

    /// Run the control's engine operation. Atomic plugins return `false`;
    /// insertion goes through the host dialog instead.
    pub fn press(&self, editor: &mut Editor) -> bool {
        match &self.kind {
            ControlKind::Block(target) => editor.apply_block_format(*target),
            ControlKind::Style(decl) => editor.apply_inline_style(StyleOp::Toggle(decl.clone())),
            ControlKind::ClearStyles => editor.apply_inline_style(StyleOp::Clear),
            ControlKind::Undo => editor.undo(),
            ControlKind::Redo => editor.redo(),
            ControlKind::Atomic { .. } => false,
        }
    }
}

/// The stock toolbar: inline toggles, block targets, history, and the
/// standard atomic plugins.
pub fn standard_toolbar() -> Vec<Control> {
    vec![
        Control::style("bold", StyleDecl::bold()),
        Control::style("italic", StyleDecl::italic()),
        Control::style("underline", StyleDecl::underline()),
        Control {
            id: "clear-styles",
            kind: ControlKind::ClearStyles,
            capabilities: Capabilities {
                formattable: true,
                sidebarable: false,
            },
        },
        Control::block("heading-1", BlockTarget::Tag(FormatTag::Block(BlockTag::H1))),
        Control::block("heading-2", BlockTarget::Tag(FormatTag::Block(BlockTag::H2))),
        Control::block("blockquote", BlockTarget::Tag(FormatTag::Block(BlockTag::Blockquote))),
        Control::block("ordered-list", BlockTarget::Tag(FormatTag::List(ListTag::Ol))),
        Control::block("unordered-list", BlockTarget::Tag(FormatTag::List(ListTag::Ul))),
        Control::block("paragraph", BlockTarget::Clear),
        Control {
            id: "undo",
            kind: ControlKind::Undo,
            capabilities: Capabilities::default(),
        },
        Control {
            id: "redo",
            kind: ControlKind::Redo,
            capabilities: Capabilities::default(),
        },
        Control::atomic("link", "x-link", false),
        Control::atomic("image", "x-image", false),
        Control::atomic("comment", "x-comment", true),
        Control::atomic("action", "x-action", true),
        Control::atomic("mention", "x-mention", false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;
    use crate::editing::HostSelection;
    use pretty_assertions::assert_eq;

    fn editor(markup: &str) -> Editor {
        Editor::from_markup(markup).unwrap()
    }

    fn first_text(editor: &Editor) -> NodeId {
        let tree = editor.tree();
        tree.descendants(tree.root())
            .into_iter()
            .find(|&n| tree.is_text(n))
            .unwrap()
    }

    #[test]
    fn style_control_needs_a_non_collapsed_selection() {
        let mut editor = editor("<p>word</p>");
        let bold = Control::style("bold", StyleDecl::bold());
        assert!(!bold.state(&editor).enabled);

        let leaf = first_text(&editor);
        editor.set_cursor(leaf, 2);
        assert!(!bold.state(&editor).enabled);

        editor.set_selection(HostSelection::new((leaf, 0), (leaf, 4)));
        assert!(bold.state(&editor).enabled);
        assert!(!bold.state(&editor).active);
    }

    #[test]
    fn pressing_a_style_control_toggles_active() {
        let mut editor = editor("<p>word</p>");
        let leaf = first_text(&editor);
        editor.set_selection(HostSelection::new((leaf, 0), (leaf, 4)));

        let bold = Control::style("bold", StyleDecl::bold());
        assert!(bold.press(&mut editor));
        assert!(bold.state(&editor).active);

        assert!(bold.press(&mut editor));
        assert!(!bold.state(&editor).active);
    }

    #[test]
    fn block_control_highlights_the_covering_format() {
        let mut editor = editor("<h2>title</h2><p>body</p>");
        let heading = Control::block("heading-2", BlockTarget::Tag(FormatTag::Block(BlockTag::H2)));

        let title = first_text(&editor);
        editor.set_cursor(title, 0);
        assert!(heading.state(&editor).active);

        let tree = editor.tree();
        let body = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|&n| tree.is_text(n))
            .nth(1)
            .unwrap();
        editor.set_cursor(body, 0);
        assert!(!heading.state(&editor).active);
    }

    #[test]
    fn undo_control_tracks_history() {
        let mut editor = editor("<p>a</p>");
        let undo = Control {
            id: "undo",
            kind: ControlKind::Undo,
            capabilities: Capabilities::default(),
        };
        assert!(!undo.state(&editor).enabled);

        editor.insert_paragraph("b");
        assert!(undo.state(&editor).enabled);
        assert!(undo.press(&mut editor));
        assert!(!undo.state(&editor).enabled);
    }

    #[test]
    fn atomic_controls_never_press_through_the_engine() {
        let mut editor = editor("<p>a</p>");
        let link = Control::atomic("link", "x-link", false);

        assert!(!link.state(&editor).enabled);
        let leaf = first_text(&editor);
        editor.set_cursor(leaf, 1);
        assert!(link.state(&editor).enabled);
        assert!(!link.press(&mut editor));
    }

    #[test]
    fn capabilities_are_declared_not_inferred() {
        let toolbar = standard_toolbar();
        let comment = toolbar.iter().find(|c| c.id == "comment").unwrap();
        let image = toolbar.iter().find(|c| c.id == "image").unwrap();

        assert!(comment.capabilities.sidebarable);
        assert!(!comment.capabilities.formattable);
        assert!(!image.capabilities.sidebarable);
        assert_eq!(toolbar.len(), 17);
    }
}
