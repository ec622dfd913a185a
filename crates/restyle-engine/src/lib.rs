pub mod controls;
pub mod dom;
pub mod editing;
pub mod editor;
pub mod markup;
pub mod snapshot;

// Re-export key types for easier usage
pub use dom::{BlockTag, DocTree, FormatTag, ListTag, NodeId, StyleDecl, StyleProperty, Tag};
pub use editing::{BlockTarget, EditRange, History, HostSelection, Phase, StyleOp};
pub use editor::{Editor, EditorOptions, FormatState};
pub use markup::{parse_fragment, write_markup, CustomTags, ParseError};
