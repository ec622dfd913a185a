/*!
 * # Editing Core
 *
 * The selection-aware format rewriting engine. Everything here operates on
 * the plain [`crate::dom::DocTree`] value — no rendering host in sight:
 *
 * - **`range`**: normalizes the host's raw anchor/focus selection into an
 *   [`EditRange`] with editor-derived metadata (block parent, atomic-leaf
 *   anchor). Rebuilt per interaction, never persisted.
 * - **`phase`**: the single-pass classifier that tells a tree walk where it
 *   stands relative to the selection boundaries (pre/first/during/both/
 *   last/post). Monotonic within one rewrite call.
 * - **`block`**: rewrites the block/list structure spanned by a selection.
 * - **`style`**: rewrites inline style runs spanned by a selection.
 * - **`markers`**: carries the selection through a destructive rewrite as
 *   explicit (node, offset) coordinates and resolves it against the new
 *   tree. Fails soft: a lost boundary degrades to an empty selection.
 * - **`history`**: the bounded, linear undo/redo buffer over whole-document
 *   markup snapshots.
 *
 * Error propagation is local and non-exceptional throughout: a rewrite that
 * cannot resolve its preconditions returns `None` and leaves the document
 * untouched; the caller skips the dependent steps (reselection, snapshot).
 */

pub mod block;
pub mod history;
pub mod markers;
pub mod phase;
pub mod range;
pub mod style;

pub use block::BlockTarget;
pub use history::History;
pub use markers::MarkerSet;
pub use phase::{Phase, PhaseTracker};
pub use range::{EditRange, HostSelection};
pub use style::StyleOp;

/// Result of a completed rewrite: where the user's selection landed in the
/// rebuilt tree. `None` means reselection failed soft and the shell should
/// show no selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub selection: Option<HostSelection>,
}
