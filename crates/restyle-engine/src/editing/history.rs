//! Bounded, linear undo/redo over whole-document snapshots.
//!
//! Snapshots are the serialized markup of the full document — cheap to
//! compare, trivially restorable through the parser, and impossible to
//! half-apply. The buffer is strictly linear: a new edit after an undo
//! discards every snapshot past the cursor.

/// Snapshot buffer with a movable cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    items: Vec<String>,
    index: usize,
    size: usize,
}

impl History {
    /// `size` is the maximum number of retained snapshots; at least one slot
    /// is always kept so the current state is representable.
    pub fn new(size: usize) -> Self {
        Self {
            items: Vec::new(),
            index: 0,
            size: size.max(1),
        }
    }

    /// Record a snapshot.
    ///
    /// No-op when it is textually identical to the snapshot at the cursor
    /// (coalesces no-op edits). Otherwise truncates the redo tail, appends,
    /// and evicts the oldest snapshot past the bound. Returns whether the
    /// buffer changed.
    pub fn update(&mut self, snapshot: &str) -> bool {
        if self.items.get(self.index).map(String::as_str) == Some(snapshot) {
            return false;
        }
        self.items.truncate(self.index + 1);
        self.items.push(snapshot.to_string());
        if self.items.len() > self.size {
            self.items.remove(0);
        }
        self.index = self.items.len() - 1;
        true
    }

    /// Step the cursor back and return the snapshot to restore, or `None`
    /// at the oldest retained state.
    pub fn undo(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(&self.items[self.index])
    }

    /// Step the cursor forward and return the snapshot to restore, or
    /// `None` at the newest state.
    pub fn redo(&mut self) -> Option<&str> {
        if self.index + 1 >= self.items.len() {
            return None;
        }
        self.index += 1;
        Some(&self.items[self.index])
    }

    /// Toolbar enablement is derived directly from the cursor.
    pub fn can_undo(&self) -> bool {
        self.items.len() > 1 && self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded(size: usize, snapshots: &[&str]) -> History {
        let mut history = History::new(size);
        for snapshot in snapshots {
            history.update(snapshot);
        }
        history
    }

    #[test]
    fn identical_snapshot_is_coalesced() {
        let mut history = seeded(10, &["a"]);
        assert!(!history.update("a"));
        assert_eq!(history.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn undo_then_redo_walks_the_line() {
        let mut history = seeded(10, &["a", "b", "c"]);

        assert_eq!(history.undo(), Some("b"));
        assert_eq!(history.undo(), Some("a"));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some("b"));
        assert_eq!(history.redo(), Some("c"));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn new_edit_after_undo_discards_redo_tail() {
        let mut history = seeded(10, &["a", "b", "c"]);
        history.undo();
        history.undo();

        assert!(history.update("d"));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some("a"));
        assert_eq!(history.redo(), Some("d"));
    }

    #[test]
    fn buffer_never_exceeds_bound() {
        let mut history = History::new(3);
        for snapshot in ["a", "b", "c", "d", "e"] {
            history.update(snapshot);
        }

        assert_eq!(history.len(), 3);
        // Undo bottoms out at the oldest retained snapshot, not "a".
        assert_eq!(history.undo(), Some("d"));
        assert_eq!(history.undo(), Some("c"));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn eviction_keeps_cursor_on_current_state() {
        let mut history = History::new(2);
        history.update("a");
        history.update("b");
        history.update("c");

        assert!(history.can_undo());
        assert_eq!(history.undo(), Some("b"));
        assert!(!history.can_undo());
    }

    #[test]
    fn size_plus_one_updates_allow_size_minus_one_undos() {
        // bufferSize 10, 12 paragraph insertions (after the initial seed):
        // only 9 undos succeed before the control reports disabled.
        let mut history = History::new(10);
        history.update("initial");
        for i in 0..12 {
            history.update(&format!("edit {i}"));
        }

        let mut successful = 0;
        for _ in 0..11 {
            if history.undo().is_some() {
                successful += 1;
            }
        }
        assert_eq!(successful, 9);
        assert!(!history.can_undo());
    }

    #[test]
    fn coalescing_after_undo_keeps_redo_tail() {
        let mut history = seeded(10, &["a", "b"]);
        history.undo();

        // Re-recording the state we are already on must not drop "b".
        assert!(!history.update("a"));
        assert!(history.can_redo());
        assert_eq!(history.redo(), Some("b"));
    }
}
