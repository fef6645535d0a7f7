//! Selection focus - the single group currently being viewed or edited
//!
//! Holds a group ID, never a group object: the focus is resolved against
//! the caller's current snapshot on every read, so a stale cached group
//! can never diverge from the authoritative list.

use uuid::Uuid;

use crate::domain::Group;

/// Single-slot focus; setting replaces any prior value, no history
#[derive(Debug, Clone, Default)]
pub struct SelectionFocus {
    focused: Option<Uuid>,
}

impl SelectionFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus a group by id, replacing any prior focus
    pub fn focus(&mut self, group_id: Uuid) {
        self.focused = Some(group_id);
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }

    pub fn focused_id(&self) -> Option<Uuid> {
        self.focused
    }

    /// Resolve the focus against the current snapshot.
    ///
    /// `None` means "no group selected" - either nothing is focused or
    /// the focused group no longer exists in the snapshot (deleted or
    /// membership revoked since focusing). Consumers must branch on this
    /// explicitly; there is no default group.
    pub fn focused<'a>(&self, groups: &'a [Group]) -> Option<&'a Group> {
        let id = self.focused?;
        groups.iter().find(|g| g.id == id)
    }
}
