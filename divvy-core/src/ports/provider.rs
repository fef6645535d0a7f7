//! Remote system-of-record port
//!
//! The server is the sole arbiter of consistency across users; the core
//! talks to it only through these traits. Implementations are expected
//! to be blocking request/response round trips - there is one logical
//! thread of control per client session.

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{ExpenseEntry, Group, Invitation};

/// Group operations against the remote system of record
///
/// Every call runs on behalf of an authenticated user; the bearer
/// credential itself is an adapter concern.
pub trait GroupProvider: Send + Sync {
    /// All groups where the user is a member (owner or invited), in
    /// server order.
    fn fetch_groups(&self, user_id: Uuid) -> Result<Vec<Group>>;

    /// Create a group with the owner as sole initial member, emitting
    /// one invitation per email. Acceptance is asynchronous; the emails
    /// are fire-and-forget from the caller's perspective.
    fn create_group(&self, owner_id: Uuid, name: &str, invited_emails: &[String]) -> Result<Group>;

    /// Delete a group. The server rejects non-owner requesters; pending
    /// invitations for the group become moot.
    fn delete_group(&self, requester_id: Uuid, group_id: Uuid) -> Result<()>;

    /// Record a group expense. The split map must already be validated;
    /// the server re-checks it against its own member list and rejects
    /// stale submissions.
    fn add_expense(&self, requester_id: Uuid, entry: &ExpenseEntry) -> Result<()>;
}

/// Invitation operations against the remote system of record
pub trait InvitationProvider: Send + Sync {
    /// Pending invitations addressed to the user.
    fn fetch_pending_invitations(&self, user_id: Uuid) -> Result<Vec<Invitation>>;

    /// Confirm an invitation by its single-use token. On success the
    /// inviting group gains the user as a member with zero total paid.
    fn confirm_invitation(&self, user_id: Uuid, token: &str) -> Result<()>;

    /// Decline an invitation by id. No group mutation.
    fn decline_invitation(&self, user_id: Uuid, invitation_id: Uuid) -> Result<()>;
}
