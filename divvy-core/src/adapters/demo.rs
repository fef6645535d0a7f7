//! Demo provider - in-memory stand-in for the remote system of record
//!
//! Backs demo mode and the integration tests ("network IO is mocked at
//! the trait level"). It enforces the same rules the real server does:
//! invitation tokens are single-use, only owners delete groups, stale
//! expense submissions are rejected, and deleting a group cascades to
//! its pending invitations.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::warn;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{ExpenseEntry, Group, Invitation, InvitationStatus, SessionUser};
use crate::ports::{GroupProvider, InvitationProvider};
use crate::services::{ledger, split};

/// An invitation together with its addressee (server-side knowledge the
/// wire contract never exposes)
#[derive(Debug, Clone)]
struct StoredInvitation {
    invitation: Invitation,
    recipient_email: String,
}

#[derive(Debug, Default)]
struct DemoState {
    users: Vec<SessionUser>,
    groups: Vec<Group>,
    invitations: Vec<StoredInvitation>,
}

/// In-memory implementation of the remote system-of-record ports
#[derive(Debug, Default)]
pub struct DemoProvider {
    state: Mutex<DemoState>,
}

impl DemoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user account, as the external auth collaborator would.
    ///
    /// Pass explicit ids in tests for determinism.
    pub fn register_user(&self, user: SessionUser) {
        let mut state = self.state();
        if state.users.iter().any(|u| u.id == user.id) {
            return;
        }
        state.users.push(user);
    }

    fn state(&self) -> MutexGuard<'_, DemoState> {
        // Recover rather than propagate poisoning: demo state is only
        // poisoned if a test panicked mid-operation.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn mint_token() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect()
    }
}

impl DemoState {
    fn user(&self, user_id: Uuid) -> Result<&SessionUser> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| Error::not_found(format!("user {}", user_id)))
    }

    fn user_by_email(&self, email: &str) -> Option<&SessionUser> {
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    fn has_pending_invitation(&self, group_id: Uuid, email: &str) -> bool {
        self.invitations.iter().any(|s| {
            s.invitation.group_id == group_id
                && s.invitation.is_pending()
                && s.recipient_email.eq_ignore_ascii_case(email)
        })
    }
}

impl GroupProvider for DemoProvider {
    fn fetch_groups(&self, user_id: Uuid) -> Result<Vec<Group>> {
        let state = self.state();
        state.user(user_id)?;
        Ok(state
            .groups
            .iter()
            .filter(|g| g.is_member(user_id))
            .cloned()
            .collect())
    }

    fn create_group(&self, owner_id: Uuid, name: &str, invited_emails: &[String]) -> Result<Group> {
        let mut state = self.state();
        let owner = state.user(owner_id)?.clone();

        let group = Group::new(Uuid::new_v4(), name, owner.id, owner.username.clone());
        group.validate()?;

        // Invitations are fire-and-forget: an address that cannot be
        // invited is skipped, not a failure of the whole creation.
        for email in invited_emails {
            let invitee = match state.user_by_email(email) {
                Some(user) => user.clone(),
                None => {
                    warn!(%email, "no account for invited email; skipping");
                    continue;
                }
            };
            if group.is_member(invitee.id) {
                warn!(%email, "already a member; skipping");
                continue;
            }
            if state.has_pending_invitation(group.id, email) {
                warn!(%email, "already holds a pending invitation; skipping");
                continue;
            }
            state.invitations.push(StoredInvitation {
                invitation: Invitation {
                    id: Uuid::new_v4(),
                    token: Self::mint_token(),
                    group_id: group.id,
                    group_name: group.name.clone(),
                    invited_by_name: owner.username.clone(),
                    invited_by_email: owner.email.clone(),
                    status: InvitationStatus::Pending,
                    invited_at: Utc::now(),
                },
                recipient_email: email.clone(),
            });
        }

        state.groups.push(group.clone());
        Ok(group)
    }

    fn delete_group(&self, requester_id: Uuid, group_id: Uuid) -> Result<()> {
        let mut state = self.state();
        let group = state
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .ok_or_else(|| Error::not_found(format!("group {}", group_id)))?;
        if group.owner_id != requester_id {
            return Err(Error::authorization("only the owner may delete a group"));
        }

        state.groups.retain(|g| g.id != group_id);
        // Cascade: pending invitations for the group become moot
        state
            .invitations
            .retain(|s| !(s.invitation.group_id == group_id && s.invitation.is_pending()));
        Ok(())
    }

    fn add_expense(&self, requester_id: Uuid, entry: &ExpenseEntry) -> Result<()> {
        let mut state = self.state();
        state.user(requester_id)?;
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == entry.group_id)
            .ok_or_else(|| Error::conflict("group no longer exists"))?;
        if !group.is_member(requester_id) {
            return Err(Error::authorization("not a member of this group"));
        }

        // Re-check the split against the server's member list: a client
        // that validated against a stale snapshot gets a conflict.
        if let Err(e) = split::validate_manual_split(entry.amount, &group.member_ids(), &entry.split_map)
        {
            return Err(Error::conflict(format!("expense rejected: {}", e)));
        }

        ledger::apply_expense(group, entry)
    }
}

impl InvitationProvider for DemoProvider {
    fn fetch_pending_invitations(&self, user_id: Uuid) -> Result<Vec<Invitation>> {
        let state = self.state();
        let user = state.user(user_id)?;
        Ok(state
            .invitations
            .iter()
            .filter(|s| {
                s.invitation.is_pending() && s.recipient_email.eq_ignore_ascii_case(&user.email)
            })
            .map(|s| s.invitation.clone())
            .collect())
    }

    fn confirm_invitation(&self, user_id: Uuid, token: &str) -> Result<()> {
        let mut state = self.state();
        let user = state.user(user_id)?.clone();

        let idx = state
            .invitations
            .iter()
            .position(|s| s.invitation.token == token)
            .ok_or_else(|| Error::not_found("invitation token"))?;

        if !state.invitations[idx]
            .recipient_email
            .eq_ignore_ascii_case(&user.email)
        {
            return Err(Error::authorization("this invitation was addressed to someone else"));
        }
        if !state.invitations[idx].invitation.is_pending() {
            return Err(Error::conflict("invitation token was already used"));
        }

        let group_id = state.invitations[idx].invitation.group_id;
        let group = state
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| Error::conflict("the inviting group no longer exists"))?;

        // Membership first; only then consume the token
        group.add_member(user.id, user.username.clone())?;
        state.invitations[idx].invitation.accept()
    }

    fn decline_invitation(&self, user_id: Uuid, invitation_id: Uuid) -> Result<()> {
        let mut state = self.state();
        let user = state.user(user_id)?.clone();

        let stored = state
            .invitations
            .iter_mut()
            .find(|s| s.invitation.id == invitation_id)
            .ok_or_else(|| Error::not_found(format!("invitation {}", invitation_id)))?;

        if !stored.recipient_email.eq_ignore_ascii_case(&user.email) {
            return Err(Error::authorization("this invitation was addressed to someone else"));
        }
        stored.invitation.decline()
    }
}
