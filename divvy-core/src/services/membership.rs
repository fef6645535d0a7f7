//! Membership workflow - the invitation inbox
//!
//! Invitations move `Pending -> Accepted | Declined`, both terminal. The
//! service keeps the local inbox and prunes an entry only AFTER the
//! remote confirmation succeeds; a failed round trip leaves the inbox
//! exactly as it was, so nothing is ever dropped speculatively.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Invitation, SessionUser};
use crate::ports::InvitationProvider;

/// Invitation inbox for the session user
pub struct MembershipService {
    provider: Arc<dyn InvitationProvider>,
    session: SessionUser,
    pending: Vec<Invitation>,
}

impl MembershipService {
    pub fn new(provider: Arc<dyn InvitationProvider>, session: SessionUser) -> Self {
        Self {
            provider,
            session,
            pending: Vec::new(),
        }
    }

    /// Refetch the pending inbox from the server
    ///
    /// Terminal invitations never linger in the inbox: an accepted one is
    /// folded into group membership and a declined one is simply gone.
    pub fn refresh(&mut self) -> Result<&[Invitation]> {
        let fetched = self.provider.fetch_pending_invitations(self.session.id)?;
        self.pending = fetched.into_iter().filter(Invitation::is_pending).collect();
        debug!(count = self.pending.len(), "refreshed invitation inbox");
        Ok(&self.pending)
    }

    /// The locally-held pending invitations, in server order
    pub fn pending(&self) -> &[Invitation] {
        &self.pending
    }

    /// Accept an invitation by presenting its single-use token.
    ///
    /// On success the inviting group has gained the session user as a
    /// member (with zero total paid) on the server side; callers should
    /// refetch their group list to see it. The inbox entry is removed
    /// only after the server confirms.
    pub fn accept(&mut self, invitation_id: Uuid) -> Result<()> {
        let invitation = self.find_pending(invitation_id)?;
        let token = invitation.token.clone();
        let group_name = invitation.group_name.clone();

        self.provider.confirm_invitation(self.session.id, &token)?;

        // Prune after success, never before
        self.pending.retain(|inv| inv.id != invitation_id);
        info!(%invitation_id, group = %group_name, "invitation accepted");
        Ok(())
    }

    /// Decline an invitation. No group mutation, locally or remotely.
    pub fn decline(&mut self, invitation_id: Uuid) -> Result<()> {
        let invitation = self.find_pending(invitation_id)?;
        let group_name = invitation.group_name.clone();

        self.provider.decline_invitation(self.session.id, invitation_id)?;

        self.pending.retain(|inv| inv.id != invitation_id);
        info!(%invitation_id, group = %group_name, "invitation declined");
        Ok(())
    }

    fn find_pending(&self, invitation_id: Uuid) -> Result<&Invitation> {
        self.pending
            .iter()
            .find(|inv| inv.id == invitation_id)
            .ok_or_else(|| Error::not_found(format!("invitation {}", invitation_id)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::domain::InvitationStatus;

    /// Trait-level fake: scripted outcomes, no network
    struct ScriptedProvider {
        inbox: Vec<Invitation>,
        confirm_outcome: Mutex<Option<Error>>,
        confirmed_tokens: Mutex<Vec<String>>,
        declined_ids: Mutex<Vec<Uuid>>,
    }

    impl ScriptedProvider {
        fn new(inbox: Vec<Invitation>) -> Self {
            Self {
                inbox,
                confirm_outcome: Mutex::new(None),
                confirmed_tokens: Mutex::new(Vec::new()),
                declined_ids: Mutex::new(Vec::new()),
            }
        }

        fn fail_next_confirm(&self, err: Error) {
            *self.confirm_outcome.lock().unwrap() = Some(err);
        }
    }

    impl InvitationProvider for ScriptedProvider {
        fn fetch_pending_invitations(&self, _user_id: Uuid) -> Result<Vec<Invitation>> {
            Ok(self.inbox.clone())
        }

        fn confirm_invitation(&self, _user_id: Uuid, token: &str) -> Result<()> {
            if let Some(err) = self.confirm_outcome.lock().unwrap().take() {
                return Err(err);
            }
            self.confirmed_tokens.lock().unwrap().push(token.to_string());
            Ok(())
        }

        fn decline_invitation(&self, _user_id: Uuid, invitation_id: Uuid) -> Result<()> {
            self.declined_ids.lock().unwrap().push(invitation_id);
            Ok(())
        }
    }

    fn invitation(group_name: &str) -> Invitation {
        Invitation {
            id: Uuid::new_v4(),
            token: format!("tok-{}", Uuid::new_v4()),
            group_id: Uuid::new_v4(),
            group_name: group_name.to_string(),
            invited_by_name: "ana".to_string(),
            invited_by_email: "ana@example.com".to_string(),
            status: InvitationStatus::Pending,
            invited_at: Utc::now(),
        }
    }

    fn session() -> SessionUser {
        SessionUser::new(Uuid::new_v4(), "bo", "bo@example.com")
    }

    #[test]
    fn test_refresh_drops_terminal_invitations() {
        let mut accepted = invitation("Old trip");
        accepted.status = InvitationStatus::Accepted;
        let pending = invitation("Flat");
        let provider = Arc::new(ScriptedProvider::new(vec![accepted, pending.clone()]));

        let mut svc = MembershipService::new(provider, session());
        svc.refresh().unwrap();
        assert_eq!(svc.pending(), &[pending]);
    }

    #[test]
    fn test_accept_prunes_after_success() {
        let inv = invitation("Flat");
        let provider = Arc::new(ScriptedProvider::new(vec![inv.clone()]));
        let mut svc = MembershipService::new(provider.clone(), session());
        svc.refresh().unwrap();

        svc.accept(inv.id).unwrap();
        assert!(svc.pending().is_empty());
        assert_eq!(*provider.confirmed_tokens.lock().unwrap(), vec![inv.token]);
    }

    #[test]
    fn test_accept_failure_leaves_inbox_untouched() {
        let inv = invitation("Flat");
        let provider = Arc::new(ScriptedProvider::new(vec![inv.clone()]));
        let mut svc = MembershipService::new(provider.clone(), session());
        svc.refresh().unwrap();

        provider.fail_next_confirm(Error::conflict("token already used"));
        let err = svc.accept(inv.id).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // The inbox is only pruned on confirmed success
        assert_eq!(svc.pending().len(), 1);
    }

    #[test]
    fn test_accept_unknown_invitation_is_not_found() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let mut svc = MembershipService::new(provider, session());
        svc.refresh().unwrap();

        assert!(matches!(svc.accept(Uuid::new_v4()), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_decline_prunes_only_the_declined_entry() {
        let keep = invitation("Flat");
        let drop = invitation("Trip");
        let provider = Arc::new(ScriptedProvider::new(vec![keep.clone(), drop.clone()]));
        let mut svc = MembershipService::new(provider.clone(), session());
        svc.refresh().unwrap();

        svc.decline(drop.id).unwrap();
        assert_eq!(svc.pending(), &[keep]);
        assert_eq!(*provider.declined_ids.lock().unwrap(), vec![drop.id]);
    }
}
