//! Group invitation domain model
//!
//! An invitation is a single-use, token-bearing offer of membership. It
//! moves from `Pending` to exactly one of the terminal states and is
//! never reused afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

/// Lifecycle state of an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl InvitationStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A pending (or resolved) offer of group membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    /// Opaque single-use credential presented to confirm acceptance.
    pub token: String,
    pub group_id: Uuid,
    /// Denormalized for display; the group itself may since have vanished.
    pub group_name: String,
    pub invited_by_name: String,
    pub invited_by_email: String,
    pub status: InvitationStatus,
    pub invited_at: DateTime<Utc>,
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Transition to `Accepted`; fails on any non-pending state
    pub fn accept(&mut self) -> Result<()> {
        self.transition(InvitationStatus::Accepted)
    }

    /// Transition to `Declined`; fails on any non-pending state
    pub fn decline(&mut self) -> Result<()> {
        self.transition(InvitationStatus::Declined)
    }

    fn transition(&mut self, next: InvitationStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::conflict(format!(
                "invitation to '{}' was already {}",
                self.group_name,
                match self.status {
                    InvitationStatus::Accepted => "accepted",
                    InvitationStatus::Declined => "declined",
                    InvitationStatus::Pending => unreachable!(),
                }
            )));
        }
        self.status = next;
        Ok(())
    }
}
