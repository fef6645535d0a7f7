//! Group and member domain models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;
use crate::domain::result::{Error, Result};

/// A user's participation record within a group
///
/// Owned by its group: members are created through accepted invitations
/// and destroyed with the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: Uuid,
    pub display_name: String,
    /// Cumulative amount this member has contributed across all applied
    /// expenses. Starts at zero when membership is established.
    pub total_paid: Money,
}

impl Member {
    pub fn new(member_id: Uuid, display_name: impl Into<String>) -> Self {
        Self {
            member_id,
            display_name: display_name.into(),
            total_paid: Money::ZERO,
        }
    }
}

/// A named collection of members sharing expenses, with one owner
///
/// Member order is insertion order: the owner is always the first member,
/// and invited members are appended as their invitations are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    /// Creator of the group; the only user allowed to delete it.
    pub owner_id: Uuid,
    pub members: Vec<Member>,
}

impl Group {
    /// Create a group with the owner as its sole initial member
    pub fn new(id: Uuid, name: impl Into<String>, owner_id: Uuid, owner_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id,
            members: vec![Member::new(owner_id, owner_name)],
        }
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|m| m.member_id == user_id)
    }

    pub fn member(&self, member_id: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.member_id == member_id)
    }

    pub fn member_mut(&mut self, member_id: Uuid) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.member_id == member_id)
    }

    /// Member ids in display (insertion) order
    pub fn member_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.member_id).collect()
    }

    /// Add a member established through an accepted invitation
    ///
    /// New members start with `total_paid = 0`.
    pub fn add_member(&mut self, member_id: Uuid, display_name: impl Into<String>) -> Result<()> {
        if self.is_member(member_id) {
            return Err(Error::conflict(format!(
                "user {} is already a member of group '{}'",
                member_id, self.name
            )));
        }
        self.members.push(Member::new(member_id, display_name));
        Ok(())
    }

    /// Check structural invariants: unique member ids, owner is a member
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("group name cannot be empty"));
        }
        for (i, member) in self.members.iter().enumerate() {
            if self.members[..i].iter().any(|m| m.member_id == member.member_id) {
                return Err(Error::validation(format!(
                    "duplicate member id {} in group '{}'",
                    member.member_id, self.name
                )));
            }
        }
        if !self.is_member(self.owner_id) {
            return Err(Error::validation(format!(
                "owner {} is not a member of group '{}'",
                self.owner_id, self.name
            )));
        }
        Ok(())
    }
}
