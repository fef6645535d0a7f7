//! Group registry - create/list/delete groups and record shared expenses
//!
//! All mutations are round trips to the remote system of record; local
//! state is only ever touched after the server acknowledges the write.

use std::collections::BTreeMap;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Category, ExpenseEntry, Group, Money, SessionUser, SplitPolicy};
use crate::ports::GroupProvider;
use crate::services::{ledger, split};

/// Caller-facing description of an expense before the split is resolved
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: Money,
    pub date: DateTime<Utc>,
    pub category: Category,
    pub split: SplitInput,
}

/// How the draft's amount should be divided
#[derive(Debug, Clone)]
pub enum SplitInput {
    /// Evenly across all members, remainder to the first (the owner).
    Equal,
    /// Exact per-member contributions supplied by the caller.
    Manual(BTreeMap<Uuid, Money>),
}

/// Group operations on behalf of the session user
pub struct GroupService {
    provider: Arc<dyn GroupProvider>,
    session: SessionUser,
}

impl GroupService {
    pub fn new(provider: Arc<dyn GroupProvider>, session: SessionUser) -> Self {
        Self { provider, session }
    }

    /// All groups the session user belongs to, in server order.
    ///
    /// The returned snapshot is the authoritative view; callers resolve
    /// any focused group against it rather than caching group objects.
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        let groups = self.provider.fetch_groups(self.session.id)?;
        debug!(count = groups.len(), "fetched groups");
        Ok(groups)
    }

    /// Create a group owned by the session user, inviting `emails`.
    ///
    /// Invitation delivery is fire-and-forget; acceptance happens
    /// asynchronously through the membership workflow.
    pub fn create_group(&self, name: &str, emails: &[String]) -> Result<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("group name is required"));
        }

        let mut invited: Vec<String> = Vec::new();
        for email in emails {
            let email = email.trim().to_ascii_lowercase();
            if email.is_empty() {
                continue;
            }
            if email == self.session.email.to_ascii_lowercase() {
                return Err(Error::validation("you are already a member of your own group"));
            }
            if invited.contains(&email) {
                return Err(Error::validation(format!("{} is already added", email)));
            }
            invited.push(email);
        }

        let group = self.provider.create_group(self.session.id, name, &invited)?;
        info!(group = %group.id, invited = invited.len(), "created group");
        Ok(group)
    }

    /// Delete a group. Only the owner may do this; the check runs locally
    /// against the snapshot before any network call, and the server
    /// enforces the same rule against its own state.
    pub fn delete_group(&self, group: &Group) -> Result<()> {
        if group.owner_id != self.session.id {
            return Err(Error::authorization(format!(
                "only the owner may delete group '{}'",
                group.name
            )));
        }
        self.provider.delete_group(self.session.id, group.id)?;
        info!(group = %group.id, "deleted group");
        Ok(())
    }

    /// Record a shared expense against `group` and fold it into the
    /// local snapshot's ledger.
    ///
    /// Validation happens entirely before the network call; the ledger
    /// projection is applied only after the server acknowledges the
    /// write, so a rejected or failed round trip leaves `group`
    /// untouched. The projection is advisory - a refetch of the group
    /// list supersedes it.
    pub fn add_expense(&self, group: &mut Group, draft: ExpenseDraft) -> Result<ExpenseEntry> {
        if !group.is_member(self.session.id) {
            return Err(Error::authorization(format!(
                "not a member of group '{}'",
                group.name
            )));
        }

        let member_ids = group.member_ids();
        let (policy, split_map) = match draft.split {
            SplitInput::Equal => (SplitPolicy::Equal, split::equal_split(draft.amount, &member_ids)?),
            SplitInput::Manual(map) => {
                split::validate_manual_split(draft.amount, &member_ids, &map)?;
                (SplitPolicy::Manual, map)
            }
        };

        let entry = ExpenseEntry {
            group_id: group.id,
            description: draft.description,
            amount: draft.amount,
            date: draft.date,
            category: draft.category,
            split: policy,
            split_map,
        };
        entry.validate_fields(Utc::now())?;

        self.provider.add_expense(self.session.id, &entry)?;

        // The server accepted the write; if the local projection fails
        // now the snapshot is stale, not the server. Surface the error
        // so the caller refetches instead of retrying the mutation.
        if let Err(e) = ledger::apply_expense(group, &entry) {
            warn!(group = %group.id, error = %e, "projection failed after confirmed write; refetch required");
            return Err(e);
        }
        info!(group = %group.id, amount = %entry.amount, "recorded group expense");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::Member;

    /// Trait-level fake recording calls and scripting failures
    struct ScriptedProvider {
        groups: Mutex<Vec<Group>>,
        fail_add_expense: Mutex<Option<Error>>,
        deleted: Mutex<Vec<Uuid>>,
        recorded: Mutex<Vec<ExpenseEntry>>,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            Self {
                groups: Mutex::new(Vec::new()),
                fail_add_expense: Mutex::new(None),
                deleted: Mutex::new(Vec::new()),
                recorded: Mutex::new(Vec::new()),
            }
        }
    }

    impl GroupProvider for ScriptedProvider {
        fn fetch_groups(&self, user_id: Uuid) -> Result<Vec<Group>> {
            Ok(self
                .groups
                .lock()
                .unwrap()
                .iter()
                .filter(|g| g.is_member(user_id))
                .cloned()
                .collect())
        }

        fn create_group(&self, owner_id: Uuid, name: &str, _emails: &[String]) -> Result<Group> {
            let group = Group::new(Uuid::new_v4(), name, owner_id, "owner");
            self.groups.lock().unwrap().push(group.clone());
            Ok(group)
        }

        fn delete_group(&self, _requester_id: Uuid, group_id: Uuid) -> Result<()> {
            self.deleted.lock().unwrap().push(group_id);
            Ok(())
        }

        fn add_expense(&self, _requester_id: Uuid, entry: &ExpenseEntry) -> Result<()> {
            if let Some(err) = self.fail_add_expense.lock().unwrap().take() {
                return Err(err);
            }
            self.recorded.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    fn money(minor: i64) -> Money {
        Money::from_minor_units(minor).unwrap()
    }

    fn session() -> SessionUser {
        SessionUser::new(Uuid::new_v4(), "ana", "ana@example.com")
    }

    fn service() -> (GroupService, Arc<ScriptedProvider>, SessionUser) {
        let provider = Arc::new(ScriptedProvider::new());
        let session = session();
        (
            GroupService::new(provider.clone(), session.clone()),
            provider,
            session,
        )
    }

    fn draft(amount: Money, split: SplitInput) -> ExpenseDraft {
        ExpenseDraft {
            description: "Dinner".to_string(),
            amount,
            date: Utc::now(),
            category: Category::Food,
            split,
        }
    }

    #[test]
    fn test_create_group_trims_and_validates_name() {
        let (svc, _, _) = service();
        assert!(matches!(svc.create_group("   ", &[]), Err(Error::Validation(_))));
        let group = svc.create_group("  Flat 12b  ", &[]).unwrap();
        assert_eq!(group.name, "Flat 12b");
    }

    #[test]
    fn test_create_group_rejects_duplicate_and_own_email() {
        let (svc, _, _) = service();
        let dup = ["bo@example.com".to_string(), "Bo@Example.com".to_string()];
        assert!(svc.create_group("Flat", &dup).is_err());

        let own = ["ana@example.com".to_string()];
        assert!(svc.create_group("Flat", &own).is_err());
    }

    #[test]
    fn test_delete_requires_ownership() {
        let (svc, provider, session) = service();
        let foreign_owner = Uuid::new_v4();
        let mut group = Group::new(Uuid::new_v4(), "Trip", foreign_owner, "bo");
        group.add_member(session.id, "ana").unwrap();

        let err = svc.delete_group(&group).unwrap_err();
        assert!(matches!(err, Error::Authorization(_)));
        assert!(provider.deleted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_owner_can_delete() {
        let (svc, provider, session) = service();
        let group = Group::new(Uuid::new_v4(), "Trip", session.id, "ana");
        svc.delete_group(&group).unwrap();
        assert_eq!(*provider.deleted.lock().unwrap(), vec![group.id]);
    }

    #[test]
    fn test_add_expense_equal_split_projects_after_success() {
        let (svc, provider, session) = service();
        let mut group = Group::new(Uuid::new_v4(), "Flat", session.id, "ana");
        group.add_member(Uuid::new_v4(), "bo").unwrap();
        group.add_member(Uuid::new_v4(), "cy").unwrap();

        let entry = svc
            .add_expense(&mut group, draft(money(100), SplitInput::Equal))
            .unwrap();

        assert_eq!(entry.split, SplitPolicy::Equal);
        assert_eq!(provider.recorded.lock().unwrap().len(), 1);
        assert_eq!(group.members[0].total_paid, money(34));
        assert_eq!(ledger::aggregate_total(&group).unwrap(), money(100));
    }

    #[test]
    fn test_add_expense_validation_never_reaches_the_provider() {
        let (svc, provider, session) = service();
        let mut group = Group::new(Uuid::new_v4(), "Flat", session.id, "ana");
        group.add_member(Uuid::new_v4(), "bo").unwrap();

        let mut bad = BTreeMap::new();
        bad.insert(group.members[0].member_id, money(50));
        bad.insert(group.members[1].member_id, money(49));
        let err = svc
            .add_expense(&mut group, draft(money(100), SplitInput::Manual(bad)))
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(provider.recorded.lock().unwrap().is_empty());
        assert_eq!(ledger::aggregate_total(&group).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_add_expense_remote_failure_leaves_snapshot_untouched() {
        let (svc, provider, session) = service();
        let mut group = Group::new(Uuid::new_v4(), "Flat", session.id, "ana");
        group.add_member(Uuid::new_v4(), "bo").unwrap();

        *provider.fail_add_expense.lock().unwrap() =
            Some(Error::conflict("group was deleted concurrently"));
        let err = svc
            .add_expense(&mut group, draft(money(100), SplitInput::Equal))
            .unwrap_err();

        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(ledger::aggregate_total(&group).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_add_expense_requires_membership() {
        let (svc, _, _) = service();
        let mut group = Group::new(Uuid::new_v4(), "Flat", Uuid::new_v4(), "bo");
        let err = svc
            .add_expense(&mut group, draft(money(100), SplitInput::Equal))
            .unwrap_err();
        assert!(matches!(err, Error::Authorization(_)));
    }
}
