//! Ledger - running per-member contribution totals
//!
//! The local ledger is an optimistic projection of the server's view:
//! it is only ever mutated after the remote write has been acknowledged,
//! and a refetch of the group discards it entirely.

use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{ExpenseEntry, Group, Money};

/// Fold a confirmed expense into each member's running total.
///
/// Precondition: the split map has already been validated against this
/// group (see `services::split`). Members absent from the map are
/// unaffected.
///
/// This is NOT idempotent - applying the same entry twice double-counts.
/// The caller owns at-most-once application, which in practice means
/// applying only after the server has acknowledged the write.
pub fn apply_expense(group: &mut Group, entry: &ExpenseEntry) -> Result<()> {
    if entry.group_id != group.id {
        return Err(Error::validation(format!(
            "expense targets group {} but was applied to group {}",
            entry.group_id, group.id
        )));
    }

    // Fail before mutating anything: either every contribution lands or
    // none does.
    for member_id in entry.split_map.keys() {
        if !group.is_member(*member_id) {
            return Err(Error::validation(format!(
                "split references {} who is not a member of '{}'",
                member_id, group.name
            )));
        }
    }

    for (member_id, contribution) in &entry.split_map {
        let member = group
            .member_mut(*member_id)
            .ok_or_else(|| Error::validation(format!("member {} disappeared", member_id)))?;
        member.total_paid = member
            .total_paid
            .checked_add(*contribution)
            .ok_or_else(|| Error::validation("member total out of range"))?;
    }

    debug!(group = %group.id, amount = %entry.amount, "applied expense to ledger");
    Ok(())
}

/// Sum of all members' running totals.
///
/// After applying expenses E1..En to a fresh group this equals
/// sum(Ei.amount) - the cross-check invariant the integration tests pin.
pub fn aggregate_total(group: &Group) -> Result<Money> {
    Money::sum(group.members.iter().map(|m| m.total_paid))
}
