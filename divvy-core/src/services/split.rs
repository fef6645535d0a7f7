//! Split calculator - per-member breakdown of a single expense
//!
//! Pure functions; nothing here touches the network or mutates a group.
//! Every breakdown they let through satisfies the ledger's precondition:
//! contributions sum exactly to the amount, each is at least one minor
//! unit, and every key is a member of the group.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::Money;

/// Divide `amount` evenly across `member_ids`, in group order.
///
/// Division floors to the minor unit; the remainder (up to n-1 minor
/// units) is assigned to the FIRST member. Groups always list the owner
/// first, so the remainder lands on the owner. The result therefore sums
/// to `amount` exactly for every input.
pub fn equal_split(amount: Money, member_ids: &[Uuid]) -> Result<BTreeMap<Uuid, Money>> {
    if member_ids.is_empty() {
        return Err(Error::validation("cannot split an expense across zero members"));
    }
    let n = member_ids.len() as i64;
    let share = amount.minor_units() / n;
    let remainder = amount.minor_units() % n;
    if share < 1 {
        return Err(Error::validation(format!(
            "amount {} is too small to give each of {} members at least one minor unit",
            amount, n
        )));
    }

    let mut split = BTreeMap::new();
    for (i, member_id) in member_ids.iter().enumerate() {
        let minor = if i == 0 { share + remainder } else { share };
        if split.insert(*member_id, Money::from_minor_units(minor)?).is_some() {
            return Err(Error::validation(format!("duplicate member id {} in split", member_id)));
        }
    }
    Ok(split)
}

/// Validate a caller-supplied manual breakdown.
///
/// A member may be absent from the map (they owe nothing for this
/// expense), but the map may not reference anyone outside the group,
/// every present contribution must be at least one minor unit, and the
/// contributions must sum to `amount` exactly - no rounding drift.
pub fn validate_manual_split(
    amount: Money,
    member_ids: &[Uuid],
    split_map: &BTreeMap<Uuid, Money>,
) -> Result<()> {
    if split_map.is_empty() {
        return Err(Error::validation("manual split must name at least one member"));
    }
    for (member_id, contribution) in split_map {
        if !member_ids.contains(member_id) {
            return Err(Error::validation(format!(
                "split references {} who is not a member of the group",
                member_id
            )));
        }
        if contribution.minor_units() < 1 {
            return Err(Error::validation(
                "each contribution must be at least one minor unit",
            ));
        }
    }
    let total = Money::sum(split_map.values().copied())?;
    if total != amount {
        return Err(Error::validation(format!(
            "split contributions sum to {} but the expense amount is {}",
            total, amount
        )));
    }
    Ok(())
}
