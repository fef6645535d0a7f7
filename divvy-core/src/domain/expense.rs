//! Group expense domain model

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::Money;
use crate::domain::result::{Error, Result};

/// Fixed expense categorization, shared with the personal-expense surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Food,
    Rent,
    Clothes,
    Recreation,
    Transport,
    Utilities,
    Entertainment,
    Healthcare,
    Education,
    Other,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Rent,
        Category::Clothes,
        Category::Recreation,
        Category::Transport,
        Category::Utilities,
        Category::Entertainment,
        Category::Healthcare,
        Category::Education,
        Category::Other,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Serde names double as display names
        write!(f, "{:?}", self)
    }
}

/// How an expense amount is divided among members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    /// Amount divided evenly across all members, remainder assigned to
    /// the first member in group order.
    Equal,
    /// Caller supplies the per-member breakdown directly.
    Manual,
}

/// A single group-scoped expense with its per-member breakdown
///
/// Entries are created once, applied to the ledger exactly once, and are
/// otherwise immutable; there is no group-expense edit or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub group_id: Uuid,
    pub description: String,
    pub amount: Money,
    pub date: DateTime<Utc>,
    pub category: Category,
    pub split: SplitPolicy,
    /// Per-member contributions; keys are member ids. BTreeMap keeps
    /// iteration deterministic across views.
    pub split_map: BTreeMap<Uuid, Money>,
}

impl ExpenseEntry {
    /// Validate the entry's own fields (the split arithmetic is checked
    /// separately against the group's member list before submission).
    pub fn validate_fields(&self, now: DateTime<Utc>) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(Error::validation("expense description is required"));
        }
        if self.amount.is_zero() {
            return Err(Error::validation("expense amount must be positive"));
        }
        if self.date > now {
            return Err(Error::validation("expense date cannot be in the future"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry() -> ExpenseEntry {
        ExpenseEntry {
            group_id: Uuid::new_v4(),
            description: "Groceries".to_string(),
            amount: Money::from_minor_units(100).unwrap(),
            date: Utc::now() - Duration::hours(1),
            category: Category::Food,
            split: SplitPolicy::Equal,
            split_map: BTreeMap::new(),
        }
    }

    #[test]
    fn test_validate_fields_ok() {
        assert!(entry().validate_fields(Utc::now()).is_ok());
    }

    #[test]
    fn test_rejects_blank_description() {
        let mut e = entry();
        e.description = "   ".to_string();
        assert!(matches!(e.validate_fields(Utc::now()), Err(Error::Validation(_))));
    }

    #[test]
    fn test_rejects_zero_amount() {
        let mut e = entry();
        e.amount = Money::ZERO;
        assert!(e.validate_fields(Utc::now()).is_err());
    }

    #[test]
    fn test_rejects_future_date() {
        let mut e = entry();
        e.date = Utc::now() + Duration::days(1);
        assert!(e.validate_fields(Utc::now()).is_err());
    }

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&Category::Healthcare).unwrap();
        assert_eq!(json, "\"Healthcare\"");
        assert_eq!(Category::ALL.len(), 10);
    }
}
