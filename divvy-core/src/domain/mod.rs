//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod expense;
mod group;
mod invitation;
mod money;
mod user;
pub mod result;

pub use expense::{Category, ExpenseEntry, SplitPolicy};
pub use group::{Group, Member};
pub use invitation::{Invitation, InvitationStatus};
pub use money::Money;
pub use user::SessionUser;
