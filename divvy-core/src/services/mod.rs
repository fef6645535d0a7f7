//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod groups;
mod membership;
mod selection;
pub mod ledger;
pub mod split;

pub use groups::{ExpenseDraft, GroupService, SplitInput};
pub use membership::MembershipService;
pub use selection::SelectionFocus;
