//! Divvy Core - Business logic for shared-expense tracking
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Group, Member, Invitation, ExpenseEntry)
//! - **ports**: Trait definitions for the remote system of record
//! - **services**: Business logic orchestration (splitting, ledger, membership)
//! - **adapters**: Concrete implementations (HTTP client, in-memory demo provider)
//!
//! There is no local persistence: the remote Divvy server is the system
//! of record, and everything here is a client-side computation and
//! validation layer over it. Presentation, charts, personal-expense CRUD
//! and authentication are external collaborators.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::sync::Arc;

use anyhow::Result;

use adapters::{DemoProvider, HttpProvider};
use config::Config;
use services::{GroupService, MembershipService, SelectionFocus};

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result as CoreResult};
pub use domain::{
    Category, ExpenseEntry, Group, Invitation, InvitationStatus, Member, Money, SessionUser,
    SplitPolicy,
};
pub use services::{ExpenseDraft, SplitInput};

/// Main context for Divvy operations
///
/// The primary entry point for all business logic: one per client
/// session, holding the configuration and the services wired to a
/// single provider. Callers pass it (or its services) by reference to
/// whatever needs it - there is no ambient global state.
pub struct DivvyContext {
    pub config: Config,
    pub session: SessionUser,
    pub groups: GroupService,
    pub membership: MembershipService,
    /// The group currently focused for detail/expense-entry views.
    pub selection: SelectionFocus,
}

impl DivvyContext {
    /// Create a context for the given session.
    ///
    /// In demo mode an in-memory provider is used and the session user
    /// is registered into it; otherwise `bearer_token` (from the auth
    /// collaborator) is required to reach the configured server.
    pub fn new(config: Config, session: SessionUser, bearer_token: Option<&str>) -> Result<Self> {
        if config.demo_mode {
            let provider = Arc::new(DemoProvider::new());
            provider.register_user(session.clone());
            Ok(Self::with_provider(config, session, provider))
        } else {
            let token = bearer_token
                .ok_or_else(|| anyhow::anyhow!("a bearer credential is required outside demo mode"))?;
            let provider = Arc::new(HttpProvider::new(&config.api_url, token)?);
            Ok(Self::with_provider(config, session, provider))
        }
    }

    fn with_provider<P>(config: Config, session: SessionUser, provider: Arc<P>) -> Self
    where
        P: ports::GroupProvider + ports::InvitationProvider + 'static,
    {
        Self {
            config,
            groups: GroupService::new(provider.clone(), session.clone()),
            membership: MembershipService::new(provider, session.clone()),
            selection: SelectionFocus::new(),
            session,
        }
    }
}
