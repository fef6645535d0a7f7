//! Session user
//!
//! Authentication lives in an external collaborator; the core only needs
//! to know who the current session belongs to.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The logged-in user on whose behalf all operations run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl SessionUser {
    pub fn new(id: Uuid, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }
}
