//! Authenticated actor context
//!
//! The claims-out side of token verification: a verified token yields an
//! [`AuthContext`] and nothing else. No process-wide session store exists;
//! every entry point re-verifies its own token.

use itinero_core::Role;
use serde::{Deserialize, Serialize};

/// The authenticated actor for a single request
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// User identifier asserted by the credential
    pub user_id: i64,
    /// Role asserted at token issuance time
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin_tier(&self) -> bool {
        self.role.is_admin_tier()
    }

    /// Summary string for logging
    pub fn summary(&self) -> String {
        format!("actor[id={}, role={}]", self.user_id, self.role)
    }
}
