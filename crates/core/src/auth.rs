use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::OrganizationId;

/// Resolved access snapshot persisted in the authenticated session.
///
/// This is the server-side equivalent of an ID token: it captures the
/// caller's claims at login or refresh time and goes stale until the next
/// refresh. Consumers must treat it as a snapshot, never as live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    uid: Uuid,
    email: Option<String>,
    role: Option<String>,
    permissions: Vec<String>,
    organization_id: Option<OrganizationId>,
    status: String,
    refreshed_at: DateTime<Utc>,
}

impl CallerIdentity {
    /// Creates a caller identity from resolved access data.
    #[must_use]
    pub fn new(
        uid: Uuid,
        email: Option<String>,
        role: Option<String>,
        permissions: Vec<String>,
        organization_id: Option<OrganizationId>,
        status: impl Into<String>,
        refreshed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uid,
            email,
            role,
            permissions,
            organization_id,
            status: status.into(),
            refreshed_at,
        }
    }

    /// Returns the stable caller identifier.
    #[must_use]
    pub fn uid(&self) -> Uuid {
        self.uid
    }

    /// Returns the email, if the identity carries one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the role captured at snapshot time.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Returns the permission strings captured at snapshot time.
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        self.permissions.as_slice()
    }

    /// Returns the organization the caller is scoped to.
    #[must_use]
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization_id
    }

    /// Returns the account status captured at snapshot time.
    #[must_use]
    pub fn status(&self) -> &str {
        self.status.as_str()
    }

    /// Returns when this snapshot was last refreshed from the identity store.
    #[must_use]
    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }
}
