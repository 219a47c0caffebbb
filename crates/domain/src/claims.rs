use chrono::{DateTime, Utc};
use rentfolio_core::OrganizationId;
use serde::{Deserialize, Serialize};

use crate::permission::Permission;
use crate::user::AccountStatus;

/// Authenticator-issued custom claims embedded in a session token.
///
/// `role` stays a raw string rather than [`crate::Role`]: an administrator
/// may assign an identifier the deploy-time table does not know, and that
/// assignment must round-trip with zero permissions instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomClaims {
    /// Assigned role identifier.
    pub role: Option<String>,
    /// Permission set resolved from the static table at assignment time.
    pub permissions: Vec<Permission>,
    /// Organization scope for the role.
    pub organization_id: Option<OrganizationId>,
    /// Account lifecycle status at assignment time.
    pub status: AccountStatus,
    /// When the claims were last written.
    pub updated_at: DateTime<Utc>,
}

impl CustomClaims {
    /// Returns the role identifier when the claims authorize an active
    /// account, which is the only case where claims are authoritative.
    #[must_use]
    pub fn active_role(&self) -> Option<&str> {
        match self.status {
            AccountStatus::Active => self.role.as_deref(),
            AccountStatus::Pending | AccountStatus::Rejected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::CustomClaims;
    use crate::user::AccountStatus;

    #[test]
    fn active_role_requires_both_role_and_active_status() {
        let mut claims = CustomClaims {
            role: Some("org_admin".to_owned()),
            permissions: Vec::new(),
            organization_id: None,
            status: AccountStatus::Active,
            updated_at: Utc::now(),
        };
        assert_eq!(claims.active_role(), Some("org_admin"));

        claims.status = AccountStatus::Pending;
        assert!(claims.active_role().is_none());

        claims.status = AccountStatus::Active;
        claims.role = None;
        assert!(claims.active_role().is_none());
    }
}
