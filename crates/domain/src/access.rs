//! Resolved session access and pure authorization guard predicates.

use rentfolio_core::OrganizationId;
use serde::{Deserialize, Serialize};

use crate::permission::Permission;
use crate::role::Role;
use crate::user::UserId;

/// Which source of truth produced the resolved access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSource {
    /// Authoritative identity claims.
    Claims,
    /// Profile document fallback (claims presumed stale).
    Profile,
    /// Locally cached snapshot served because the fallback read failed.
    Cache,
    /// No source yielded an active role; the session is locked out.
    Unassigned,
}

/// Effective role, permissions, and organization for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAccess {
    /// The authenticated user.
    pub uid: UserId,
    /// Effective role identifier, if any.
    pub role: Option<String>,
    /// Effective permission set.
    pub permissions: Vec<Permission>,
    /// Organization scope.
    pub organization_id: Option<OrganizationId>,
    /// Whether the session is waiting on an administrator role assignment.
    pub needs_role_assignment: bool,
    /// Source of truth that produced this access.
    pub source: AccessSource,
}

impl ResolvedAccess {
    /// Returns the locked-out access state for an authenticated user with
    /// no active role.
    #[must_use]
    pub fn locked_out(uid: UserId) -> Self {
        Self {
            uid,
            role: None,
            permissions: Vec::new(),
            organization_id: None,
            needs_role_assignment: true,
            source: AccessSource::Unassigned,
        }
    }

    /// Returns whether the permission is a member of the effective set.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|held| held.as_str() == permission)
    }

    /// Returns whether any of the given permissions is held.
    #[must_use]
    pub fn has_any_permission(&self, permissions: &[&str]) -> bool {
        permissions.iter().any(|permission| self.has_permission(permission))
    }

    /// Returns whether the effective role matches exactly.
    #[must_use]
    pub fn has_role(&self, role_id: &str) -> bool {
        self.role.as_deref() == Some(role_id)
    }

    /// Returns whether the session holds either administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::OrgAdmin.as_str()) || self.has_role(Role::SuperAdmin.as_str())
    }
}

/// Lifecycle of one session's access resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No resolution has started.
    Uninitialized,
    /// Resolution in flight; a cached snapshot may be surfaced provisionally.
    Resolving {
        /// Optimistic value from the previous session, never final.
        provisional: Option<ResolvedAccess>,
    },
    /// Resolution finished.
    Resolved(ResolvedAccess),
    /// No authenticated session.
    SignedOut,
}

impl SessionState {
    /// Returns whether resolution has not yet reached a terminal state.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Resolving { .. })
    }

    /// Returns the final resolved access, if resolution has completed.
    #[must_use]
    pub fn access(&self) -> Option<&ResolvedAccess> {
        match self {
            Self::Resolved(access) => Some(access),
            Self::Uninitialized | Self::Resolving { .. } | Self::SignedOut => None,
        }
    }
}

/// Outcome of a route-level guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Resolution is still in flight; render a neutral loading state,
    /// neither granting nor denying.
    Loading,
    /// Access granted.
    Granted,
    /// Access denied; carries what the restricted view needs to render.
    Denied {
        /// The session's current role, if any.
        current_role: Option<String>,
        /// Permissions that would have satisfied the guard.
        required: Vec<String>,
    },
}

/// Evaluates a route guard against the session state.
///
/// An empty requirement list admits any session with an assigned role.
/// Loading states never resolve to granted or denied, so protected content
/// cannot flash before resolution completes.
#[must_use]
pub fn evaluate_route_guard(state: &SessionState, required_any: &[&str]) -> GuardOutcome {
    let denied = |current_role: Option<String>| GuardOutcome::Denied {
        current_role,
        required: required_any.iter().map(|value| (*value).to_owned()).collect(),
    };

    match state {
        SessionState::Uninitialized | SessionState::Resolving { .. } => GuardOutcome::Loading,
        SessionState::SignedOut => denied(None),
        SessionState::Resolved(access) => {
            if access.needs_role_assignment {
                return denied(access.role.clone());
            }

            if required_any.is_empty() || access.has_any_permission(required_any) {
                GuardOutcome::Granted
            } else {
                denied(access.role.clone())
            }
        }
    }
}
