//! Pure access resolution: the preference order that defines the
//! staleness/consistency tradeoffs of the whole subsystem.

use rentfolio_domain::{
    AccessSource, AccountStatus, CustomClaims, ResolvedAccess, UserProfile, permissions_for_role,
};

use super::{CachedSession, IdToken};

/// Outcome of the profile fallback read.
#[derive(Debug, Clone)]
pub enum ProfileLookup {
    /// The profile document exists.
    Found(UserProfile),
    /// No profile document exists for the user.
    Missing,
    /// The read itself failed (network or store error).
    Unavailable,
}

/// Why a session holds no active role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InactiveReason {
    AwaitingRoleAssignment,
    PendingApproval,
    Rejected,
}

/// Resolves effective access from the three sources in strict preference
/// order: token claims, then the profile document, then the cached
/// snapshot (only when the fallback read failed), then locked-out.
#[must_use]
pub fn resolve_access(
    token: &IdToken,
    profile: ProfileLookup,
    cached: Option<&CachedSession>,
) -> ResolvedAccess {
    if let Some(claims) = &token.claims
        && let Some(role) = claims.active_role()
    {
        return ResolvedAccess {
            uid: token.uid,
            role: Some(role.to_owned()),
            permissions: claims.permissions.clone(),
            organization_id: claims.organization_id,
            needs_role_assignment: false,
            source: AccessSource::Claims,
        };
    }

    match profile {
        ProfileLookup::Found(profile) if profile.active_role().is_some() => ResolvedAccess {
            uid: token.uid,
            role: profile.role_id.clone(),
            permissions: profile.permissions.clone(),
            organization_id: profile.organization_id,
            needs_role_assignment: false,
            source: AccessSource::Profile,
        },
        ProfileLookup::Found(_) | ProfileLookup::Missing => ResolvedAccess::locked_out(token.uid),
        ProfileLookup::Unavailable => cached
            .map(cached_access)
            .unwrap_or_else(|| ResolvedAccess::locked_out(token.uid)),
    }
}

/// Builds access from a cached snapshot; permissions come from the static
/// table since the cache stores only the role.
pub(crate) fn cached_access(cached: &CachedSession) -> ResolvedAccess {
    ResolvedAccess {
        uid: cached.user_id,
        role: Some(cached.role.clone()),
        permissions: permissions_for_role(&cached.role),
        organization_id: cached.organization_id,
        needs_role_assignment: false,
        source: AccessSource::Cache,
    }
}

/// Names the condition that left a sign-in without an active role, using
/// the profile's status when available and the claims' status otherwise.
pub(crate) fn classify_inactive(
    claims: Option<&CustomClaims>,
    profile: Option<&UserProfile>,
) -> InactiveReason {
    let status = profile
        .map(|profile| profile.status)
        .or_else(|| claims.map(|claims| claims.status));

    match status {
        Some(AccountStatus::Rejected) => InactiveReason::Rejected,
        Some(AccountStatus::Pending) => InactiveReason::PendingApproval,
        Some(AccountStatus::Active) | None => InactiveReason::AwaitingRoleAssignment,
    }
}
