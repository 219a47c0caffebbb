//! Claims writer: keeps auth identity custom claims synchronized with the
//! profile document's role, organization, and status.
//!
//! The identity write and the profile mirror write are sequential, not
//! transactional: the identity side is written first, so a crash between the
//! two leaves the narrower-latency side correct and the divergence is
//! repaired by the session bootstrap fallback or a later assignment.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rentfolio_core::{AppError, AppResult, CallerIdentity, OrganizationId};
use rentfolio_domain::{
    AccountStatus, CustomClaims, Role, UserId, UserProfile, permissions_for_role,
};
use tracing::info;

use crate::profile_store::{ClaimsMirror, ProfileChangeHandler, ProfileRepository};

/// Authenticator identity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Stable user identifier, shared with the profile document.
    pub uid: UserId,
    /// Canonical email address.
    pub email: String,
    /// Argon2id password hash, or `None` for federated-only accounts.
    pub password_hash: Option<String>,
    /// Custom claims, written only by the claims writer.
    pub custom_claims: Option<CustomClaims>,
}

/// Repository port for authenticator identity records.
#[async_trait]
pub trait AuthIdentityRepository: Send + Sync {
    /// Finds an identity by user identifier.
    async fn find(&self, uid: UserId) -> AppResult<Option<AuthIdentity>>;

    /// Finds an identity by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<AuthIdentity>>;

    /// Creates a new identity record.
    async fn create(&self, identity: &AuthIdentity) -> AppResult<()>;

    /// Replaces the custom claims blob on an identity.
    async fn set_custom_claims(&self, uid: UserId, claims: &CustomClaims) -> AppResult<()>;
}

/// Input for an explicit role assignment.
#[derive(Debug, Clone)]
pub struct SetUserClaimsInput {
    /// User receiving the assignment.
    pub target_uid: UserId,
    /// Role identifier to assign. Unknown identifiers grant zero permissions.
    pub role_id: String,
    /// Organization scope; falls back to the profile's current value.
    pub organization_id: Option<OrganizationId>,
    /// Account status; defaults to active.
    pub status: Option<AccountStatus>,
}

/// Summary returned by a successful assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsAssignment {
    /// User that received the assignment.
    pub uid: UserId,
    /// Assigned role identifier.
    pub role: String,
    /// Number of permissions granted by the static table.
    pub permissions_count: usize,
}

/// Caller-facing view of an identity's claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClaimsView {
    /// The identity's user identifier.
    pub uid: UserId,
    /// The identity's email address.
    pub email: String,
    /// Current custom claims, if any have been written.
    pub custom_claims: Option<CustomClaims>,
}

/// Application service that owns every claims write.
#[derive(Clone)]
pub struct ClaimsService {
    identities: Arc<dyn AuthIdentityRepository>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ClaimsService {
    /// Creates a claims service from repository implementations.
    #[must_use]
    pub fn new(
        identities: Arc<dyn AuthIdentityRepository>,
        profiles: Arc<dyn ProfileRepository>,
    ) -> Self {
        Self {
            identities,
            profiles,
        }
    }

    /// Assigns a role to a user on behalf of an administrator.
    ///
    /// Writes the full claims blob to the auth identity, then mirrors the
    /// assignment onto the profile document. This is the only strongly
    /// consistent path: both representations are written before returning.
    /// Re-running with identical inputs produces identical claims.
    pub async fn set_user_claims(
        &self,
        caller: &CallerIdentity,
        input: SetUserClaimsInput,
    ) -> AppResult<ClaimsAssignment> {
        let caller_role = caller.role().unwrap_or_default();
        if caller_role != Role::SuperAdmin.as_str() && caller_role != Role::OrgAdmin.as_str() {
            return Err(AppError::Forbidden(
                "only administrators may assign roles".to_owned(),
            ));
        }

        let role_id = input.role_id.trim();
        if role_id.is_empty() {
            return Err(AppError::Validation("role_id is required".to_owned()));
        }

        let identity = self
            .identities
            .find(input.target_uid)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("auth identity '{}' not found", input.target_uid))
            })?;

        let profile = self.profiles.find(input.target_uid).await?;
        let organization_id = input
            .organization_id
            .or_else(|| profile.as_ref().and_then(|profile| profile.organization_id));
        let status = input.status.unwrap_or(AccountStatus::Active);

        let claims = self
            .write_claims(&identity, Some(role_id.to_owned()), organization_id, status)
            .await?;

        info!(
            caller = %caller.uid(),
            target = %identity.uid,
            role = role_id,
            permissions = claims.permissions.len(),
            "assigned role claims"
        );

        Ok(ClaimsAssignment {
            uid: identity.uid,
            role: role_id.to_owned(),
            permissions_count: claims.permissions.len(),
        })
    }

    /// Returns the caller's own identity claims.
    pub async fn get_user_claims(&self, uid: UserId) -> AppResult<UserClaimsView> {
        let identity = self
            .identities
            .find(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("auth identity '{uid}' not found")))?;

        Ok(UserClaimsView {
            uid: identity.uid,
            email: identity.email,
            custom_claims: identity.custom_claims,
        })
    }

    /// Re-derives claims from a profile document revision.
    ///
    /// Shared write path for the reactive handlers; carries no caller gate
    /// because it only ever reflects state already persisted on the profile.
    pub async fn sync_profile_claims(&self, profile: &UserProfile) -> AppResult<()> {
        let identity = self.identities.find(profile.uid).await?.ok_or_else(|| {
            AppError::NotFound(format!("auth identity '{}' not found", profile.uid))
        })?;

        self.write_claims(
            &identity,
            profile.role_id.clone(),
            profile.organization_id,
            profile.status,
        )
        .await?;

        Ok(())
    }

    /// Writes the claims blob to the identity, then mirrors it onto the
    /// profile document. The identity write always comes first.
    async fn write_claims(
        &self,
        identity: &AuthIdentity,
        role_id: Option<String>,
        organization_id: Option<OrganizationId>,
        status: AccountStatus,
    ) -> AppResult<CustomClaims> {
        let permissions = role_id
            .as_deref()
            .map(permissions_for_role)
            .unwrap_or_default();

        let claims = CustomClaims {
            role: role_id,
            permissions,
            organization_id,
            status,
            updated_at: Utc::now(),
        };

        self.identities
            .set_custom_claims(identity.uid, &claims)
            .await?;

        let mirror = ClaimsMirror {
            role_id: claims.role.clone(),
            permissions: claims.permissions.clone(),
            organization_id: claims.organization_id,
            status: claims.status,
            updated_at: claims.updated_at,
        };
        self.profiles
            .apply_claims_mirror(identity.uid, identity.email.as_str(), &mirror)
            .await?;

        Ok(claims)
    }
}

/// Reactive handler that repeats the claims write when a profile document
/// appears with an active role or changes its claim-relevant fields.
#[derive(Clone)]
pub struct ClaimsSyncHandler {
    claims: ClaimsService,
}

impl ClaimsSyncHandler {
    /// Creates the handler around the shared claims service.
    #[must_use]
    pub fn new(claims: ClaimsService) -> Self {
        Self { claims }
    }
}

#[async_trait]
impl ProfileChangeHandler for ClaimsSyncHandler {
    async fn on_profile_created(&self, profile: &UserProfile) -> AppResult<()> {
        // Pre-seeded accounts activate with zero extra round trips; everyone
        // else stays pending until an explicit assignment.
        if profile.role_id.is_some() && profile.status == AccountStatus::Active {
            return self.claims.sync_profile_claims(profile).await;
        }

        Ok(())
    }

    async fn on_profile_updated(
        &self,
        before: &UserProfile,
        after: &UserProfile,
    ) -> AppResult<()> {
        if before.claims_fields_changed(after) {
            return self.claims.sync_profile_claims(after).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
