//! Server-side account registration and credential login.
//!
//! Login resolves effective access with the same preference order the
//! session bootstrap uses: identity claims first, then the profile
//! document. A valid credential pair with no active role is still a
//! rejected login, with an outcome naming the condition.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rentfolio_core::{AppError, AppResult, NonEmptyString};
use rentfolio_domain::{EmailAddress, ResolvedAccess, UserId, UserProfile};
use tracing::info;

use crate::claims_service::{AuthIdentity, AuthIdentityRepository};
use crate::password::PasswordHasher;
use crate::profile_store::ProfileStore;
use crate::session_service::{
    AuthGateway, IdToken, InactiveReason, ProfileLookup, classify_inactive, resolve_access,
};

/// Input for a self-service signup.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    /// Email address to register.
    pub email: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
    /// Display name for the profile document.
    pub display_name: String,
    /// Optional message for the administrator reviewing the request.
    pub access_request_message: Option<String>,
}

/// Outcome of a credential login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials valid and an active role resolved.
    Active {
        /// Effective access for the session.
        access: ResolvedAccess,
        /// The authenticated identity record.
        identity: AuthIdentity,
    },
    /// Unknown email or wrong password; deliberately indistinguishable.
    InvalidCredentials,
    /// Account is active but no role has been assigned yet.
    AwaitingRoleAssignment,
    /// Account is still pending administrator approval.
    PendingApproval,
    /// Account was rejected by an administrator.
    Rejected,
}

/// Application service for registration and credential verification.
#[derive(Clone)]
pub struct AuthService {
    identities: Arc<dyn AuthIdentityRepository>,
    profiles: Arc<ProfileStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AuthService {
    /// Creates the service from its ports.
    #[must_use]
    pub fn new(
        identities: Arc<dyn AuthIdentityRepository>,
        profiles: Arc<ProfileStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            identities,
            profiles,
            hasher,
        }
    }

    /// Registers a new account: identity record first, then the pending
    /// profile document, whose creation event the claims writer observes.
    pub async fn register(&self, input: RegisterInput) -> AppResult<UserProfile> {
        let email = EmailAddress::new(input.email)?;

        let display_name = NonEmptyString::new(input.display_name.trim())?;
        if input.password.len() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".to_owned(),
            ));
        }

        if self.identities.find_by_email(email.as_str()).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "account '{}' already exists",
                email.as_str()
            )));
        }

        let uid = UserId::new();
        let password_hash = self.hasher.hash_password(&input.password)?;

        self.identities
            .create(&AuthIdentity {
                uid,
                email: email.as_str().to_owned(),
                password_hash: Some(password_hash),
                custom_claims: None,
            })
            .await?;

        let profile = self
            .profiles
            .create_profile(UserProfile::pending_signup(
                uid,
                email.as_str(),
                display_name.as_str(),
                input.access_request_message,
                Utc::now(),
            ))
            .await?;

        info!(uid = %uid, "registered pending account");
        Ok(profile)
    }

    /// Verifies credentials and resolves effective access.
    ///
    /// Every credential failure collapses to [`LoginOutcome::InvalidCredentials`]
    /// so the response never reveals whether the email is registered.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginOutcome> {
        let Some(identity) = self.identities.find_by_email(email.trim()).await? else {
            return Ok(LoginOutcome::InvalidCredentials);
        };
        let Some(hash) = identity.password_hash.as_deref() else {
            return Ok(LoginOutcome::InvalidCredentials);
        };
        if !self.hasher.verify_password(password, hash)? {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let (access, profile) = self.resolve_identity(&identity).await?;
        if access.role.is_some() && !access.needs_role_assignment {
            return Ok(LoginOutcome::Active { access, identity });
        }

        let reason = classify_inactive(identity.custom_claims.as_ref(), profile.as_ref());
        info!(uid = %identity.uid, reason = ?reason, "login rejected without an active role");

        Ok(match reason {
            InactiveReason::AwaitingRoleAssignment => LoginOutcome::AwaitingRoleAssignment,
            InactiveReason::PendingApproval => LoginOutcome::PendingApproval,
            InactiveReason::Rejected => LoginOutcome::Rejected,
        })
    }

    /// Re-resolves effective access for an authenticated user.
    ///
    /// Serves session refresh: claims written since login become visible
    /// without a new credential exchange.
    pub async fn refresh_access(&self, uid: UserId) -> AppResult<ResolvedAccess> {
        let identity = self
            .identities
            .find(uid)
            .await?
            .ok_or_else(|| AppError::Unauthorized("no such authenticated account".to_owned()))?;

        let (access, _) = self.resolve_identity(&identity).await?;
        Ok(access)
    }

    async fn resolve_identity(
        &self,
        identity: &AuthIdentity,
    ) -> AppResult<(ResolvedAccess, Option<UserProfile>)> {
        let token = IdToken {
            uid: identity.uid,
            email: Some(identity.email.clone()),
            claims: identity.custom_claims.clone(),
        };

        let claims_authoritative = token
            .claims
            .as_ref()
            .is_some_and(|claims| claims.active_role().is_some());

        // Server-side reads are authoritative, so the cache tier never
        // participates here.
        if claims_authoritative {
            let access = resolve_access(&token, ProfileLookup::Missing, None);
            return Ok((access, None));
        }

        let profile = self.profiles.repository().find(identity.uid).await?;
        let lookup = match profile.clone() {
            Some(profile) => ProfileLookup::Found(profile),
            None => ProfileLookup::Missing,
        };

        Ok((resolve_access(&token, lookup, None), profile))
    }
}

/// Server-side [`AuthGateway`] backed directly by the identity store.
///
/// The "token" it serves is a fresh snapshot of the stored claims, so a
/// forced refresh and a plain fetch read the same row; the propagation lag
/// of a hosted authenticator does not exist on this path.
pub struct IdentityAuthGateway {
    auth: AuthService,
    current_uid: tokio::sync::Mutex<Option<UserId>>,
}

impl IdentityAuthGateway {
    /// Creates a gateway bound to the identity store.
    #[must_use]
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            current_uid: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl AuthGateway for IdentityAuthGateway {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<IdToken> {
        let Some(identity) = self.auth.identities.find_by_email(email.trim()).await? else {
            return Err(AppError::Unauthorized("invalid credentials".to_owned()));
        };
        let verified = identity
            .password_hash
            .as_deref()
            .map(|hash| self.auth.hasher.verify_password(password, hash))
            .transpose()?
            .unwrap_or(false);
        if !verified {
            return Err(AppError::Unauthorized("invalid credentials".to_owned()));
        }

        *self.current_uid.lock().await = Some(identity.uid);

        Ok(IdToken {
            uid: identity.uid,
            email: Some(identity.email),
            claims: identity.custom_claims,
        })
    }

    async fn fetch_id_token(&self, _force_refresh: bool) -> AppResult<Option<IdToken>> {
        let Some(uid) = *self.current_uid.lock().await else {
            return Ok(None);
        };

        let identity = self
            .auth
            .identities
            .find(uid)
            .await?
            .ok_or_else(|| AppError::Unauthorized("authenticated account vanished".to_owned()))?;

        Ok(Some(IdToken {
            uid: identity.uid,
            email: Some(identity.email),
            claims: identity.custom_claims,
        }))
    }

    async fn sign_out(&self) -> AppResult<()> {
        *self.current_uid.lock().await = None;
        Ok(())
    }
}
