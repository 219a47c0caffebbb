//! Client-side session bootstrap.
//!
//! On every authentication-state transition this service resolves the single
//! effective role/permission/organization state for the session, preferring
//! identity-token claims, falling back to the profile document when claims
//! are absent or stale, then to the local cache when the fallback read
//! fails, and finally to a locked-out state. Resolution always terminates
//! in a defined state and never propagates an error past this boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rentfolio_core::{AppError, AppResult, OrganizationId};
use rentfolio_domain::{CustomClaims, ResolvedAccess, SessionState, UserId};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::profile_store::ProfileRepository;

mod resolution;

pub use resolution::{ProfileLookup, resolve_access};
pub(crate) use resolution::{InactiveReason, cached_access, classify_inactive};

/// Identity token fetched from the authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdToken {
    /// Authenticated user identifier.
    pub uid: UserId,
    /// Email, if the authenticator returned one.
    pub email: Option<String>,
    /// Custom claims embedded in the token; absent until the claims writer
    /// has run and the token has been refreshed since.
    pub claims: Option<CustomClaims>,
}

/// Port for the authenticator the session runs against.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Authenticates with email and password and returns a fresh token.
    ///
    /// Invalid credentials surface as [`AppError::Unauthorized`].
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<IdToken>;

    /// Returns the current session's token, or `None` when signed out.
    ///
    /// `force_refresh` mints a fresh token so claims written since the last
    /// fetch become visible; without it the authenticator may serve a
    /// cached token with stale claims.
    async fn fetch_id_token(&self, force_refresh: bool) -> AppResult<Option<IdToken>>;

    /// Terminates the authenticated session.
    async fn sign_out(&self) -> AppResult<()>;
}

/// Snapshot persisted in the local key-value store for instant reloads.
///
/// Always subordinate to the server-issued token: it is revalidated on
/// every bootstrap and only served as-is when the fallback read fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSession {
    /// Cached user identifier.
    pub user_id: UserId,
    /// Cached role identifier.
    pub role: String,
    /// Cached organization scope.
    pub organization_id: Option<OrganizationId>,
}

/// Port for the local session cache.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Loads the cached snapshot, if one exists.
    async fn load(&self) -> AppResult<Option<CachedSession>>;

    /// Persists the snapshot.
    async fn store(&self, snapshot: &CachedSession) -> AppResult<()>;

    /// Removes the snapshot.
    async fn clear(&self) -> AppResult<()>;
}

/// Proactive refresh cadence, safely under the ~60 minute token expiry so
/// administrator claims updates propagate without a re-login.
pub const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(50 * 60);

/// Outcome of an interactive sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// Signed in with an active role.
    Active(ResolvedAccess),
    /// Credentials were wrong; deliberately generic.
    InvalidCredentials,
    /// Account is active but no role has been assigned yet.
    AwaitingRoleAssignment,
    /// Account is still pending administrator approval.
    PendingApproval,
    /// Account was rejected by an administrator.
    Rejected,
}

/// Session bootstrap service; one instance per client process.
pub struct SessionService {
    gateway: Arc<dyn AuthGateway>,
    profiles: Arc<dyn ProfileRepository>,
    cache: Arc<dyn SessionCache>,
    state: watch::Sender<SessionState>,
}

impl SessionService {
    /// Creates the service in the uninitialized state.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        profiles: Arc<dyn ProfileRepository>,
        cache: Arc<dyn SessionCache>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Uninitialized);

        Self {
            gateway,
            profiles,
            cache,
            state,
        }
    }

    /// Subscribes to session state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Returns the current session state.
    #[must_use]
    pub fn current_state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Resolves effective access for the current authentication state.
    ///
    /// Publishes a provisional cached value while resolution is in flight,
    /// then the terminal resolved (or signed-out) state.
    pub async fn on_auth_state_changed(&self) -> SessionState {
        let cached = self.load_cache().await;
        self.transition(SessionState::Resolving {
            provisional: cached.as_ref().map(cached_access),
        });

        let token = match self.gateway.fetch_id_token(false).await {
            Ok(Some(token)) => token,
            Ok(None) => return self.transition(SessionState::SignedOut),
            Err(error) => {
                // Same availability-over-consistency rule as the fallback
                // read: a reachable cache beats locking the user out.
                warn!(error = %error, "token fetch failed during bootstrap");
                let state = match cached.as_ref() {
                    Some(cached) => SessionState::Resolved(cached_access(cached)),
                    None => SessionState::SignedOut,
                };
                return self.transition(state);
            }
        };

        let access = self.resolve_with_token(&token, cached.as_ref()).await;
        self.transition(SessionState::Resolved(access))
    }

    /// Signs in interactively and resolves access before declaring success.
    ///
    /// When neither claims nor the profile fallback yield an active role,
    /// the session is signed back out and the outcome names which condition
    /// matched.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AppResult<SignInOutcome> {
        let token = match self.gateway.sign_in_with_password(email, password).await {
            Ok(token) => token,
            Err(AppError::Unauthorized(_)) => return Ok(SignInOutcome::InvalidCredentials),
            Err(error) => return Err(error),
        };

        if token
            .claims
            .as_ref()
            .is_some_and(|claims| claims.active_role().is_some())
        {
            let access = resolve_access(&token, ProfileLookup::Missing, None);
            self.persist_cache_for(&access).await;
            self.transition(SessionState::Resolved(access.clone()));
            return Ok(SignInOutcome::Active(access));
        }

        let profile = match self.profiles.find(token.uid).await {
            Ok(profile) => profile,
            Err(error) => {
                self.sign_out_logged().await;
                return Err(error);
            }
        };

        if let Some(profile) = &profile
            && profile.active_role().is_some()
        {
            let access = resolve_access(&token, ProfileLookup::Found(profile.clone()), None);
            self.persist_cache_for(&access).await;
            self.transition(SessionState::Resolved(access.clone()));
            return Ok(SignInOutcome::Active(access));
        }

        let reason = classify_inactive(token.claims.as_ref(), profile.as_ref());
        info!(uid = %token.uid, reason = ?reason, "sign-in rejected without an active role");
        self.sign_out_logged().await;

        Ok(match reason {
            InactiveReason::AwaitingRoleAssignment => SignInOutcome::AwaitingRoleAssignment,
            InactiveReason::PendingApproval => SignInOutcome::PendingApproval,
            InactiveReason::Rejected => SignInOutcome::Rejected,
        })
    }

    /// Forces a token refresh and re-resolves access.
    ///
    /// Errors propagate to the caller, which is expected to sign out and
    /// surface a session-expired outcome.
    pub async fn refresh_session(&self) -> AppResult<SessionState> {
        let token = self
            .gateway
            .fetch_id_token(true)
            .await?
            .ok_or_else(|| AppError::Unauthorized("no authenticated session".to_owned()))?;

        let cached = self.load_cache().await;
        let access = self.resolve_with_token(&token, cached.as_ref()).await;
        Ok(self.transition(SessionState::Resolved(access)))
    }

    /// Proactively refreshes the session on a fixed cadence.
    ///
    /// Runs until a refresh fails, then signs out and returns the
    /// session-expired error for the UI to surface.
    pub async fn run_token_refresh(&self) -> AppResult<()> {
        let mut interval = tokio::time::interval(TOKEN_REFRESH_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; resolution already ran.
        interval.tick().await;

        loop {
            interval.tick().await;

            if let Err(error) = self.refresh_session().await {
                warn!(error = %error, "proactive session refresh failed; signing out");
                self.sign_out_logged().await;
                return Err(AppError::Unauthorized(
                    "session expired, please sign in again".to_owned(),
                ));
            }
        }
    }

    /// Clears in-memory access state and the local cache together.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.state.send_replace(SessionState::SignedOut);
        let gateway_result = self.gateway.sign_out().await;
        let cache_result = self.cache.clear().await;
        gateway_result.and(cache_result)
    }

    async fn resolve_with_token(
        &self,
        token: &IdToken,
        cached: Option<&CachedSession>,
    ) -> ResolvedAccess {
        let claims_authoritative = token
            .claims
            .as_ref()
            .is_some_and(|claims| claims.active_role().is_some());

        let lookup = if claims_authoritative {
            // Claims win; the profile is not consulted.
            ProfileLookup::Missing
        } else {
            match self.profiles.find(token.uid).await {
                Ok(Some(profile)) => ProfileLookup::Found(profile),
                Ok(None) => ProfileLookup::Missing,
                Err(error) => {
                    warn!(uid = %token.uid, error = %error, "profile fallback read failed");
                    ProfileLookup::Unavailable
                }
            }
        };

        let access = resolve_access(token, lookup, cached);
        self.persist_cache_for(&access).await;
        access
    }

    async fn persist_cache_for(&self, access: &ResolvedAccess) {
        use rentfolio_domain::AccessSource;

        match (&access.role, access.source) {
            (Some(role), AccessSource::Claims | AccessSource::Profile) => {
                let snapshot = CachedSession {
                    user_id: access.uid,
                    role: role.clone(),
                    organization_id: access.organization_id,
                };
                if let Err(error) = self.cache.store(&snapshot).await {
                    warn!(error = %error, "failed to persist session cache");
                }
            }
            (_, AccessSource::Cache) => {}
            _ => {
                if let Err(error) = self.cache.clear().await {
                    warn!(error = %error, "failed to clear session cache");
                }
            }
        }
    }

    async fn load_cache(&self) -> Option<CachedSession> {
        match self.cache.load().await {
            Ok(cached) => cached,
            Err(error) => {
                warn!(error = %error, "failed to load session cache");
                None
            }
        }
    }

    async fn sign_out_logged(&self) {
        if let Err(error) = self.sign_out().await {
            warn!(error = %error, "sign-out failed");
        }
    }

    fn transition(&self, state: SessionState) -> SessionState {
        self.state.send_replace(state.clone());
        state
    }
}
