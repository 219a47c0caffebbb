//! Profile document persistence port and change-event dispatch.
//!
//! The managed-database triggers of the original platform become explicit
//! handler registrations here: every successful write through
//! [`ProfileStore`] notifies each registered [`ProfileChangeHandler`] exactly
//! once. Handlers must never block or fail the write that triggered them, so
//! their errors are logged and swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rentfolio_core::{AppError, AppResult, OrganizationId};
use rentfolio_domain::{AccountStatus, Permission, UserId, UserProfile};
use tracing::warn;

/// Claim fields mirrored onto the profile document after a claims write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsMirror {
    /// Assigned role identifier.
    pub role_id: Option<String>,
    /// Permission set resolved from the static table.
    pub permissions: Vec<Permission>,
    /// Organization scope.
    pub organization_id: Option<OrganizationId>,
    /// Account lifecycle status.
    pub status: AccountStatus,
    /// Timestamp of the claims write being mirrored.
    pub updated_at: DateTime<Utc>,
}

/// Repository port for profile document persistence.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds a profile by user identifier.
    async fn find(&self, uid: UserId) -> AppResult<Option<UserProfile>>;

    /// Inserts a new profile. Fails with a conflict when one already exists.
    async fn insert(&self, profile: &UserProfile) -> AppResult<()>;

    /// Replaces an existing profile. Fails when none exists.
    async fn update(&self, profile: &UserProfile) -> AppResult<()>;

    /// Mirrors claim fields onto the profile document, creating a minimal
    /// document when none exists yet.
    ///
    /// This is the claims writer's low-level mirror path; it deliberately
    /// bypasses change-event dispatch so a mirror write cannot re-trigger
    /// the handler that produced it.
    async fn apply_claims_mirror(
        &self,
        uid: UserId,
        email: &str,
        mirror: &ClaimsMirror,
    ) -> AppResult<()>;
}

/// Handler invoked after profile document writes.
#[async_trait]
pub trait ProfileChangeHandler: Send + Sync {
    /// Fired once after a new profile document is inserted.
    async fn on_profile_created(&self, profile: &UserProfile) -> AppResult<()>;

    /// Fired once after an existing profile document is replaced.
    async fn on_profile_updated(
        &self,
        before: &UserProfile,
        after: &UserProfile,
    ) -> AppResult<()>;
}

/// Profile write facade that dispatches change events.
pub struct ProfileStore {
    repository: Arc<dyn ProfileRepository>,
    handlers: Vec<Arc<dyn ProfileChangeHandler>>,
}

impl ProfileStore {
    /// Creates a store with no registered handlers.
    #[must_use]
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self {
            repository,
            handlers: Vec::new(),
        }
    }

    /// Registers a change handler. Handlers run in registration order.
    pub fn register_handler(&mut self, handler: Arc<dyn ProfileChangeHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the underlying repository for read paths.
    #[must_use]
    pub fn repository(&self) -> Arc<dyn ProfileRepository> {
        Arc::clone(&self.repository)
    }

    /// Inserts a profile and dispatches the created event.
    pub async fn create_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        self.repository.insert(&profile).await?;

        for handler in &self.handlers {
            if let Err(error) = handler.on_profile_created(&profile).await {
                warn!(
                    uid = %profile.uid,
                    error = %error,
                    "profile created handler failed; continuing"
                );
            }
        }

        Ok(profile)
    }

    /// Replaces a profile and dispatches the updated event with the prior
    /// revision.
    pub async fn update_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let before = self
            .repository
            .find(profile.uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile '{}' not found", profile.uid)))?;

        self.repository.update(&profile).await?;

        for handler in &self.handlers {
            if let Err(error) = handler.on_profile_updated(&before, &profile).await {
                warn!(
                    uid = %profile.uid,
                    error = %error,
                    "profile updated handler failed; continuing"
                );
            }
        }

        Ok(profile)
    }
}

#[cfg(test)]
mod tests;
