use std::collections::HashMap;

use async_trait::async_trait;
use rentfolio_application::{ClaimsMirror, ProfileRepository};
use rentfolio_core::{AppError, AppResult};
use rentfolio_domain::{UserId, UserProfile};
use tokio::sync::RwLock;

/// In-memory profile document repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryProfileRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find(&self, uid: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&uid).cloned())
    }

    async fn insert(&self, profile: &UserProfile) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;

        if profiles.contains_key(&profile.uid) {
            return Err(AppError::Conflict(format!(
                "profile '{}' already exists",
                profile.uid
            )));
        }

        profiles.insert(profile.uid, profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &UserProfile) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;

        if !profiles.contains_key(&profile.uid) {
            return Err(AppError::NotFound(format!(
                "profile '{}' not found",
                profile.uid
            )));
        }

        profiles.insert(profile.uid, profile.clone());
        Ok(())
    }

    async fn apply_claims_mirror(
        &self,
        uid: UserId,
        email: &str,
        mirror: &ClaimsMirror,
    ) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;

        if let Some(profile) = profiles.get_mut(&uid) {
            profile.role_id = mirror.role_id.clone();
            profile.permissions = mirror.permissions.clone();
            profile.organization_id = mirror.organization_id;
            profile.status = mirror.status;
            profile.updated_at = mirror.updated_at;
            return Ok(());
        }

        // Claims can arrive before any signup wrote a profile; mirror into
        // a minimal document so reads agree with the identity.
        let mut profile = UserProfile::pending_signup(uid, email, email, None, mirror.updated_at);
        profile.role_id = mirror.role_id.clone();
        profile.permissions = mirror.permissions.clone();
        profile.organization_id = mirror.organization_id;
        profile.status = mirror.status;
        profiles.insert(uid, profile);
        Ok(())
    }
}
