use std::collections::HashMap;

use async_trait::async_trait;
use rentfolio_application::{AuthIdentity, AuthIdentityRepository};
use rentfolio_core::{AppError, AppResult};
use rentfolio_domain::{CustomClaims, UserId};
use tokio::sync::RwLock;

/// In-memory auth identity repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryAuthIdentityRepository {
    identities: RwLock<HashMap<UserId, AuthIdentity>>,
}

impl InMemoryAuthIdentityRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AuthIdentityRepository for InMemoryAuthIdentityRepository {
    async fn find(&self, uid: UserId) -> AppResult<Option<AuthIdentity>> {
        Ok(self.identities.read().await.get(&uid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<AuthIdentity>> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|identity| identity.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, identity: &AuthIdentity) -> AppResult<()> {
        let mut identities = self.identities.write().await;

        if identities.contains_key(&identity.uid) {
            return Err(AppError::Conflict(format!(
                "auth identity '{}' already exists",
                identity.uid
            )));
        }
        if identities
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&identity.email))
        {
            return Err(AppError::Conflict(format!(
                "auth identity with email '{}' already exists",
                identity.email
            )));
        }

        identities.insert(identity.uid, identity.clone());
        Ok(())
    }

    async fn set_custom_claims(&self, uid: UserId, claims: &CustomClaims) -> AppResult<()> {
        let mut identities = self.identities.write().await;

        let identity = identities
            .get_mut(&uid)
            .ok_or_else(|| AppError::NotFound(format!("auth identity '{uid}' not found")))?;
        identity.custom_claims = Some(claims.clone());
        Ok(())
    }
}
