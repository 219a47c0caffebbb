use async_trait::async_trait;
use rentfolio_application::{CachedSession, SessionCache};
use rentfolio_core::AppResult;
use tokio::sync::RwLock;

/// In-memory session cache, the process-local stand-in for a browser's
/// key-value storage.
#[derive(Debug, Default)]
pub struct InMemorySessionCache {
    snapshot: RwLock<Option<CachedSession>>,
}

impl InMemorySessionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
        }
    }
}

#[async_trait]
impl SessionCache for InMemorySessionCache {
    async fn load(&self) -> AppResult<Option<CachedSession>> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn store(&self, snapshot: &CachedSession) -> AppResult<()> {
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        *self.snapshot.write().await = None;
        Ok(())
    }
}
