use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rentfolio_core::{AppError, AppResult};
use rentfolio_domain::{UserId, UserProfile};
use tokio::sync::Mutex;

use super::{ClaimsMirror, ProfileChangeHandler, ProfileRepository, ProfileStore};

#[derive(Default)]
struct FakeProfileRepository {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
}

#[async_trait]
impl ProfileRepository for FakeProfileRepository {
    async fn find(&self, uid: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.lock().await.get(&uid).cloned())
    }

    async fn insert(&self, profile: &UserProfile) -> AppResult<()> {
        let mut profiles = self.profiles.lock().await;
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
        let mut profiles = self.profiles.lock().await;
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
        _uid: UserId,
        _email: &str,
        _mirror: &ClaimsMirror,
    ) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RecordedEvent {
    Created(UserId),
    Updated {
        uid: UserId,
        before_role: Option<String>,
        after_role: Option<String>,
    },
}

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<RecordedEvent>>,
}

#[async_trait]
impl ProfileChangeHandler for RecordingHandler {
    async fn on_profile_created(&self, profile: &UserProfile) -> AppResult<()> {
        self.events
            .lock()
            .await
            .push(RecordedEvent::Created(profile.uid));
        Ok(())
    }

    async fn on_profile_updated(
        &self,
        before: &UserProfile,
        after: &UserProfile,
    ) -> AppResult<()> {
        self.events.lock().await.push(RecordedEvent::Updated {
            uid: after.uid,
            before_role: before.role_id.clone(),
            after_role: after.role_id.clone(),
        });
        Ok(())
    }
}

struct FailingHandler;

#[async_trait]
impl ProfileChangeHandler for FailingHandler {
    async fn on_profile_created(&self, _profile: &UserProfile) -> AppResult<()> {
        Err(AppError::Internal("handler exploded".to_owned()))
    }

    async fn on_profile_updated(
        &self,
        _before: &UserProfile,
        _after: &UserProfile,
    ) -> AppResult<()> {
        Err(AppError::Internal("handler exploded".to_owned()))
    }
}

fn pending_profile() -> UserProfile {
    UserProfile::pending_signup(UserId::new(), "mira@example.com", "Mira", None, Utc::now())
}

fn store_with(
    repository: Arc<FakeProfileRepository>,
    handlers: Vec<Arc<dyn ProfileChangeHandler>>,
) -> ProfileStore {
    let mut store = ProfileStore::new(repository);
    for handler in handlers {
        store.register_handler(handler);
    }
    store
}

#[tokio::test]
async fn create_dispatches_created_event_once() -> AppResult<()> {
    let repository = Arc::new(FakeProfileRepository::default());
    let handler = Arc::new(RecordingHandler::default());
    let store = store_with(repository, vec![handler.clone()]);

    let profile = store.create_profile(pending_profile()).await?;

    let events = handler.events.lock().await;
    assert_eq!(events.as_slice(), &[RecordedEvent::Created(profile.uid)]);
    Ok(())
}

#[tokio::test]
async fn update_dispatches_before_and_after_revisions() -> AppResult<()> {
    let repository = Arc::new(FakeProfileRepository::default());
    let handler = Arc::new(RecordingHandler::default());
    let store = store_with(repository, vec![handler.clone()]);

    let profile = store.create_profile(pending_profile()).await?;
    let mut assigned = profile.clone();
    assigned.role_id = Some("property_manager".to_owned());
    store.update_profile(assigned).await?;

    let events = handler.events.lock().await;
    assert_eq!(
        events.last(),
        Some(&RecordedEvent::Updated {
            uid: profile.uid,
            before_role: None,
            after_role: Some("property_manager".to_owned()),
        })
    );
    Ok(())
}

#[tokio::test]
async fn handler_failure_does_not_fail_the_write() -> AppResult<()> {
    let repository = Arc::new(FakeProfileRepository::default());
    let recording = Arc::new(RecordingHandler::default());
    let store = store_with(
        repository.clone(),
        vec![Arc::new(FailingHandler), recording.clone()],
    );

    let profile = store.create_profile(pending_profile()).await?;

    // The write landed and later handlers still ran.
    assert!(repository.find(profile.uid).await?.is_some());
    assert_eq!(recording.events.lock().await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn update_of_missing_profile_is_not_found() {
    let store = store_with(Arc::new(FakeProfileRepository::default()), Vec::new());

    let result = store.update_profile(pending_profile()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
