use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rentfolio_core::{AppError, AppResult, CallerIdentity, OrganizationId};
use rentfolio_domain::{AccountStatus, CustomClaims, UserId, UserProfile};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::profile_store::{ClaimsMirror, ProfileChangeHandler, ProfileRepository};

use super::{
    AuthIdentity, AuthIdentityRepository, ClaimsService, ClaimsSyncHandler, SetUserClaimsInput,
};

/// One entry per store write, shared across both fakes to assert ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreWrite {
    IdentityClaims(UserId),
    ProfileMirror(UserId),
}

type WriteLog = Arc<Mutex<Vec<StoreWrite>>>;

struct FakeAuthIdentityRepository {
    identities: Mutex<HashMap<UserId, AuthIdentity>>,
    log: WriteLog,
}

impl FakeAuthIdentityRepository {
    fn new(log: WriteLog) -> Self {
        Self {
            identities: Mutex::new(HashMap::new()),
            log,
        }
    }

    async fn seed(&self, identity: AuthIdentity) {
        self.identities.lock().await.insert(identity.uid, identity);
    }
}

#[async_trait]
impl AuthIdentityRepository for FakeAuthIdentityRepository {
    async fn find(&self, uid: UserId) -> AppResult<Option<AuthIdentity>> {
        Ok(self.identities.lock().await.get(&uid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<AuthIdentity>> {
        Ok(self
            .identities
            .lock()
            .await
            .values()
            .find(|identity| identity.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, identity: &AuthIdentity) -> AppResult<()> {
        self.identities
            .lock()
            .await
            .insert(identity.uid, identity.clone());
        Ok(())
    }

    async fn set_custom_claims(&self, uid: UserId, claims: &CustomClaims) -> AppResult<()> {
        let mut identities = self.identities.lock().await;
        let identity = identities
            .get_mut(&uid)
            .ok_or_else(|| AppError::NotFound(format!("identity '{uid}' not found")))?;
        identity.custom_claims = Some(claims.clone());
        self.log.lock().await.push(StoreWrite::IdentityClaims(uid));
        Ok(())
    }
}

struct FakeProfileRepository {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
    log: WriteLog,
}

impl FakeProfileRepository {
    fn new(log: WriteLog) -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            log,
        }
    }

    async fn seed(&self, profile: UserProfile) {
        self.profiles.lock().await.insert(profile.uid, profile);
    }
}

#[async_trait]
impl ProfileRepository for FakeProfileRepository {
    async fn find(&self, uid: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.lock().await.get(&uid).cloned())
    }

    async fn insert(&self, profile: &UserProfile) -> AppResult<()> {
        self.profiles
            .lock()
            .await
            .insert(profile.uid, profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &UserProfile) -> AppResult<()> {
        self.profiles
            .lock()
            .await
            .insert(profile.uid, profile.clone());
        Ok(())
    }

    async fn apply_claims_mirror(
        &self,
        uid: UserId,
        email: &str,
        mirror: &ClaimsMirror,
    ) -> AppResult<()> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles.entry(uid).or_insert_with(|| {
            UserProfile::pending_signup(uid, email, "", None, mirror.updated_at)
        });
        profile.role_id = mirror.role_id.clone();
        profile.permissions = mirror.permissions.clone();
        profile.organization_id = mirror.organization_id;
        profile.status = mirror.status;
        profile.updated_at = mirror.updated_at;
        self.log.lock().await.push(StoreWrite::ProfileMirror(uid));
        Ok(())
    }
}

struct Fixture {
    service: ClaimsService,
    identities: Arc<FakeAuthIdentityRepository>,
    profiles: Arc<FakeProfileRepository>,
    log: WriteLog,
}

async fn fixture_with_identity(uid: UserId) -> Fixture {
    let log: WriteLog = Arc::new(Mutex::new(Vec::new()));
    let identities = Arc::new(FakeAuthIdentityRepository::new(Arc::clone(&log)));
    let profiles = Arc::new(FakeProfileRepository::new(Arc::clone(&log)));

    identities
        .seed(AuthIdentity {
            uid,
            email: "tenantuser@example.com".to_owned(),
            password_hash: None,
            custom_claims: None,
        })
        .await;

    Fixture {
        service: ClaimsService::new(identities.clone(), profiles.clone()),
        identities,
        profiles,
        log,
    }
}

fn admin_caller() -> CallerIdentity {
    CallerIdentity::new(
        Uuid::new_v4(),
        Some("admin@example.com".to_owned()),
        Some("org_admin".to_owned()),
        Vec::new(),
        None,
        "active",
        Utc::now(),
    )
}

fn viewer_caller() -> CallerIdentity {
    CallerIdentity::new(
        Uuid::new_v4(),
        Some("viewer@example.com".to_owned()),
        Some("financial_viewer".to_owned()),
        Vec::new(),
        None,
        "active",
        Utc::now(),
    )
}

fn assignment(uid: UserId, role_id: &str) -> SetUserClaimsInput {
    SetUserClaimsInput {
        target_uid: uid,
        role_id: role_id.to_owned(),
        organization_id: None,
        status: None,
    }
}

#[tokio::test]
async fn assignment_writes_claims_and_mirrors_profile() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;

    let outcome = fixture
        .service
        .set_user_claims(&admin_caller(), assignment(uid, "property_manager"))
        .await?;

    assert_eq!(outcome.role, "property_manager");
    assert_eq!(outcome.permissions_count, 12);

    let identity = fixture.identities.find(uid).await?;
    let claims = identity.and_then(|identity| identity.custom_claims);
    assert!(claims.is_some());
    let claims = claims.ok_or_else(|| AppError::Internal("claims missing".to_owned()))?;
    assert_eq!(claims.role.as_deref(), Some("property_manager"));
    assert_eq!(claims.status, AccountStatus::Active);
    assert_eq!(claims.permissions.len(), 12);

    let profile = fixture.profiles.find(uid).await?;
    let profile = profile.ok_or_else(|| AppError::Internal("profile missing".to_owned()))?;
    assert_eq!(profile.role_id.as_deref(), Some("property_manager"));
    assert_eq!(profile.status, AccountStatus::Active);
    assert_eq!(profile.permissions, claims.permissions);
    Ok(())
}

#[tokio::test]
async fn identity_write_precedes_profile_mirror() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;

    fixture
        .service
        .set_user_claims(&admin_caller(), assignment(uid, "org_admin"))
        .await?;

    let log = fixture.log.lock().await;
    assert_eq!(
        log.as_slice(),
        &[StoreWrite::IdentityClaims(uid), StoreWrite::ProfileMirror(uid)]
    );
    Ok(())
}

#[tokio::test]
async fn repeated_assignment_is_idempotent() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;

    let first = fixture
        .service
        .set_user_claims(&admin_caller(), assignment(uid, "financial_viewer"))
        .await?;
    let first_claims = fixture
        .identities
        .find(uid)
        .await?
        .and_then(|identity| identity.custom_claims)
        .ok_or_else(|| AppError::Internal("claims missing".to_owned()))?;

    let second = fixture
        .service
        .set_user_claims(&admin_caller(), assignment(uid, "financial_viewer"))
        .await?;
    let second_claims = fixture
        .identities
        .find(uid)
        .await?
        .and_then(|identity| identity.custom_claims)
        .ok_or_else(|| AppError::Internal("claims missing".to_owned()))?;

    assert_eq!(first, second);
    assert_eq!(first_claims.role, second_claims.role);
    assert_eq!(first_claims.permissions, second_claims.permissions);
    assert_eq!(first_claims.organization_id, second_claims.organization_id);
    assert_eq!(first_claims.status, second_claims.status);
    Ok(())
}

#[tokio::test]
async fn unknown_role_grants_zero_permissions_without_error() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;

    let outcome = fixture
        .service
        .set_user_claims(&admin_caller(), assignment(uid, "nonexistent_role"))
        .await?;

    assert_eq!(outcome.permissions_count, 0);
    let claims = fixture
        .identities
        .find(uid)
        .await?
        .and_then(|identity| identity.custom_claims)
        .ok_or_else(|| AppError::Internal("claims missing".to_owned()))?;
    assert_eq!(claims.role.as_deref(), Some("nonexistent_role"));
    assert!(claims.permissions.is_empty());
    Ok(())
}

#[tokio::test]
async fn non_admin_caller_is_denied() {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;

    let result = fixture
        .service
        .set_user_claims(&viewer_caller(), assignment(uid, "org_admin"))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn blank_role_id_is_invalid() {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;

    let result = fixture
        .service
        .set_user_claims(&admin_caller(), assignment(uid, "   "))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn missing_target_identity_is_not_found() {
    let fixture = fixture_with_identity(UserId::new()).await;

    let result = fixture
        .service
        .set_user_claims(&admin_caller(), assignment(UserId::new(), "org_admin"))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn omitted_organization_falls_back_to_profile_value() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;
    let organization_id = OrganizationId::new();

    let mut profile =
        UserProfile::pending_signup(uid, "tenantuser@example.com", "Sam", None, Utc::now());
    profile.organization_id = Some(organization_id);
    fixture.profiles.seed(profile).await;

    fixture
        .service
        .set_user_claims(&admin_caller(), assignment(uid, "property_manager"))
        .await?;

    let claims = fixture
        .identities
        .find(uid)
        .await?
        .and_then(|identity| identity.custom_claims)
        .ok_or_else(|| AppError::Internal("claims missing".to_owned()))?;
    assert_eq!(claims.organization_id, Some(organization_id));
    Ok(())
}

#[tokio::test]
async fn get_user_claims_returns_the_written_blob() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;

    fixture
        .service
        .set_user_claims(&admin_caller(), assignment(uid, "financial_viewer"))
        .await?;

    let view = fixture.service.get_user_claims(uid).await?;
    assert_eq!(view.uid, uid);
    assert_eq!(view.email, "tenantuser@example.com");
    assert_eq!(
        view.custom_claims.and_then(|claims| claims.role),
        Some("financial_viewer".to_owned())
    );
    Ok(())
}

#[tokio::test]
async fn created_reaction_ignores_pending_profiles() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;
    let handler = ClaimsSyncHandler::new(fixture.service.clone());

    let profile =
        UserProfile::pending_signup(uid, "tenantuser@example.com", "Sam", None, Utc::now());
    handler.on_profile_created(&profile).await?;

    let identity = fixture.identities.find(uid).await?;
    assert!(identity.and_then(|identity| identity.custom_claims).is_none());
    Ok(())
}

#[tokio::test]
async fn created_reaction_eagerly_syncs_preseeded_active_profiles() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;
    let handler = ClaimsSyncHandler::new(fixture.service.clone());

    let mut profile =
        UserProfile::pending_signup(uid, "tenantuser@example.com", "Sam", None, Utc::now());
    profile.role_id = Some("financial_viewer".to_owned());
    profile.status = AccountStatus::Active;
    handler.on_profile_created(&profile).await?;

    let claims = fixture
        .identities
        .find(uid)
        .await?
        .and_then(|identity| identity.custom_claims)
        .ok_or_else(|| AppError::Internal("claims missing".to_owned()))?;
    assert_eq!(claims.role.as_deref(), Some("financial_viewer"));
    assert_eq!(claims.permissions.len(), 3);
    Ok(())
}

#[tokio::test]
async fn updated_reaction_fires_only_on_claim_relevant_changes() -> AppResult<()> {
    let uid = UserId::new();
    let fixture = fixture_with_identity(uid).await;
    let handler = ClaimsSyncHandler::new(fixture.service.clone());

    let before =
        UserProfile::pending_signup(uid, "tenantuser@example.com", "Sam", None, Utc::now());

    let mut renamed = before.clone();
    renamed.display_name = "Samuel".to_owned();
    handler.on_profile_updated(&before, &renamed).await?;
    assert!(fixture.log.lock().await.is_empty());

    let mut activated = before.clone();
    activated.role_id = Some("property_manager".to_owned());
    activated.status = AccountStatus::Active;
    handler.on_profile_updated(&before, &activated).await?;
    assert_eq!(
        fixture.log.lock().await.as_slice(),
        &[StoreWrite::IdentityClaims(uid), StoreWrite::ProfileMirror(uid)]
    );
    Ok(())
}
