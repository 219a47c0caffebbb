//! PostgreSQL-backed profile document repository.

use async_trait::async_trait;
use sqlx::PgPool;

use rentfolio_application::{ClaimsMirror, ProfileRepository};
use rentfolio_core::{AppError, AppResult, OrganizationId};
use rentfolio_domain::{AccountStatus, Permission, UserId, UserProfile};

/// PostgreSQL implementation of the profile repository port.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: uuid::Uuid,
    email: String,
    display_name: String,
    role_id: Option<String>,
    permissions: serde_json::Value,
    organization_id: Option<uuid::Uuid>,
    status: String,
    access_request_message: Option<String>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let permissions: Vec<Permission> =
            serde_json::from_value(row.permissions).map_err(|error| {
                AppError::Internal(format!("failed to decode stored permissions: {error}"))
            })?;

        Ok(Self {
            uid: UserId::from_uuid(row.id),
            email: row.email,
            display_name: row.display_name,
            role_id: row.role_id,
            permissions,
            organization_id: row.organization_id.map(OrganizationId::from_uuid),
            status: AccountStatus::parse(&row.status)?,
            access_request_message: row.access_request_message,
            updated_at: row.updated_at,
        })
    }
}

fn encode_permissions(permissions: &[Permission]) -> AppResult<serde_json::Value> {
    serde_json::to_value(permissions)
        .map_err(|error| AppError::Internal(format!("failed to encode permissions: {error}")))
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find(&self, uid: UserId) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, display_name, role_id, permissions,
                   organization_id, status, access_request_message, updated_at
            FROM user_profiles
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(uid.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find profile: {error}")))?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn insert(&self, profile: &UserProfile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles
                (id, email, display_name, role_id, permissions,
                 organization_id, status, access_request_message, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(profile.uid.as_uuid())
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(&profile.role_id)
        .bind(encode_permissions(&profile.permissions)?)
        .bind(profile.organization_id.map(|id| id.as_uuid()))
        .bind(profile.status.as_str())
        .bind(&profile.access_request_message)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|db_error| db_error.is_unique_violation())
            {
                AppError::Conflict(format!("profile '{}' already exists", profile.uid))
            } else {
                AppError::Internal(format!("failed to insert profile: {error}"))
            }
        })?;

        Ok(())
    }

    async fn update(&self, profile: &UserProfile) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE user_profiles
            SET email = $2, display_name = $3, role_id = $4, permissions = $5,
                organization_id = $6, status = $7, access_request_message = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(profile.uid.as_uuid())
        .bind(&profile.email)
        .bind(&profile.display_name)
        .bind(&profile.role_id)
        .bind(encode_permissions(&profile.permissions)?)
        .bind(profile.organization_id.map(|id| id.as_uuid()))
        .bind(profile.status.as_str())
        .bind(&profile.access_request_message)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update profile: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "profile '{}' not found",
                profile.uid
            )));
        }

        Ok(())
    }

    async fn apply_claims_mirror(
        &self,
        uid: UserId,
        email: &str,
        mirror: &ClaimsMirror,
    ) -> AppResult<()> {
        // Upsert so a claims write landing before any signup still leaves a
        // readable document; display_name only applies on first insert.
        sqlx::query(
            r#"
            INSERT INTO user_profiles
                (id, email, display_name, role_id, permissions,
                 organization_id, status, access_request_message, updated_at)
            VALUES ($1, $2, $2, $3, $4, $5, $6, NULL, $7)
            ON CONFLICT (id) DO UPDATE
            SET role_id = EXCLUDED.role_id,
                permissions = EXCLUDED.permissions,
                organization_id = EXCLUDED.organization_id,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(uid.as_uuid())
        .bind(email)
        .bind(&mirror.role_id)
        .bind(encode_permissions(&mirror.permissions)?)
        .bind(mirror.organization_id.map(|id| id.as_uuid()))
        .bind(mirror.status.as_str())
        .bind(mirror.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to mirror claims: {error}")))?;

        Ok(())
    }
}
