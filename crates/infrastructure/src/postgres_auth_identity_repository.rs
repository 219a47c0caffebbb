//! PostgreSQL-backed auth identity repository.

use async_trait::async_trait;
use sqlx::PgPool;

use rentfolio_application::{AuthIdentity, AuthIdentityRepository};
use rentfolio_core::{AppError, AppResult};
use rentfolio_domain::{CustomClaims, UserId};

/// PostgreSQL implementation of the auth identity repository port.
#[derive(Clone)]
pub struct PostgresAuthIdentityRepository {
    pool: PgPool,
}

impl PostgresAuthIdentityRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuthIdentityRow {
    id: uuid::Uuid,
    email: String,
    password_hash: Option<String>,
    custom_claims: Option<serde_json::Value>,
}

impl TryFrom<AuthIdentityRow> for AuthIdentity {
    type Error = AppError;

    fn try_from(row: AuthIdentityRow) -> Result<Self, Self::Error> {
        let custom_claims = row
            .custom_claims
            .map(serde_json::from_value::<CustomClaims>)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!("failed to decode stored claims: {error}"))
            })?;

        Ok(Self {
            uid: UserId::from_uuid(row.id),
            email: row.email,
            password_hash: row.password_hash,
            custom_claims,
        })
    }
}

#[async_trait]
impl AuthIdentityRepository for PostgresAuthIdentityRepository {
    async fn find(&self, uid: UserId) -> AppResult<Option<AuthIdentity>> {
        let row = sqlx::query_as::<_, AuthIdentityRow>(
            r#"
            SELECT id, email, password_hash, custom_claims
            FROM auth_identities
            WHERE id = $1
            LIMIT 1
            "#,
        )
        .bind(uid.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find auth identity: {error}")))?;

        row.map(AuthIdentity::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<AuthIdentity>> {
        let row = sqlx::query_as::<_, AuthIdentityRow>(
            r#"
            SELECT id, email, password_hash, custom_claims
            FROM auth_identities
            WHERE LOWER(email) = LOWER($1)
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find auth identity by email: {error}"))
        })?;

        row.map(AuthIdentity::try_from).transpose()
    }

    async fn create(&self, identity: &AuthIdentity) -> AppResult<()> {
        let custom_claims = identity
            .custom_claims
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|error| AppError::Internal(format!("failed to encode claims: {error}")))?;

        sqlx::query(
            r#"
            INSERT INTO auth_identities (id, email, password_hash, custom_claims)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(identity.uid.as_uuid())
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(custom_claims)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if error
                .as_database_error()
                .is_some_and(|db_error| db_error.is_unique_violation())
            {
                AppError::Conflict(format!(
                    "auth identity with email '{}' already exists",
                    identity.email
                ))
            } else {
                AppError::Internal(format!("failed to create auth identity: {error}"))
            }
        })?;

        Ok(())
    }

    async fn set_custom_claims(&self, uid: UserId, claims: &CustomClaims) -> AppResult<()> {
        let custom_claims = serde_json::to_value(claims)
            .map_err(|error| AppError::Internal(format!("failed to encode claims: {error}")))?;

        let result = sqlx::query(
            r#"
            UPDATE auth_identities
            SET custom_claims = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(uid.as_uuid())
        .bind(custom_claims)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to write claims: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "auth identity '{uid}' not found"
            )));
        }

        Ok(())
    }
}
