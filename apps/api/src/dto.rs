use chrono::{DateTime, Utc};
use rentfolio_core::CallerIdentity;
use rentfolio_domain::CustomClaims;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Incoming payload for email/password signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub access_request_message: Option<String>,
}

/// Incoming payload for email/password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login outcome response; `user` is present only for an active login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CallerResponse>,
}

/// Caller-facing snapshot of the authenticated session.
#[derive(Debug, Serialize)]
pub struct CallerResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
    pub permissions: Vec<String>,
    pub organization_id: Option<Uuid>,
    pub status: String,
    pub refreshed_at: DateTime<Utc>,
}

impl From<&CallerIdentity> for CallerResponse {
    fn from(identity: &CallerIdentity) -> Self {
        Self {
            user_id: identity.uid(),
            email: identity.email().map(str::to_owned),
            role: identity.role().map(str::to_owned),
            permissions: identity.permissions().to_vec(),
            organization_id: identity.organization_id().map(|id| id.as_uuid()),
            status: identity.status().to_owned(),
            refreshed_at: identity.refreshed_at(),
        }
    }
}

/// Incoming payload for an explicit role assignment.
#[derive(Debug, Deserialize)]
pub struct SetClaimsRequest {
    pub user_id: Uuid,
    pub role_id: String,
    pub organization_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Response for a successful role assignment.
#[derive(Debug, Serialize)]
pub struct ClaimsAssignmentResponse {
    pub user_id: Uuid,
    pub role: String,
    pub permissions_count: usize,
}

/// Caller-facing view of stored identity claims.
#[derive(Debug, Serialize)]
pub struct ClaimsResponse {
    pub user_id: Uuid,
    pub email: String,
    pub custom_claims: Option<CustomClaims>,
}

/// Generic confirmation payload.
#[derive(Debug, Serialize)]
pub struct GenericMessageResponse {
    pub message: String,
}

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub message: &'static str,
}
