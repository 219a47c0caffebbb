use axum::Json;
use axum::extract::{Extension, State};
use rentfolio_application::SetUserClaimsInput;
use rentfolio_core::{CallerIdentity, OrganizationId};
use rentfolio_domain::{AccountStatus, UserId};

use crate::dto::{ClaimsAssignmentResponse, ClaimsResponse, SetClaimsRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/claims/set - Assign a role to a user (administrators only).
pub async fn set_claims_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<SetClaimsRequest>,
) -> ApiResult<Json<ClaimsAssignmentResponse>> {
    let status = payload
        .status
        .as_deref()
        .map(AccountStatus::parse)
        .transpose()?;

    let assignment = state
        .claims_service
        .set_user_claims(
            &caller,
            SetUserClaimsInput {
                target_uid: UserId::from_uuid(payload.user_id),
                role_id: payload.role_id,
                organization_id: payload.organization_id.map(OrganizationId::from_uuid),
                status,
            },
        )
        .await?;

    Ok(Json(ClaimsAssignmentResponse {
        user_id: assignment.uid.as_uuid(),
        role: assignment.role,
        permissions_count: assignment.permissions_count,
    }))
}

/// GET /api/claims/me - Return the caller's stored identity claims.
pub async fn my_claims_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<Json<ClaimsResponse>> {
    let view = state
        .claims_service
        .get_user_claims(UserId::from_uuid(caller.uid()))
        .await?;

    Ok(Json(ClaimsResponse {
        user_id: view.uid.as_uuid(),
        email: view.email,
        custom_claims: view.custom_claims,
    }))
}
