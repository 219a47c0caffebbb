use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use rentfolio_core::{AppError, CallerIdentity};
use rentfolio_domain::UserId;
use tower_sessions::Session;

use crate::dto::CallerResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_USER_KEY, caller_identity_from_access};

/// POST /api/auth/logout - Clear the authenticated session.
pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me - Return the session's access snapshot.
pub async fn me_handler(
    Extension(identity): Extension<CallerIdentity>,
) -> ApiResult<Json<CallerResponse>> {
    Ok(Json(CallerResponse::from(&identity)))
}

/// POST /api/auth/refresh - Re-resolve access and update the session.
///
/// Claims assigned since login become effective here without a new
/// credential exchange; a revoked role likewise downgrades the snapshot.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    session: Session,
) -> ApiResult<Json<CallerResponse>> {
    let access = state
        .auth_service
        .refresh_access(UserId::from_uuid(identity.uid()))
        .await?;

    let refreshed =
        caller_identity_from_access(&access, identity.email().map(str::to_owned));
    session
        .insert(SESSION_USER_KEY, refreshed.clone())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    Ok(Json(CallerResponse::from(&refreshed)))
}
