use axum::Json;
use axum::extract::State;
use rentfolio_application::{LoginOutcome, RegisterInput};
use rentfolio_core::AppError;
use tower_sessions::Session;

use crate::dto::{CallerResponse, GenericMessageResponse, LoginRequest, LoginResponse, SignupRequest};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_USER_KEY, caller_identity_from_access};

/// POST /api/signup - Create a pending account with email+password.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<Json<GenericMessageResponse>> {
    state
        .auth_service
        .register(RegisterInput {
            email: payload.email,
            password: payload.password,
            display_name: payload.display_name,
            access_request_message: payload.access_request_message,
        })
        .await?;

    Ok(Json(GenericMessageResponse {
        message: "account created and awaiting administrator approval".to_owned(),
    }))
}

/// POST /api/auth/login - Authenticate with email+password.
///
/// Valid credentials on a pending, rejected, or unassigned account do not
/// open a session; the outcome names the condition so the UI can explain.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    let (outcome, user) = match outcome {
        LoginOutcome::Active { access, identity } => {
            let caller = caller_identity_from_access(&access, Some(identity.email));

            // Rotate the session id before attaching the identity.
            session.cycle_id().await.map_err(|error| {
                AppError::Internal(format!("failed to rotate session: {error}"))
            })?;
            session
                .insert(SESSION_USER_KEY, caller.clone())
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to persist session identity: {error}"))
                })?;

            ("active", Some(CallerResponse::from(&caller)))
        }
        LoginOutcome::InvalidCredentials => {
            return Err(AppError::Unauthorized("invalid email or password".to_owned()).into());
        }
        LoginOutcome::AwaitingRoleAssignment => ("awaiting_role_assignment", None),
        LoginOutcome::PendingApproval => ("pending_approval", None),
        LoginOutcome::Rejected => ("rejected", None),
    };

    Ok(Json(LoginResponse { outcome, user }))
}
