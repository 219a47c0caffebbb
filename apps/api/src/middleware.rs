//! Request middleware: session authentication and origin screening.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use rentfolio_core::{AppError, CallerIdentity};
use tower_sessions::Session;

use crate::auth::SESSION_USER_KEY;
use crate::error::ApiResult;
use crate::state::AppState;

const MUTATING_METHODS: [Method; 4] = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

/// Loads the caller's identity from the session and exposes it to handlers
/// through request extensions. Anonymous sessions are turned away before
/// any handler runs.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity: CallerIdentity = session
        .get(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("session load failed: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Screens state-changing requests against the configured frontend origin;
/// reads pass through untouched. See [`AppState::permits_origin`].
pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if MUTATING_METHODS.contains(request.method()) && !state.permits_origin(request.headers()) {
        return Err(AppError::Unauthorized("request origin rejected".to_owned()).into());
    }

    Ok(next.run(request).await)
}
