use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::{cookie, extractors::AuthUser};
use crate::{error::AppError, state::AppState};

/// Request gate for protected routers.
///
/// Reads the token from the session cookie (falling back to a bearer header),
/// validates it and stores the subject as [`AuthUser`] in the request
/// extensions. Authentication only: no role checks happen here.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = cookie::read_session(&jar, &state.config.cookie)
        .or_else(|| cookie::read_bearer(req.headers()))
        .ok_or_else(|| {
            warn!(uri = %req.uri(), "missing auth token");
            AppError::Unauthorized
        })?;

    let user_id = state.keys.validate(&token).map_err(|e| {
        warn!(uri = %req.uri(), "invalid or expired token");
        e
    })?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
