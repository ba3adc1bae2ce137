use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use time::Duration;
use tracing::{info, instrument};

use crate::{
    auth::{
        cookie,
        dto::{AuthResponse, LoginRequest, MessageResponse, RegisterRequest},
        services,
    },
    error::AppResult,
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

fn with_session(state: &AppState, jar: CookieJar, token: &str) -> CookieJar {
    let max_age = Duration::seconds(state.keys.ttl().as_secs() as i64);
    jar.add(cookie::session_cookie(
        &state.config.cookie,
        token.to_string(),
        max_age,
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    let res = services::register(state.users.as_ref(), &state.keys, payload).await?;
    let jar = with_session(&state, jar, &res.token);
    Ok((StatusCode::CREATED, jar, Json(res)))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let res = services::login(state.users.as_ref(), &state.keys, payload).await?;
    let jar = with_session(&state, jar, &res.token);
    Ok((jar, Json(res)))
}

/// Tokens are not tracked server-side, so this only tells the client to drop the cookie.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let jar = jar.add(cookie::clear_cookie(&state.config.cookie));
    info!("logout acknowledged");
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderMap, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn post_json(state: AppState, uri: &str, body: Value) -> (StatusCode, HeaderMap, Value) {
        let res = auth_routes()
            .with_state(state)
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }

    #[tokio::test]
    async fn register_sets_cookie_and_returns_redacted_user() {
        let state = AppState::fake();
        let (status, headers, body) = post_json(
            state.clone(),
            "/auth/register",
            json!({"username": "alice", "email": "a@x.com", "password": "pw123"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        let token = body["token"].as_str().unwrap();
        assert!(set_cookie.starts_with(&format!("jwt={token};")));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("Max-Age=300"));
        assert!(!set_cookie.contains("Secure"));

        let user = body["user"].as_object().unwrap();
        assert_eq!(user.len(), 3);
        assert_eq!(user["username"], "alice");
        assert_eq!(user["email"], "a@x.com");
        assert_eq!(
            state.keys.validate(token).unwrap().to_string(),
            user["id"].as_str().unwrap()
        );
    }

    #[tokio::test]
    async fn register_conflict_and_validation_statuses() {
        let state = AppState::fake();
        let body = json!({"username": "alice", "email": "a@x.com", "password": "pw123"});
        post_json(state.clone(), "/auth/register", body.clone()).await;

        let (status, _, err) = post_json(state.clone(), "/auth/register", body).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["error"], "User already exists");

        let (status, _, _) = post_json(
            state.clone(),
            "/auth/register",
            json!({"username": "", "email": "e@x.com", "password": "pw"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let res = auth_routes()
            .with_state(AppState::fake())
            .oneshot(
                Request::post("/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let state = AppState::fake();
        post_json(
            state.clone(),
            "/auth/register",
            json!({"username": "alice", "email": "a@x.com", "password": "pw123"}),
        )
        .await;

        let wrong_pw = post_json(
            state.clone(),
            "/auth/login",
            json!({"username": "alice", "password": "nope"}),
        )
        .await;
        let unknown = post_json(
            state.clone(),
            "/auth/login",
            json!({"username": "mallory", "password": "nope"}),
        )
        .await;
        assert_eq!(wrong_pw.0, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_pw.2, unknown.2);
        assert!(wrong_pw.1.get(header::SET_COOKIE).is_none());

        let (status, headers, body) = post_json(
            state,
            "/auth/login",
            json!({"usernameOrEmail": "a@x.com", "password": "pw123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.get(header::SET_COOKIE).is_some());
        assert_eq!(body["user"]["username"], "alice");
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let (status, headers, body) =
            post_json(AppState::fake(), "/auth/logout", Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Logged out successfully");
        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
