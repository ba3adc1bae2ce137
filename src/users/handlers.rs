use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{dto::{MessageResponse, PublicUser}, services::create_account, AuthUser},
    db::RepoError,
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath},
    state::AppState,
    users::{
        dto::{CreateUserRequest, CreatedUserResponse, UpdateUserRequest, UserProfile},
        repo_types::DEFAULT_ROLE,
        services::build_changes,
    },
};

/// All user routes sit behind the request gate.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/me", get(get_me))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn user_not_found() -> AppError {
    AppError::not_found("User not found")
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<Vec<UserProfile>>> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    let role = payload
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_ROLE)
        .to_string();
    let user = create_account(state.users.as_ref(), payload.account, &role).await?;
    info!(created_by = %caller, user_id = %user.id, role = %user.role, "user created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<UserProfile>> {
    // A valid token can outlive its account.
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id = %user_id, "token subject no longer exists");
        AppError::InvalidToken
    })?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<UserProfile>> {
    let user = state.users.find_by_id(id).await?.ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<UserProfile>> {
    let changes = build_changes(payload).await?;
    let user = match state.users.update(id, changes).await {
        Ok(Some(u)) => u,
        Ok(None) => return Err(user_not_found()),
        Err(RepoError::Conflict) => return Err(AppError::Conflict("User already exists".into())),
        Err(e) => return Err(e.into()),
    };
    info!(updated_by = %caller, user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if !state.users.delete(id).await? {
        return Err(user_not_found());
    }
    info!(deleted_by = %caller, user_id = %id, "user deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
