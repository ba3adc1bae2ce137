use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, AuthUser},
    comments::{
        dto::{CommentFilter, CommentResponse, CreateCommentRequest, UpdateCommentRequest},
        repo,
    },
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    posts::post_exists,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments))
        .route("/comments/:id", get(get_comment))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", post(create_comment))
        .route("/comments/:id", put(update_comment).delete(delete_comment))
}

fn comment_not_found() -> AppError {
    AppError::not_found("Comment not found")
}

fn checked_content(content: &str) -> AppResult<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::validation("Content is required"));
    }
    Ok(content.to_string())
}

async fn load(state: &AppState, id: Uuid) -> AppResult<CommentResponse> {
    repo::get(&state.db, id)
        .await?
        .map(CommentResponse::from)
        .ok_or_else(comment_not_found)
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CommentFilter>,
) -> AppResult<Json<Vec<CommentResponse>>> {
    let rows = repo::list(&state.db, filter.post_id).await?;
    Ok(Json(rows.into_iter().map(CommentResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<CommentResponse>> {
    Ok(Json(load(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentResponse>)> {
    let content = checked_content(&payload.content)?;
    if !post_exists(&state.db, payload.post_id).await? {
        return Err(AppError::not_found("Post not found"));
    }
    let id = repo::insert(&state.db, payload.post_id, user_id, &content).await?;
    info!(comment_id = %id, post_id = %payload.post_id, "comment created");
    Ok((StatusCode::CREATED, Json(load(&state, id).await?)))
}

/// Only the author may edit or delete a comment.
#[instrument(skip(state, payload))]
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateCommentRequest>,
) -> AppResult<Json<CommentResponse>> {
    let content = payload.content.as_deref().map(checked_content).transpose()?;
    if !repo::update(&state.db, id, user_id, content, payload.is_approved).await? {
        return Err(comment_not_found());
    }
    Ok(Json(load(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if !repo::delete(&state.db, id, user_id).await? {
        return Err(comment_not_found());
    }
    info!(comment_id = %id, "comment deleted");
    Ok(Json(MessageResponse {
        message: "Comment deleted successfully",
    }))
}
