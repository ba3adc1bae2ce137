use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, AuthUser},
    db::RepoError,
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath},
    posts::{
        dto::{CreatePostRequest, PostResponse, UpdatePostRequest},
        repo,
        services::{new_post, post_changes},
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:id", get(get_post))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", axum::routing::post(create_post))
        .route("/posts/:id", axum::routing::put(update_post).delete(delete_post))
}

fn post_not_found() -> AppError {
    AppError::not_found("Post not found")
}

fn slug_conflict(e: RepoError) -> AppError {
    match e {
        RepoError::Conflict => AppError::Conflict("A post with this slug already exists".into()),
        other => other.into(),
    }
}

async fn load(state: &AppState, id: Uuid) -> AppResult<PostResponse> {
    repo::get(&state.db, id)
        .await?
        .map(PostResponse::from)
        .ok_or_else(post_not_found)
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostResponse>>> {
    let rows = repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(PostResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<PostResponse>> {
    Ok(Json(load(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<PostResponse>)> {
    let post = new_post(user_id, payload)?;
    let id = repo::insert(&state.db, post).await.map_err(slug_conflict)?;
    info!(post_id = %id, author_id = %user_id, "post created");
    Ok((StatusCode::CREATED, Json(load(&state, id).await?)))
}

/// Only the author may edit; anyone else sees a 404.
#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> AppResult<Json<PostResponse>> {
    let changes = post_changes(payload)?;
    if !repo::update(&state.db, id, user_id, changes)
        .await
        .map_err(slug_conflict)?
    {
        return Err(post_not_found());
    }
    info!(post_id = %id, "post updated");
    Ok(Json(load(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    if !repo::delete(&state.db, id, user_id).await? {
        return Err(post_not_found());
    }
    info!(post_id = %id, "post deleted");
    Ok(Json(MessageResponse {
        message: "Post deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::repo_types::PostRow;
    use time::OffsetDateTime;

    #[test]
    fn response_nests_redacted_author() {
        let author_id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let json = serde_json::to_value(PostResponse::from(PostRow {
            id: Uuid::new_v4(),
            title: "Hello".into(),
            content: "body".into(),
            slug: "hello".into(),
            author_id,
            status: "draft".into(),
            published_at: None,
            created_at: now,
            updated_at: now,
            author_username: "alice".into(),
            author_email: "a@x.com".into(),
        }))
        .unwrap();
        assert_eq!(json["author"]["id"], author_id.to_string());
        assert_eq!(json["author"]["username"], "alice");
        assert!(json["published_at"].is_null());
        assert!(json["created_at"].is_string());
    }

    #[test]
    fn slug_conflict_maps_to_409() {
        assert_eq!(
            slug_conflict(RepoError::Conflict).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            slug_conflict(RepoError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
