use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::CommentRow;
use crate::auth::dto::PublicUser;

#[derive(Debug, Deserialize)]
pub struct CommentFilter {
    pub post_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
    pub is_approved: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub post: PostSummary,
    pub author_id: Uuid,
    pub author: PublicUser,
    pub is_approved: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<CommentRow> for CommentResponse {
    fn from(r: CommentRow) -> Self {
        Self {
            id: r.id,
            content: r.content,
            post_id: r.post_id,
            post: PostSummary {
                id: r.post_id,
                title: r.post_title,
                slug: r.post_slug,
            },
            author_id: r.author_id,
            author: PublicUser {
                id: r.author_id,
                username: r.author_username,
                email: r.author_email,
            },
            is_approved: r.is_approved,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
