use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::RepoResult;

#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub is_approved: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_username: String,
    pub author_email: String,
    pub post_title: String,
    pub post_slug: String,
}

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.content, c.post_id, c.author_id, c.is_approved, c.created_at, c.updated_at,
           u.username AS author_username, u.email AS author_email,
           p.title AS post_title, p.slug AS post_slug
    FROM comments c
    JOIN users u ON u.id = c.author_id
    JOIN posts p ON p.id = c.post_id
"#;

pub async fn list(db: &PgPool, post_id: Option<Uuid>) -> RepoResult<Vec<CommentRow>> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "{COMMENT_SELECT} WHERE ($1::uuid IS NULL OR c.post_id = $1) ORDER BY c.created_at ASC"
    ))
    .bind(post_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> RepoResult<Option<CommentRow>> {
    let row = sqlx::query_as::<_, CommentRow>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert(db: &PgPool, post_id: Uuid, author_id: Uuid, content: &str) -> RepoResult<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO comments (id, content, post_id, author_id) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(content)
        .bind(post_id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(id)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    author_id: Uuid,
    content: Option<String>,
    is_approved: Option<bool>,
) -> RepoResult<bool> {
    let res = sqlx::query(
        r#"
        UPDATE comments SET
            content     = COALESCE($3, content),
            is_approved = COALESCE($4, is_approved),
            updated_at  = now()
        WHERE id = $1 AND author_id = $2
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(content)
    .bind(is_approved)
    .execute(db)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, id: Uuid, author_id: Uuid) -> RepoResult<bool> {
    let res = sqlx::query("DELETE FROM comments WHERE id = $1 AND author_id = $2")
        .bind(id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
