use sqlx::PgPool;
use uuid::Uuid;

use crate::db::RepoResult;
use crate::posts::repo_types::{NewPost, PostChanges, PostRow};

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.content, p.slug, p.author_id, p.status, p.published_at,
           p.created_at, p.updated_at,
           u.username AS author_username, u.email AS author_email
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

pub async fn list(db: &PgPool) -> RepoResult<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} ORDER BY p.created_at DESC"))
        .fetch_all(db)
        .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> RepoResult<Option<PostRow>> {
    let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert(db: &PgPool, post: NewPost) -> RepoResult<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO posts (id, title, content, slug, author_id, status, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, CASE WHEN $6 = 'published' THEN now() END)
        "#,
    )
    .bind(id)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.slug)
    .bind(post.author_id)
    .bind(&post.status)
    .execute(db)
    .await?;
    Ok(id)
}

/// Updates a post owned by `author_id`. `published_at` is stamped on the first publish only.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    author_id: Uuid,
    changes: PostChanges,
) -> RepoResult<bool> {
    let res = sqlx::query(
        r#"
        UPDATE posts SET
            title        = COALESCE($3, title),
            slug         = COALESCE($4, slug),
            content      = COALESCE($5, content),
            status       = COALESCE($6, status),
            published_at = CASE
                               WHEN $6 = 'published' AND published_at IS NULL THEN now()
                               ELSE published_at
                           END,
            updated_at   = now()
        WHERE id = $1 AND author_id = $2
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(changes.title)
    .bind(changes.slug)
    .bind(changes.content)
    .bind(changes.status)
    .execute(db)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, id: Uuid, author_id: Uuid) -> RepoResult<bool> {
    let res = sqlx::query("DELETE FROM posts WHERE id = $1 AND author_id = $2")
        .bind(id)
        .bind(author_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn exists(db: &PgPool, id: Uuid) -> RepoResult<bool> {
    let found = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(found)
}
