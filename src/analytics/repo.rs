use serde::Serialize;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::RepoResult;

/// An event joined with its (optional) user.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub event_type: String,
    pub event_data: Value,
    pub user_id: Option<Uuid>,
    pub session_id: String,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: OffsetDateTime,
    pub user_username: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub event_type: String,
    pub event_data: Value,
    pub user_id: Option<Uuid>,
    pub session_id: String,
    pub ip_address: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Totals {
    pub events: i64,
    pub users: i64,
    pub posts: i64,
    pub products: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EventTypeCount {
    pub event_type: String,
    pub count: i64,
}

const EVENT_SELECT: &str = r#"
    SELECT e.id, e.event_type, e.event_data, e.user_id, e.session_id, e.ip_address,
           e.user_agent, e.created_at,
           u.username AS user_username, u.email AS user_email
"#;

pub async fn insert(db: &PgPool, e: NewEvent) -> RepoResult<EventRow> {
    let row = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        WITH e AS (
            INSERT INTO analytics_events
                (id, event_type, event_data, user_id, session_id, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
        )
        {EVENT_SELECT}
        FROM e
        LEFT JOIN users u ON u.id = e.user_id
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&e.event_type)
    .bind(&e.event_data)
    .bind(e.user_id)
    .bind(&e.session_id)
    .bind(&e.ip_address)
    .bind(&e.user_agent)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn list(db: &PgPool) -> RepoResult<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(&format!(
        "{EVENT_SELECT} FROM analytics_events e LEFT JOIN users u ON u.id = e.user_id \
         ORDER BY e.created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn since(db: &PgPool, from: OffsetDateTime) -> RepoResult<Vec<EventRow>> {
    let rows = sqlx::query_as::<_, EventRow>(&format!(
        "{EVENT_SELECT} FROM analytics_events e LEFT JOIN users u ON u.id = e.user_id \
         WHERE e.created_at >= $1 ORDER BY e.created_at DESC"
    ))
    .bind(from)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn totals(db: &PgPool) -> RepoResult<Totals> {
    let row = sqlx::query_as::<_, Totals>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM analytics_events) AS events,
            (SELECT COUNT(*) FROM users)            AS users,
            (SELECT COUNT(*) FROM posts)            AS posts,
            (SELECT COUNT(*) FROM products)         AS products
        "#,
    )
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn top_event_types(db: &PgPool, limit: i64) -> RepoResult<Vec<EventTypeCount>> {
    let rows = sqlx::query_as::<_, EventTypeCount>(
        r#"
        SELECT event_type, COUNT(*) AS count
          FROM analytics_events
         GROUP BY event_type
         ORDER BY count DESC, event_type
         LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
