use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::RepoResult;
use crate::users::repo_types::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, avatar, \
                            role, is_active, created_at, updated_at";

/// Credential store behind the auth flow and the user handlers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    /// Match a single identifier against username OR email.
    async fn find_by_login(&self, identifier: &str) -> RepoResult<Option<User>>;

    /// True when either the email or the username is already taken.
    async fn exists(&self, email: &str, username: &str) -> RepoResult<bool>;

    /// Fails with `RepoError::Conflict` when a unique key collides on insert.
    async fn create(&self, user: NewUser) -> RepoResult<User>;

    async fn list(&self) -> RepoResult<Vec<User>>;

    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>>;

    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_login(&self, identifier: &str) -> RepoResult<Option<User>> {
        // A username match wins if the identifier also equals someone else's email.
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = lower($1)
            ORDER BY (username = $1) DESC
            LIMIT 1
            "#
        ))
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn exists(&self, email: &str, username: &str) -> RepoResult<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(&self.db)
        .await?;
        Ok(found)
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, username, password_hash, first_name, last_name, avatar, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar)
        .bind(&user.role)
        .fetch_one(&self.db)
        .await?;
        Ok(created)
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                email         = COALESCE($2, email),
                username      = COALESCE($3, username),
                password_hash = COALESCE($4, password_hash),
                first_name    = COALESCE($5, first_name),
                last_name     = COALESCE($6, last_name),
                avatar        = COALESCE($7, avatar),
                role          = COALESCE($8, role),
                is_active     = COALESCE($9, is_active),
                updated_at    = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.email)
        .bind(changes.username)
        .bind(changes.password_hash)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.avatar)
        .bind(changes.role)
        .bind(changes.is_active)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
