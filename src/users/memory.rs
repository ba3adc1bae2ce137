use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::{RepoError, RepoResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User, UserChanges};

/// In-process `UserStore` with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<User>> {
        self.users.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn collides(users: &[User], skip: Option<Uuid>, email: Option<&str>, username: Option<&str>) -> bool {
    users.iter().filter(|u| Some(u.id) != skip).any(|u| {
        email.is_some_and(|e| u.email == e) || username.is_some_and(|n| u.username == n)
    })
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.lock().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_login(&self, identifier: &str) -> RepoResult<Option<User>> {
        let users = self.lock();
        let lowered = identifier.to_lowercase();
        let found = users
            .iter()
            .find(|u| u.username == identifier)
            .or_else(|| users.iter().find(|u| u.email == lowered))
            .cloned();
        Ok(found)
    }

    async fn exists(&self, email: &str, username: &str) -> RepoResult<bool> {
        Ok(collides(&self.lock(), None, Some(email), Some(username)))
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let mut users = self.lock();
        if collides(&users, None, Some(&user.email), Some(&user.username)) {
            return Err(RepoError::Conflict);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar: user.avatar,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn list(&self) -> RepoResult<Vec<User>> {
        Ok(self.lock().clone())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut users = self.lock();
        if collides(&users, Some(id), changes.email.as_deref(), changes.username.as_deref()) {
            return Err(RepoError::Conflict);
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(v) = changes.email {
            user.email = v;
        }
        if let Some(v) = changes.username {
            user.username = v;
        }
        if let Some(v) = changes.password_hash {
            user.password_hash = v;
        }
        if let Some(v) = changes.first_name {
            user.first_name = v;
        }
        if let Some(v) = changes.last_name {
            user.last_name = v;
        }
        if let Some(v) = changes.avatar {
            user.avatar = v;
        }
        if let Some(v) = changes.role {
            user.role = v;
        }
        if let Some(v) = changes.is_active {
            user.is_active = v;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut users = self.lock();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}
