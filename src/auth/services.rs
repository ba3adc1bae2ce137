use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        jwt::JwtKeys,
        password::{burn_dummy_verify, hash_password, verify_password},
    },
    db::RepoError,
    error::{AppError, AppResult},
    users::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
};

const USER_EXISTS: &str = "User already exists";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Usernames and emails share one login field; an `@` would let a username shadow an email.
pub(crate) fn is_valid_username(username: &str) -> bool {
    !username.is_empty() && !username.contains('@')
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Argon2 is CPU-bound; keep it off the async workers.
pub(crate) async fn hash_blocking(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("hash task panicked")?
}

async fn verify_blocking(password: String, hash: Option<String>) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            burn_dummy_verify(&password);
            Ok(false)
        }
    })
    .await
    .context("verify task panicked")?
}

/// Validates, checks uniqueness, hashes and persists a new account.
///
/// The pre-insert existence check gives the common case a clean 409; the
/// unique constraints on `users` catch the concurrent case, and that
/// violation is reported as the same conflict.
pub async fn create_account(
    store: &dyn UserStore,
    req: RegisterRequest,
    role: &str,
) -> AppResult<User> {
    let username = req.username.trim().to_string();
    let email = normalize_email(&req.email);

    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Username and password are required"));
    }
    if !is_valid_username(&username) {
        return Err(AppError::validation("Username must not contain '@'"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    if store.exists(&email, &username).await? {
        warn!(email = %email, username = %username, "user already exists");
        return Err(AppError::Conflict(USER_EXISTS.into()));
    }

    let password_hash = hash_blocking(req.password).await?;

    let new_user = NewUser {
        email,
        username,
        password_hash,
        first_name: req.first_name.unwrap_or_default(),
        last_name: req.last_name.unwrap_or_default(),
        avatar: req.avatar.unwrap_or_default(),
        role: role.to_string(),
    };

    match store.create(new_user).await {
        Ok(user) => Ok(user),
        Err(RepoError::Conflict) => {
            warn!("unique constraint hit on insert; concurrent registration");
            Err(AppError::Conflict(USER_EXISTS.into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn register(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> AppResult<AuthResponse> {
    let user = create_account(store, req, crate::users::repo_types::DEFAULT_ROLE).await?;
    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(AuthResponse {
        token,
        user: PublicUser::from(&user),
    })
}

pub async fn login(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> AppResult<AuthResponse> {
    let identifier = req.username.trim();

    let user = if identifier.is_empty() {
        None
    } else {
        store.find_by_login(identifier).await?
    };

    let ok = verify_blocking(req.password, user.as_ref().map(|u| u.password_hash.clone())).await?;

    let user = match user {
        Some(u) if ok => u,
        Some(u) => {
            warn!(user_id = %u.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            warn!("login unknown identifier");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(AuthResponse {
        token,
        user: PublicUser::from(&user),
    })
}
