use crate::{
    auth::services::{hash_blocking, is_valid_email, is_valid_username, normalize_email},
    error::{AppError, AppResult},
    users::{dto::UpdateUserRequest, repo_types::UserChanges},
};

fn required(field: &str, value: Option<String>) -> AppResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(AppError::validation(format!("{field} must not be empty"))),
        other => Ok(other),
    }
}

/// Turns an update payload into store changes, hashing a new password if one is given.
pub async fn build_changes(req: UpdateUserRequest) -> AppResult<UserChanges> {
    let username = required("username", req.username)?;
    if username.as_deref().is_some_and(|u| !is_valid_username(u)) {
        return Err(AppError::validation("Username must not contain '@'"));
    }
    let role = required("role", req.role)?;

    let email = match req.email {
        Some(e) => {
            let e = normalize_email(&e);
            if !is_valid_email(&e) {
                return Err(AppError::validation("Invalid email"));
            }
            Some(e)
        }
        None => None,
    };

    let password_hash = match req.password {
        Some(p) if p.is_empty() => return Err(AppError::validation("password must not be empty")),
        Some(p) => Some(hash_blocking(p).await?),
        None => None,
    };

    Ok(UserChanges {
        email,
        username,
        password_hash,
        first_name: req.first_name,
        last_name: req.last_name,
        avatar: req.avatar,
        role,
        is_active: req.is_active,
    })
}
