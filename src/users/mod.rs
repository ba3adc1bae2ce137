use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Gated: every route here expects `require_auth` in front.
pub fn protected_router() -> Router<AppState> {
    handlers::user_routes()
}
