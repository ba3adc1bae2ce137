use crate::state::AppState;
use axum::Router;

mod claims;
pub mod cookie;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod services;

pub use extractors::AuthUser;
pub use middleware::require_auth;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
