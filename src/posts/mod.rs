use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
mod repo;
mod repo_types;
mod services;

pub(crate) use repo::exists as post_exists;

pub fn router() -> Router<AppState> {
    handlers::read_routes()
}

pub fn protected_router() -> Router<AppState> {
    handlers::write_routes()
}
