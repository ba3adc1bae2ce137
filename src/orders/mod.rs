use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
mod repo;
mod repo_types;
mod services;

pub fn protected_router() -> Router<AppState> {
    handlers::order_routes()
}
