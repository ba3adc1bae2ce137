use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
mod repo;

pub fn router() -> Router<AppState> {
    handlers::read_routes()
}

pub fn protected_router() -> Router<AppState> {
    handlers::write_routes()
}
