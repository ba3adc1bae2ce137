use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
mod repo;
mod repo_types;
mod services;

pub(crate) use repo::{get_many, get_many_tx as lock_products};
pub(crate) use repo_types::Product;
pub(crate) use services::MAX_AMOUNT;

pub fn router() -> Router<AppState> {
    handlers::read_routes()
}

pub fn protected_router() -> Router<AppState> {
    handlers::write_routes()
}
