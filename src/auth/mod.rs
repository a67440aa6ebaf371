use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod identity;
pub mod password;
pub mod permissions;
pub mod repo;
pub mod repo_types;
pub mod token;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
