//! Route modules for the contract highlights server

pub mod categories;
pub mod documents;
pub mod health;
pub mod highlights;

use axum::Router;

use crate::state::AppState;

/// All `/api/v1` routes
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(documents::router())
        .merge(highlights::router())
        .merge(categories::router())
}
