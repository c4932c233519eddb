//! Contract Highlights
//!
//! Text annotation engine for contract review: users tag spans of a flat
//! legal document with categories, the tags are persisted, and the document
//! is re-rendered with every tag superimposed without touching the text.
//!
//! # Modules
//!
//! - `annotations`: highlight and category model, registry and store
//! - `selection`: mapping a user selection to character offsets
//! - `html`: render engine and markup helpers
//! - `export`: CSV export
//! - `storage`: key-value persistence backends and the background writer
//! - `session`: one document under review
//! - `routes`, `state`, `error`: the HTTP service

pub mod annotations;
pub mod config;
pub mod error;
pub mod export;
pub mod html;
pub mod routes;
pub mod selection;
pub mod session;
pub mod state;
pub mod storage;
pub mod text;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the service router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
