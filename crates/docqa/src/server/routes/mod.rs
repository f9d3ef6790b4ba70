//! HTTP routes for the QA server

pub mod query;

use axum::{routing::get, Router};

use crate::server::state::AppState;

/// Build all routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/query", get(query::query))
}
