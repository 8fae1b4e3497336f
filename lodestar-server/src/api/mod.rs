use axum::Router;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::Level;

use crate::ApiContextRef;

mod health;
mod history;
mod research;

pub fn router() -> Router<ApiContextRef> {
    Router::new()
        .nest("/api/health", health::router())
        .nest("/api/research", research::router())
        .nest("/api/history", history::router())
        .layer(TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::ERROR)))
}
