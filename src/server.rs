//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let word_routes = Router::new()
        .route("/", get(handlers::word_list))
        .route("/", post(handlers::word_create))
        .route("/bulk-delete", post(handlers::word_bulk_delete))
        .route("/{id}", get(handlers::word_get))
        .route("/{id}", put(handlers::word_update))
        .route("/{id}", delete(handlers::word_delete));

    let api_routes = Router::new()
        .route("/scan/{ebook_id}", post(handlers::api_scan))
        .route("/results/{ebook_id}", get(handlers::api_results))
        .route("/stats", get(handlers::api_stats));

    Router::new()
        .route("/", get(handlers::index))
        .nest("/api/words", word_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
