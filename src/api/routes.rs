use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// Routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Watchlist
        .route(
            "/watchlist",
            get(handlers::list_watchlist)
                .post(handlers::add_to_watchlist)
                .delete(handlers::remove_from_watchlist)
                .fallback(handlers::watchlist_method_not_allowed),
        )
        .route("/watchlist/details", get(handlers::watchlist_details))
        .route("/watchlist/status", get(handlers::watchlist_status))
        .route("/admin/watchlist/reset", post(handlers::reset_watchlist))
        // Metadata proxy
        .route("/media/:media_type/:id", get(handlers::media_details))
        .route("/search", get(handlers::search_media))
        .route("/trending/:media_type", get(handlers::trending_media))
        // Recommendations
        .route("/recommendations", post(handlers::recommend))
}
