use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, cancel_reservation, create_post, create_reservation, get_post, get_post_history,
    get_reservation, list_post_reservations, list_posts, relist_post, withdraw_post,
};

/// Creates the API router with all booking endpoints
///
/// Command endpoints (Write operations):
/// - POST /posts - Register a post
/// - POST /posts/:id/withdraw - Withdraw a post from listing
/// - POST /posts/:id/relist - Relist a withdrawn post
/// - POST /reservations - Request a booking
/// - POST /api/DateReserve - Request a booking (path used by the dashboard form)
/// - POST /reservations/:id/cancel - Cancel a booking
///
/// Query endpoints (Read operations):
/// - GET /posts - List available posts
/// - GET /posts/:id - Post details
/// - GET /posts/:id/reservations - Active reservations of a post
/// - GET /posts/:id/history - Booking history of a post
/// - GET /reservations/:id - Reservation details
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Posts
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:id", get(get_post))
        .route("/posts/:id/withdraw", post(withdraw_post))
        .route("/posts/:id/relist", post(relist_post))
        .route("/posts/:id/reservations", get(list_post_reservations))
        .route("/posts/:id/history", get(get_post_history))
        // Reservations
        .route("/reservations", post(create_reservation))
        .route("/api/DateReserve", post(create_reservation))
        .route("/reservations/:id", get(get_reservation))
        .route("/reservations/:id/cancel", post(cancel_reservation))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
