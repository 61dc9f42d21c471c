use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    // Public calendar reads
    let public_routes = Router::new()
        .route("/{slug}/available-days", get(handlers::get_available_days))
        .route("/{slug}/slots", get(handlers::get_slots));

    // Booking requires a signed-in patient
    let protected_routes = Router::new()
        .route("/{slug}/appointments", post(handlers::book_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
