use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn waitlist_routes(state: Arc<AppConfig>) -> Router {
    // Cron endpoint authenticates with the shared secret, not a user JWT
    let cron_routes = Router::new()
        .route("/cleanup", get(handlers::cleanup_expired));

    let protected_routes = Router::new()
        .route("/", get(handlers::list_entries).post(handlers::create_entry))
        .route("/count", get(handlers::count_active))
        .route("/{entry_id}", delete(handlers::delete_entry))
        .route("/{entry_id}/fulfill", post(handlers::fulfill_entry))
        .route("/cancellations/{appointment_id}", post(handlers::cancel_and_promote))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(cron_routes)
        .merge(protected_routes)
        .with_state(state)
}
