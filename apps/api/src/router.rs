use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use availability_cell::booking_routes;
use shared_config::AppConfig;
use waitlist_cell::waitlist_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Scheduling API is running!" }))
        .nest("/booking", booking_routes(state.clone()))
        .nest("/waitlist", waitlist_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    use shared_utils::test_utils::TestConfig;

    #[tokio::test]
    async fn test_root_reports_running() {
        let app = create_router(TestConfig::default().to_arc());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Scheduling API is running!");
    }

    #[tokio::test]
    async fn test_cells_are_nested() {
        let app = create_router(TestConfig::default().to_arc());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/waitlist/cleanup")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
