use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/user/{username}",
            get(handlers::users::list_testers_handler),
        )
        .route(
            "/user/delete/uuids",
            post(handlers::users::delete_uuids_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use authsweep_application::PruneService;
    use authsweep_domain::UserRecord;
    use authsweep_infrastructure::InMemoryUserDirectory;
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use super::build_router;
    use crate::state::AppState;

    fn test_router(directory: Arc<InMemoryUserDirectory>) -> axum::Router {
        build_router(AppState {
            prune_service: PruneService::new(directory),
            project_id: "demo-authsweep".to_owned(),
        })
    }

    fn tester(uid: &str, email: &str) -> UserRecord {
        UserRecord::new(uid, Utc.timestamp_opt(0, 0).single().unwrap_or_default())
            .with_email(Some(email.to_owned()))
    }

    async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router
            .oneshot(request)
            .await
            .unwrap_or_else(|error| panic!("request failed: {error}"));
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|error| panic!("failed to read body: {error}"));
        (status, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let router = test_router(Arc::new(InMemoryUserDirectory::default()));
        let request = Request::get("/health")
            .body(Body::empty())
            .unwrap_or_else(|error| panic!("invalid request: {error}"));

        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body)
            .unwrap_or_else(|error| panic!("health body is not JSON: {error}"));
        assert_eq!(value["status"], "ok");
    }

    #[tokio::test]
    async fn listing_route_renders_candidates() {
        let directory = Arc::new(InMemoryUserDirectory::new(1).with_users([
            tester("t-1", "carol+one@example.com"),
            tester("t-2", "carol@example.com"),
        ]));
        let request = Request::get("/user/carol@example.com")
            .body(Body::empty())
            .unwrap_or_else(|error| panic!("invalid request: {error}"));

        let (status, body) = send(test_router(directory), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("carol+one@example.com"));
        assert!(!body.contains("t-2"));
    }

    #[tokio::test]
    async fn delete_route_accepts_urlencoded_form() {
        let directory = Arc::new(InMemoryUserDirectory::default().with_users([
            tester("t-1", "carol+one@example.com"),
            tester("t-2", "carol+two@example.com"),
        ]));
        let request = Request::post("/user/delete/uuids")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("t-1=on&t-2=on"))
            .unwrap_or_else(|error| panic!("invalid request: {error}"));

        let (status, body) = send(test_router(directory.clone()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Deleting 2 tester accounts...");
        assert!(directory.uids().await.is_empty());
    }
}
