//! Route table

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, exports, health};
use crate::state::AppState;

/// Build the HTTP router.
///
/// Admin routes are mounted only when an admin key is configured.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health))
        .route(
            "/playlists/{playlist_id}/exports",
            post(exports::export_playlist),
        );

    if state.admin_key.is_some() {
        router = router
            .route("/exports/queue", get(admin::queue_depth))
            .route("/exports/dead-letters", get(admin::list_dead_letters))
            .route(
                "/exports/dead-letters/{id}/requeue",
                post(admin::requeue_dead_letter),
            );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{issue_access_token, JwtDecoder};
    use crate::error::StatusBody;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use playlist_export_core::application::{ExportProducer, ExportService, OwnershipGate};
    use playlist_export_core::domain::{ExportJob, EXPORT_QUEUE};
    use playlist_export_core::port::message_broker::mocks::InMemoryBroker;
    use playlist_export_core::port::playlist_repository::mocks::InMemoryPlaylistRepository;
    use playlist_export_core::port::MessageBroker;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &str = "access-token-key";
    const ADMIN_KEY: &str = "admin-key";
    const FAR_FUTURE: u64 = 4_102_444_800;

    struct TestApp {
        router: Router,
        broker: Arc<InMemoryBroker>,
    }

    fn app(admin_key: Option<&str>) -> TestApp {
        let repo = Arc::new(InMemoryPlaylistRepository::new());
        repo.add_playlist("playlist-abc", "Road trip", "user-1");
        let broker = Arc::new(InMemoryBroker::default());

        let service = Arc::new(ExportService::new(
            Arc::new(OwnershipGate::new(repo)),
            Arc::new(ExportProducer::new(broker.clone(), EXPORT_QUEUE)),
        ));
        let state = AppState::new(service, broker.clone(), EXPORT_QUEUE, JwtDecoder::new(SECRET))
            .with_admin_key(admin_key.map(str::to_string));

        TestApp {
            router: build_router(state),
            broker,
        }
    }

    fn bearer(user_id: &str) -> String {
        format!(
            "Bearer {}",
            issue_access_token(SECRET, user_id, FAR_FUTURE).unwrap()
        )
    }

    fn export_request(user_id: Option<&str>, playlist_id: &str, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/playlists/{}/exports", playlist_id))
            .header("content-type", "application/json");
        if let Some(user_id) = user_id {
            builder = builder.header("authorization", bearer(user_id));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_owner_export_is_queued() {
        let app = app(None);
        let response = app
            .router
            .oneshot(export_request(
                Some("user-1"),
                "playlist-abc",
                r#"{"targetEmail":"a@b.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: StatusBody = read_json(response).await;
        assert_eq!(body.status, "success");

        let bodies = app.broker.pending_bodies(EXPORT_QUEUE);
        assert_eq!(bodies.len(), 1);
        let job = ExportJob::from_message_body(&bodies[0]).unwrap();
        assert_eq!(job, ExportJob::new("playlist-abc", "user-1", "a@b.com"));
    }

    #[tokio::test]
    async fn test_non_owner_is_forbidden() {
        let app = app(None);
        let response = app
            .router
            .oneshot(export_request(
                Some("user-2"),
                "playlist-abc",
                r#"{"targetEmail":"a@b.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: StatusBody = read_json(response).await;
        assert_eq!(body.status, "fail");
        assert!(app.broker.pending_bodies(EXPORT_QUEUE).is_empty());
    }

    #[tokio::test]
    async fn test_missing_playlist_is_not_found() {
        let app = app(None);
        let response = app
            .router
            .oneshot(export_request(
                Some("user-1"),
                "playlist-zzz",
                r#"{"targetEmail":"a@b.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_email_is_bad_request() {
        let app = app(None);
        for body in [r#"{"targetEmail":"nope"}"#, r#"{}"#, "not json"] {
            let response = app
                .router
                .clone()
                .oneshot(export_request(Some("user-1"), "playlist-abc", body))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", body);
            let parsed: StatusBody = read_json(response).await;
            assert_eq!(parsed.status, "fail");
        }
        assert!(app.broker.pending_bodies(EXPORT_QUEUE).is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = app(None);
        let response = app
            .router
            .oneshot(export_request(
                None,
                "playlist-abc",
                r#"{"targetEmail":"a@b.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_broker_outage_is_server_error() {
        let app = app(None);
        app.broker.set_unavailable(true);

        let response = app
            .router
            .oneshot(export_request(
                Some("user-1"),
                "playlist-abc",
                r#"{"targetEmail":"a@b.com"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: StatusBody = read_json(response).await;
        assert_eq!(body.status, "error");
    }

    #[tokio::test]
    async fn test_admin_routes_absent_without_key() {
        let app = app(None);
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/exports/queue")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_queue_depth_and_requeue() {
        let app = app(Some(ADMIN_KEY));
        app.broker.declare_queue(EXPORT_QUEUE).await.unwrap();
        app.broker.publish(EXPORT_QUEUE, "{}").await.unwrap();
        let delivery = app
            .broker
            .receive(EXPORT_QUEUE, 60_000)
            .await
            .unwrap()
            .unwrap();
        app.broker.dead_letter(&delivery, "permanent failure").await.unwrap();

        let unauthorized = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/exports/queue")
                    .header("x-admin-key", "wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);

        let depth = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/exports/queue")
                    .header("x-admin-key", ADMIN_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(depth.status(), StatusCode::OK);
        let depth: serde_json::Value = read_json(depth).await;
        assert_eq!(depth["data"]["deadLettered"], 1);

        let listed = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/exports/dead-letters?limit=5")
                    .header("x-admin-key", ADMIN_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let listed: serde_json::Value = read_json(listed).await;
        assert_eq!(listed["data"]["deadLetters"][0]["id"], delivery.id.as_str());

        let requeued = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/exports/dead-letters/{}/requeue", delivery.id))
                    .header("x-admin-key", ADMIN_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(requeued.status(), StatusCode::OK);
        assert_eq!(app.broker.pending_bodies(EXPORT_QUEUE).len(), 1);

        let missing = app
            .router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/exports/dead-letters/nope/requeue")
                    .header("x-admin-key", ADMIN_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None)
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
