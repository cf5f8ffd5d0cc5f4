use api_client::HttpStatsClient;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use configuration::Config;
use registry::Registry;
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowOrigin, Any as CorsAny, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
}

/// Builds the API router over an already-assembled registry.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(CorsAny)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/stats/sync", post(handlers::sync_stats))
        .route("/api/leaderboard", get(handlers::leaderboard))
        .route("/api/participant", get(handlers::participant))
        .with_state(state)
        .layer(cors)
        // Any panic inside a handler becomes a 500 in the usual error envelope.
        .layer(CatchPanicLayer::custom(panic_response))
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked.");
    error::error_envelope(
        StatusCode::INTERNAL_SERVER_ERROR,
        "An internal server error occurred".to_string(),
    )
}

/// Opens storage, connects the stats feed client, and serves the API until shutdown.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let repo = database::open_repository(&config.storage);
    let history = Arc::new(database::open_snapshot_log(&config.storage));
    let source = Arc::new(HttpStatsClient::new(&config.stats_source)?);
    let registry = Registry::new(repo, history, source, &config);

    let app = app(Arc::new(AppState { registry }));
    let addr = config.server.addr();

    tracing::info!("Web server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use api_client::{StatsResponse, StatsSource};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use core_types::{Metric, Participant, ParticipantStatus, Snapshot};
    use database::{MemorySnapshotLog, ParticipantRepository};
    use serde_json::Value;
    use tower::ServiceExt;

    struct FixedFeed;

    #[async_trait]
    impl StatsSource for FixedFeed {
        async fn fetch_stats(&self, username: &str) -> Result<StatsResponse, ApiError> {
            if username == "broken" {
                return Err(ApiError::ApiError(503, "maintenance".to_string()));
            }
            Ok(StatsResponse {
                roi_pct: Some(Metric::Number(7.5)),
                ..Default::default()
            })
        }
    }

    fn seeded_app() -> Router {
        let repo = ParticipantRepository::in_memory();
        let history = Arc::new(MemorySnapshotLog::new());

        let mut bound = Participant::new("bound", "Bound", "bound@example.com");
        bound.bind_username("bound_fx");
        bound.status = ParticipantStatus::Active;
        bound.stats.roi_pct = Some(Metric::from("3"));
        repo.upsert(bound).unwrap();

        let mut broken = Participant::new("broken", "Broken", "broken@example.com");
        broken.bind_username("broken");
        repo.upsert(broken).unwrap();

        repo.upsert(Participant::new("unbound", "Unbound", "unbound@example.com")).unwrap();

        let registry = Registry::new(repo, history, Arc::new(FixedFeed), &Config::default());
        for _ in 0..3 {
            registry.record_snapshot("bound", Snapshot::at(chrono::Utc::now())).unwrap();
        }
        app(Arc::new(AppState { registry }))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn sync(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/stats/sync")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn resolve_maps_errors_to_status_codes() {
        let (status, body) = call(seeded_app(), get("/api/resolve")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);

        let (status, _) = call(seeded_app(), get("/api/resolve?token=nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(seeded_app(), get("/api/resolve?token=bound")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["user"]["displayName"], "Bound");
    }

    #[tokio::test]
    async fn sync_maps_errors_to_status_codes() {
        let cases = [
            ("{}", StatusCode::BAD_REQUEST),
            ("not json", StatusCode::BAD_REQUEST),
            (r#"{"token":"ghost"}"#, StatusCode::NOT_FOUND),
            (r#"{"token":"unbound"}"#, StatusCode::CONFLICT),
            (r#"{"token":"broken"}"#, StatusCode::BAD_GATEWAY),
        ];
        for (body, expected) in cases {
            let (status, json) = call(seeded_app(), sync(body)).await;
            assert_eq!(status, expected, "body {body}");
            assert_eq!(json["ok"], false);
        }

        let (status, json) = call(seeded_app(), sync(r#"{"token":"bound"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stats"]["roiPct"], 7.5);
        assert!(json["stats"]["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn leaderboard_lists_active_participants() {
        let (status, body) = call(seeded_app(), get("/api/leaderboard")).await;
        assert_eq!(status, StatusCode::OK);
        let participants = body["participants"].as_array().unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0]["token"], "bound");
        assert_eq!(participants[0]["roiPct"], 3.0);
    }

    #[tokio::test]
    async fn participant_includes_snapshots() {
        let (status, body) = call(seeded_app(), get("/api/participant?token=bound")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["participant"]["token"], "bound");
        assert_eq!(body["snapshots"].as_array().unwrap().len(), 3);

        let (status, _) = call(seeded_app(), get("/api/participant?token=ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(seeded_app(), get("/api/participant?token=")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// Storage whose disk has gone away mid-request.
    struct VanishedDisk;

    impl database::Storage for VanishedDisk {
        fn put(&self, _participant: Participant) -> Result<(), database::StoreError> {
            panic!("disk vanished");
        }

        fn list(&self) -> Vec<Participant> {
            panic!("disk vanished");
        }

        fn is_present(&self) -> bool {
            true
        }

        fn export(&self) -> Vec<Value> {
            Vec::new()
        }

        fn seed(&self, _records: Vec<Value>) -> Result<(), database::StoreError> {
            Ok(())
        }

        fn describe(&self) -> String {
            "vanished".to_string()
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn storage_failures_inside_the_blocking_pool_become_server_errors() {
        let repo = ParticipantRepository::new(Arc::new(VanishedDisk));
        let registry = Registry::new(
            repo,
            Arc::new(MemorySnapshotLog::new()),
            Arc::new(FixedFeed),
            &Config::default(),
        );
        let app = app(Arc::new(AppState { registry }));

        for request in [
            get("/api/leaderboard"),
            get("/api/resolve?token=bound"),
            get("/api/participant?token=bound"),
            sync(r#"{"token":"bound"}"#),
        ] {
            let (status, body) = call(app.clone(), request).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["ok"], false);
            assert_eq!(body["error"], "An internal server error occurred");
        }

        // The runtime is still serving after the failures above.
        let (status, body) = call(app, get("/api/resolve")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing token");
    }
}
