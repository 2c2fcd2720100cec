//! HTTP server for the gallery listing API
//!
//! Provides /health and /images endpoints.

use crate::service::{ListingRequest, ListingService};
use crate::types::HealthResponse;
use crate::validation::ListImagesParams;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared state for the HTTP server
pub struct ServerState {
    pub service: ListingService,
    pub cors_origins: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(service: ListingService, cors_origins: Vec<String>) -> Self {
        Self {
            service,
            cors_origins,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/images", any(list_images))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET])
            .allow_headers([header::IF_NONE_MATCH])
            .expose_headers(exposed_headers())
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET])
            .allow_headers([header::IF_NONE_MATCH])
            .expose_headers(exposed_headers())
    }
}

fn exposed_headers() -> [header::HeaderName; 5] {
    [
        header::ETAG,
        header::HeaderName::from_static("x-cache"),
        header::HeaderName::from_static("x-listing-version"),
        header::HeaderName::from_static("x-pagination-has-more"),
        header::HeaderName::from_static("x-pagination-next-token"),
    ]
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: state.service.stats(),
    })
}

/// List one page of images under a namespace
async fn list_images(
    State(state): State<SharedState>,
    method: Method,
    headers: HeaderMap,
    query: Result<Query<ListImagesParams>, QueryRejection>,
) -> Response {
    let request = ListingRequest {
        method,
        params: query.map(|Query(params)| params).map_err(|e| e.body_text()),
        if_none_match: headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    match state.service.handle(request).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) => e.into_response_with_detail(state.service.settings().development),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListingSettings;
    use crate::testing::ScriptedLister;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use s3_listing_client::UpstreamError;
    use tower::ServiceExt;

    fn create_test_state(settings: ListingSettings) -> (SharedState, Arc<ScriptedLister>) {
        let lister = Arc::new(ScriptedLister::new());
        let service = ListingService::new(settings, lister.clone());
        (
            Arc::new(ServerState::new(service, vec!["*".to_string()])),
            lister,
        )
    }

    fn configured() -> ListingSettings {
        ListingSettings {
            bucket: Some("photos".to_string()),
            public_base_url: Some("https://cdn.example.com".to_string()),
            ..Default::default()
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_bytes(response: Response) -> axum::body::Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (state, _) = create_test_state(configured());
        let router = create_router(state);

        let response = router.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].as_u64().is_some());
        assert_eq!(json["cache"]["entries"], 0);
        assert_eq!(json["cache"]["max_entries"], 500);
    }

    #[tokio::test]
    async fn test_album_listing() {
        let (state, lister) = create_test_state(configured());
        lister.push_keys(&["album/a.jpg", "album/thumbnails/a.jpg", "album/sub/"]);
        let router = create_router(state);

        let response = router
            .oneshot(get("/images?prefix=album/&maxKeys=1000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-cache"], "MISS");
        assert_eq!(response.headers()["x-pagination-has-more"], "false");
        assert!(!response.headers().contains_key("x-pagination-next-token"));

        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "name": "a.jpg",
                "fullUrl": "https://cdn.example.com/album/a.jpg",
                "thumbUrl": "https://cdn.example.com/album/thumbnails/a.jpg",
            }])
        );
    }

    #[tokio::test]
    async fn test_conditional_request_returns_not_modified() {
        let (state, lister) = create_test_state(configured());
        lister.push_keys(&["album/a.jpg"]);
        let router = create_router(state);

        let first = router
            .clone()
            .oneshot(get("/images?prefix=album/"))
            .await
            .unwrap();
        let etag = first.headers()[header::ETAG].clone();

        let second = router
            .oneshot(
                Request::builder()
                    .uri("/images?prefix=album/")
                    .header(header::IF_NONE_MATCH, etag.clone())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(second.headers()[header::ETAG], etag);
        assert_eq!(second.headers()["x-cache"], "HIT");
        assert!(body_bytes(second).await.is_empty());
        assert_eq!(lister.calls(), 1);
    }

    #[tokio::test]
    async fn test_page_size_out_of_range() {
        let (state, lister) = create_test_state(configured());
        let router = create_router(state);

        for uri in ["/images?maxKeys=0", "/images?maxKeys=1001"] {
            let response = router.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json: serde_json::Value =
                serde_json::from_slice(&body_bytes(response).await).unwrap();
            assert!(json["error"].as_str().unwrap().contains("maxKeys"));
        }
        assert_eq!(lister.calls(), 0);
    }

    #[tokio::test]
    async fn test_post_not_allowed() {
        let (state, _) = create_test_state(configured());
        let router = create_router(state);

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/images")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET");
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_bucket_is_server_error() {
        let (state, _) = create_test_state(ListingSettings {
            bucket: None,
            ..configured()
        });
        let router = create_router(state);

        let response = router.oneshot(get("/images")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_upstream_not_found() {
        let (state, lister) = create_test_state(configured());
        lister.push(Err(UpstreamError::AccessDenied("AccessDenied".to_string())));
        let router = create_router(state);

        let response = router.oneshot(get("/images?prefix=secret")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_development_mode_exposes_detail() {
        let (state, lister) = create_test_state(ListingSettings {
            development: true,
            ..configured()
        });
        lister.push(Err(UpstreamError::Transient("connect timeout".to_string())));
        let router = create_router(state);

        let response = router.oneshot(get("/images")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["error"], "Failed to fetch images: connect timeout");
    }

    #[test]
    fn test_server_state_new() {
        let lister = Arc::new(ScriptedLister::new());
        let service = ListingService::new(configured(), lister);
        let state = ServerState::new(service, Vec::new());

        let diff = (Utc::now() - state.started_at).num_seconds();
        assert!((0..5).contains(&diff));
    }
}
