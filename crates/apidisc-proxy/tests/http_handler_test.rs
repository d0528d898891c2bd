//! Integration tests for HttpDiscoveryHandler
//!
//! These tests spin up real HTTP servers and drive the handler against them:
//! an aggregated server (the apidisc-api router), a server that only knows
//! the legacy endpoints, and a few misbehaving ones.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use pretty_assertions::assert_eq;

use apidisc_api::{create_router, AppState, ResourceManager};
use apidisc_core::{
    ApiGroupDiscovery, ApiResource, ApiResourceList, ApiVersionDiscovery, DiscoveryHandler,
    DiscoveryRequest, DiscoveryResponse, Freshness, HandlerError,
};
use apidisc_proxy::testing::DiscoveryServer;
use apidisc_proxy::HttpDiscoveryHandler;

// =============================================================================
// Servers
// =============================================================================

fn aggregated_router(resources: &Arc<ResourceManager>) -> Router {
    create_router(AppState::new(resources.clone()))
}

fn foos(group: &str, version: &str) -> ApiResourceList {
    ApiResourceList::new(
        group,
        version,
        vec![ApiResource {
            name: "foos".to_string(),
            singular_name: "foo".to_string(),
            namespaced: true,
            kind: "Foo".to_string(),
            verbs: vec!["get".to_string(), "list".to_string()],
            ..Default::default()
        }],
    )
}

/// Serves only legacy discovery; `/apis` is a plain group list
fn legacy_router() -> Router {
    Router::new()
        .route(
            "/apis",
            get(|| async {
                Json(serde_json::json!({
                    "kind": "APIGroupList",
                    "groups": [{ "name": "stable.example.com" }]
                }))
            }),
        )
        .route(
            "/apis/stable.example.com/v1",
            get(|| async { Json(foos("stable.example.com", "v1")) }),
        )
        .route("/api/v1", get(|| async { Json(foos("", "v1")) }))
}

fn empty_version(name: &str) -> ApiVersionDiscovery {
    ApiVersionDiscovery {
        version: name.to_string(),
        resources: Vec::new(),
        freshness: Freshness::Current,
    }
}

fn aggregated() -> DiscoveryRequest {
    DiscoveryRequest::Aggregated { etag: None }
}

fn legacy(group: &str, version: &str) -> DiscoveryRequest {
    DiscoveryRequest::Legacy {
        group: group.to_string(),
        version: version.to_string(),
    }
}

// =============================================================================
// Aggregated path
// =============================================================================

#[tokio::test]
async fn aggregated_fetch_then_not_modified() {
    let resources = Arc::new(ResourceManager::with_groups(vec![ApiGroupDiscovery::new(
        "stable.example.com",
        vec![empty_version("v1")],
    )]));
    let server = DiscoveryServer::start(aggregated_router(&resources)).await.unwrap();

    let first = server.handler().serve(aggregated()).await.unwrap();
    let DiscoveryResponse::Aggregated { document, etag } = first else {
        panic!("expected aggregated response, got {first:?}");
    };
    assert_eq!(document.items.len(), 1);
    assert_eq!(document.items[0].name(), "stable.example.com");
    assert_eq!(etag.as_deref(), Some(resources.etag().as_str()));

    let second = server
        .handler()
        .serve(DiscoveryRequest::Aggregated { etag: etag.clone() })
        .await
        .unwrap();
    assert_eq!(second, DiscoveryResponse::NotModified);
    assert_eq!(server.not_modified(), 1);

    // content changes, the old token no longer matches
    resources.add_group_version("stable.example.com", empty_version("v2"));
    let third = server
        .handler()
        .serve(DiscoveryRequest::Aggregated { etag })
        .await
        .unwrap();
    assert!(matches!(third, DiscoveryResponse::Aggregated { .. }));

    server.stop().await;
}

#[tokio::test]
async fn aggregated_server_has_no_legacy_endpoints() {
    let resources = Arc::new(ResourceManager::new());
    let server = DiscoveryServer::start(aggregated_router(&resources)).await.unwrap();

    let response = server
        .handler()
        .serve(legacy("stable.example.com", "v1"))
        .await
        .unwrap();
    assert_eq!(response, DiscoveryResponse::Unsupported);
}

// =============================================================================
// Legacy path
// =============================================================================

#[tokio::test]
async fn plain_json_server_is_unsupported_then_legacy() {
    let server = DiscoveryServer::start(legacy_router()).await.unwrap();

    let response = server.handler().serve(aggregated()).await.unwrap();
    assert_eq!(response, DiscoveryResponse::Unsupported);

    let response = server
        .handler()
        .serve(legacy("stable.example.com", "v1"))
        .await
        .unwrap();
    assert_eq!(
        response,
        DiscoveryResponse::Legacy(foos("stable.example.com", "v1"))
    );

    // core group lives under /api
    let response = server.handler().serve(legacy("", "v1")).await.unwrap();
    assert_eq!(response, DiscoveryResponse::Legacy(foos("", "v1")));

    let response = server
        .handler()
        .serve(legacy("stable.example.com", "v2"))
        .await
        .unwrap();
    assert_eq!(response, DiscoveryResponse::Unsupported);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn server_error_is_status_error() {
    let router = Router::new().route(
        "/apis",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded") }),
    );
    let server = DiscoveryServer::start(router).await.unwrap();

    let err = server.handler().serve(aggregated()).await.unwrap_err();
    match err {
        HandlerError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "backend exploded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_document_is_decode_error() {
    let router = Router::new().route(
        "/apis",
        get(|| async {
            (
                [(
                    header::CONTENT_TYPE,
                    apidisc_core::AGGREGATED_CONTENT_TYPE,
                )],
                "{not json",
            )
                .into_response()
        }),
    );
    let server = DiscoveryServer::start(router).await.unwrap();

    let err = server.handler().serve(aggregated()).await.unwrap_err();
    assert!(matches!(err, HandlerError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_server_times_out() {
    let router = Router::new().route(
        "/apis",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "too late"
        }),
    );
    let server = DiscoveryServer::start_with_timeouts(
        router,
        Duration::from_millis(100),
        Duration::from_millis(100),
    )
    .await
    .unwrap();

    let err = server.handler().serve(aggregated()).await.unwrap_err();
    assert!(matches!(err, HandlerError::Timeout), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    // grab a free port, then close it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handler = HttpDiscoveryHandler::with_config(
        &format!("http://{}", addr),
        Duration::from_secs(2),
        Duration::from_secs(1),
    )
    .unwrap();

    let err = handler.serve(aggregated()).await.unwrap_err();
    assert!(
        matches!(err, HandlerError::Transport(_) | HandlerError::Timeout),
        "got {err:?}"
    );
}
