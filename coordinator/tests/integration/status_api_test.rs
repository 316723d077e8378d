//! Contract Test: ステータスAPI
//!
//! GET /api/status, GET /api/routing, GET/PUT /api/failover, PUT /api/endpoints/:id/load

use crate::support::{controller_config, endpoint_config, up, SwitchableProbe};
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use failover_common::types::EndpointRole;
use failover_coordinator::{api, service::FailoverService, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    service: FailoverService,
    probe: Arc<SwitchableProbe>,
}

fn build_app() -> TestApp {
    let config = controller_config(vec![
        endpoint_config("primary", "http://primary:8080", EndpointRole::Primary),
        endpoint_config("backup", "http://backup:8080", EndpointRole::Secondary),
    ]);
    let probe = Arc::new(SwitchableProbe::default());
    let service = FailoverService::with_probe(&config, probe.clone());
    let app = api::create_router(AppState {
        service: service.clone(),
    });
    TestApp {
        app,
        service,
        probe,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// GET /api/status - 起動直後は全エンドポイントがunhealthy
#[tokio::test]
async fn test_status_before_first_probe() {
    let test = build_app();
    let (status, body) = send(&test.app, get("/api/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auto_failover_enabled"], json!(true));
    assert_eq!(body["summary"]["overall"], json!("unavailable"));
    assert_eq!(body["weights"], json!([]));
    assert_eq!(body["active_routing_set"], json!([]));

    let endpoints = body["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0]["id"], json!("primary"));
    assert_eq!(endpoints[0]["role"], json!("primary"));
    assert_eq!(endpoints[0]["health"], json!("unhealthy"));
    assert_eq!(endpoints[0]["routable"], json!(false));
}

/// GET /api/status - プローブ後の重みとルーティングセット
#[tokio::test]
async fn test_status_after_probe_cycle() {
    let test = build_app();
    test.probe.set("primary", up());
    test.probe.set("backup", up());
    test.service.run_cycle().await;

    let (status, body) = send(&test.app, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failed_over"], json!(false));
    assert_eq!(body["active_routing_set"], json!(["primary", "backup"]));
    assert_eq!(body["summary"]["healthy"], json!(2));

    let weights = body["weights"].as_array().unwrap();
    assert_eq!(weights.len(), 2);
    let total: f64 = weights.iter().map(|w| w["weight"].as_f64().unwrap()).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

/// GET /api/routing - 対象なしは 503
#[tokio::test]
async fn test_routing_unavailable_when_nothing_is_healthy() {
    let test = build_app();
    let (status, body) = send(&test.app, get("/api/routing")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], json!("No available endpoints"));
}

/// GET /api/routing - 正常系
#[tokio::test]
async fn test_routing_returns_weights() {
    let test = build_app();
    test.probe.set("backup", up());
    test.service.run_cycle().await;

    let (status, body) = send(&test.app, get("/api/routing")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_routing_set"], json!(["backup"]));
    assert_eq!(body["weights"][0]["endpoint_id"], json!("backup"));
    assert_eq!(body["weights"][0]["weight"], json!(1.0));
}

/// GET/PUT /api/failover
#[tokio::test]
async fn test_toggle_failover() {
    let test = build_app();

    let (status, body) = send(&test.app, get("/api/failover")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"enabled": true}));

    let (status, body) = send(
        &test.app,
        put_json("/api/failover", json!({"enabled": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"enabled": false}));
    assert!(!test.service.auto_failover_enabled());

    // 無効化中はunhealthyなプライマリもルーティングセットに残る
    let (_, body) = send(&test.app, get("/api/status")).await;
    assert_eq!(body["auto_failover_enabled"], json!(false));
    assert_eq!(body["active_routing_set"], json!(["primary"]));
}

/// PUT /api/endpoints/:id/load
#[tokio::test]
async fn test_update_load() {
    let test = build_app();

    let (status, _) = send(
        &test.app,
        put_json("/api/endpoints/backup/load", json!({"load": 55.5})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        test.service.registry().get("backup").await.unwrap().load,
        55.5
    );
}

/// PUT /api/endpoints/:id/load - 異常系
#[tokio::test]
async fn test_update_load_errors() {
    let test = build_app();

    let (status, body) = send(
        &test.app,
        put_json("/api/endpoints/missing/load", json!({"load": 10.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Endpoint not found"));

    let (status, body) = send(
        &test.app,
        put_json("/api/endpoints/backup/load", json!({"load": 150.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid request"));
}
