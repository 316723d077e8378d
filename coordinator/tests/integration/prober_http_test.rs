//! Integration Test: HTTPヘルスプローブ
//!
//! wiremockのバックエンドに対して実際にHTTPでプローブし、判定結果を確認する。

use crate::support::{controller_config, endpoint_config};
use failover_common::types::{EndpointRole, HealthState};
use failover_coordinator::service::FailoverService;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn backend(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

async fn probe_once(url: &str) -> failover_common::types::Endpoint {
    let config = controller_config(vec![endpoint_config("svc", url, EndpointRole::Primary)]);
    let service = FailoverService::from_config(&config).unwrap();
    service.run_cycle().await;
    service.registry().get("svc").await.unwrap()
}

#[tokio::test]
async fn test_ok_response_is_healthy_and_reports_load() {
    let server = backend(
        ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "load": 40.0})),
    )
    .await;

    let endpoint = probe_once(&server.uri()).await;
    assert_eq!(endpoint.health, HealthState::Healthy);
    assert!(endpoint.response_time_ms.is_some());
    assert!(endpoint.last_checked_at.is_some());
    assert_eq!(endpoint.load, 40.0);
    assert_eq!(endpoint.last_error, None);
}

#[tokio::test]
async fn test_plain_text_body_is_accepted() {
    let server = backend(ResponseTemplate::new(200).set_body_string("OK")).await;
    let endpoint = probe_once(&server.uri()).await;
    assert_eq!(endpoint.health, HealthState::Healthy);
    assert_eq!(endpoint.load, 0.0);
}

#[tokio::test]
async fn test_self_reported_degraded_status() {
    let server =
        backend(ResponseTemplate::new(200).set_body_json(json!({"status": "degraded"}))).await;
    let endpoint = probe_once(&server.uri()).await;
    assert_eq!(endpoint.health, HealthState::Degraded);
}

#[tokio::test]
async fn test_service_unavailable_is_degraded() {
    let server = backend(ResponseTemplate::new(503)).await;
    let endpoint = probe_once(&server.uri()).await;
    assert_eq!(endpoint.health, HealthState::Degraded);
    assert_eq!(endpoint.last_error.as_deref(), Some("HTTP 503"));
}

#[tokio::test]
async fn test_server_error_is_unhealthy() {
    let server = backend(ResponseTemplate::new(500)).await;
    let endpoint = probe_once(&server.uri()).await;
    assert_eq!(endpoint.health, HealthState::Unhealthy);
    assert_eq!(endpoint.error_count, 1);
}

#[tokio::test]
async fn test_slow_response_is_degraded() {
    let server = backend(ResponseTemplate::new(200).set_delay(Duration::from_millis(700))).await;
    let endpoint = probe_once(&server.uri()).await;
    assert_eq!(endpoint.health, HealthState::Degraded);
    assert!(endpoint.response_time_ms.unwrap() >= 500);
}

#[tokio::test]
async fn test_timeout_is_unhealthy() {
    let server = backend(ResponseTemplate::new(200).set_delay(Duration::from_secs(3))).await;
    let endpoint = probe_once(&server.uri()).await;
    assert_eq!(endpoint.health, HealthState::Unhealthy);
    assert_eq!(endpoint.response_time_ms, None);
    assert!(endpoint.last_error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_connection_refused_is_unhealthy() {
    // 一度バインドして解放したポートには誰もlistenしていない
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let endpoint = probe_once(&uri).await;
    assert_eq!(endpoint.health, HealthState::Unhealthy);
    assert_eq!(endpoint.response_time_ms, None);
    assert!(endpoint.last_error.is_some());
}

#[tokio::test]
async fn test_custom_health_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ready"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = controller_config(vec![endpoint_config(
        "svc",
        &format!("{}/", server.uri()),
        EndpointRole::Primary,
    )]);
    config.probe.health_path = "/ready".to_string();

    let service = FailoverService::from_config(&config).unwrap();
    service.run_cycle().await;
    assert_eq!(
        service.registry().get("svc").await.unwrap().health,
        HealthState::Healthy
    );
}

#[tokio::test]
async fn test_one_stalled_backend_does_not_delay_others() {
    let stalled = backend(ResponseTemplate::new(200).set_delay(Duration::from_secs(5))).await;
    let fast = backend(ResponseTemplate::new(200)).await;

    let config = controller_config(vec![
        endpoint_config("stalled", &stalled.uri(), EndpointRole::Primary),
        endpoint_config("fast", &fast.uri(), EndpointRole::Secondary),
    ]);
    let service = FailoverService::from_config(&config).unwrap();

    let started = std::time::Instant::now();
    let report = service.run_cycle().await;
    // タイムアウト1秒で打ち切られる
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(report.healthy, 1);
    assert_eq!(report.unhealthy, 1);
    assert!(report.decision.failed_over);
    assert_eq!(report.decision.promoted.as_deref(), Some("fast"));
}
