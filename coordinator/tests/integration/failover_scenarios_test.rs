//! Integration Test: フェイルオーバーシナリオ
//!
//! wiremockのバックエンドを落とし・戻しながら、フェイルオーバーと
//! フェイルバック、負荷ベースの重み配分を確認する。

use crate::support::{controller_config, down, endpoint_config, up, SwitchableProbe};
use failover_common::types::{EndpointRole, HealthState};
use failover_coordinator::service::FailoverService;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_health(server: &MockServer, template: ResponseTemplate) {
    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn healthy_backend(load: f64) -> MockServer {
    let server = MockServer::start().await;
    mount_health(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "load": load})),
    )
    .await;
    server
}

/// プライマリ停止 → バックアップへ切替 → 復旧で即時フェイルバック
#[tokio::test]
async fn test_primary_outage_and_recovery() {
    let primary = healthy_backend(20.0).await;
    let backup = healthy_backend(20.0).await;
    let config = controller_config(vec![
        endpoint_config("primary", &primary.uri(), EndpointRole::Primary),
        endpoint_config("backup", &backup.uri(), EndpointRole::Secondary),
    ]);
    let service = FailoverService::from_config(&config).unwrap();

    let report = service.run_cycle().await;
    assert!(!report.decision.failed_over);
    assert_eq!(
        service.routing().await.active_routing_set,
        vec!["primary", "backup"]
    );

    // プライマリ停止
    mount_health(&primary, ResponseTemplate::new(500)).await;
    let report = service.run_cycle().await;
    assert!(report.decision.failed_over);
    assert_eq!(report.decision.promoted.as_deref(), Some("backup"));

    let status = service.report().await;
    assert!(status.failed_over);
    assert_eq!(status.active_routing_set, vec!["backup"]);
    assert_eq!(status.weights.get("backup"), Some(1.0));
    assert_eq!(status.weights.get("primary"), None);

    // 復旧
    mount_health(
        &primary,
        ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})),
    )
    .await;
    let report = service.run_cycle().await;
    assert!(!report.decision.failed_over);
    assert_eq!(
        service.report().await.active_routing_set,
        vec!["primary", "backup"]
    );
}

/// 3台すべてhealthyのとき負荷に反比例して配分される
#[tokio::test]
async fn test_load_based_distribution() {
    let a = healthy_backend(65.0).await;
    let b = healthy_backend(35.0).await;
    let c = healthy_backend(85.0).await;
    let config = controller_config(vec![
        endpoint_config("a", &a.uri(), EndpointRole::Primary),
        endpoint_config("b", &b.uri(), EndpointRole::Secondary),
        endpoint_config("c", &c.uri(), EndpointRole::Secondary),
    ]);
    let service = FailoverService::from_config(&config).unwrap();
    service.run_cycle().await;

    let weights = service.weights().await;
    assert!((weights.get("a").unwrap() - 35.0 / 115.0).abs() < 1e-9);
    assert!((weights.get("b").unwrap() - 65.0 / 115.0).abs() < 1e-9);
    assert!((weights.get("c").unwrap() - 15.0 / 115.0).abs() < 1e-9);

    // 同じ状態なら何度計算しても同じ
    assert_eq!(service.report().await, service.report().await);

    // バックアップのプライオリティ順はロールのあと負荷の昇順
    assert_eq!(
        service.routing().await.active_routing_set,
        vec!["a", "b", "c"]
    );
}

/// degradedは重み0だがルーティングセットには残る
#[tokio::test]
async fn test_degraded_backend_keeps_routing_slot() {
    let primary = healthy_backend(10.0).await;
    let busy = MockServer::start().await;
    mount_health(&busy, ResponseTemplate::new(429)).await;

    let config = controller_config(vec![
        endpoint_config("primary", &primary.uri(), EndpointRole::Primary),
        endpoint_config("busy", &busy.uri(), EndpointRole::Secondary),
    ]);
    let service = FailoverService::from_config(&config).unwrap();
    service.run_cycle().await;

    let status = service.report().await;
    let busy_status = status
        .endpoints
        .iter()
        .find(|e| e.endpoint.id == "busy")
        .unwrap();
    assert_eq!(busy_status.endpoint.health, HealthState::Degraded);
    assert!(busy_status.routable);
    assert_eq!(busy_status.weight, 0.0);
    assert_eq!(status.active_routing_set, vec!["primary", "busy"]);
}

/// 自動フェイルオーバーの無効化と再有効化
#[tokio::test]
async fn test_toggle_controls_primary_exclusion() {
    let config = controller_config(vec![
        endpoint_config("primary", "http://primary:8080", EndpointRole::Primary),
        endpoint_config("backup", "http://backup:8080", EndpointRole::Secondary),
    ]);
    let probe = Arc::new(SwitchableProbe::default());
    probe.set("primary", down());
    probe.set("backup", up());
    let service = FailoverService::with_probe(&config, probe.clone());

    assert!(service.run_cycle().await.decision.failed_over);

    // 無効化すると次の判定からプライマリは除外されず、healthyのバックアップの後ろに並ぶ
    let decision = service.set_auto_failover(false).await;
    assert!(!decision.failed_over);
    let routing = service.routing().await;
    assert_eq!(routing.active_routing_set, vec!["backup", "primary"]);
    // 重みはヘルスのみで決まる
    assert_eq!(routing.weights.get("primary"), None);

    // 無効化中も手動サイクルではヘルスが更新される
    service.run_cycle().await;
    assert_eq!(
        service.registry().get("primary").await.unwrap().error_count,
        2
    );

    // 再有効化で再び除外
    assert!(service.set_auto_failover(true).await.failed_over);
    assert_eq!(service.routing().await.active_routing_set, vec!["backup"]);

    // 変化のないトグルは副作用なし
    let before = service.report().await;
    service.set_auto_failover(true).await;
    assert_eq!(service.report().await, before);
}

/// 全エンドポイント停止時は空の重みを返す
#[tokio::test]
async fn test_total_outage_yields_no_weights() {
    let config = controller_config(vec![
        endpoint_config("primary", "http://primary:8080", EndpointRole::Primary),
        endpoint_config("backup", "http://backup:8080", EndpointRole::Secondary),
    ]);
    let service = FailoverService::with_probe(&config, Arc::new(SwitchableProbe::default()));

    let report = service.run_cycle().await;
    assert_eq!(report.unhealthy, 2);
    assert!(report.decision.failed_over);
    assert_eq!(report.decision.promoted, None);
    assert!(service.weights().await.is_empty());
}
