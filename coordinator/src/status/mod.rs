//! ステータスレポーター
//!
//! レジストリの現在状態から、運用者向けの読み取り専用スナップショットを組み立てる。
//! 重みとフェイルオーバー判定はその場で再計算するため、状態が変わらない限り
//! 何度呼び出しても同じ結果になる。

use failover_common::protocol::{
    EndpointStatus, HealthSummary, RoutingResponse, StatusReport, TrafficWeights,
};

use crate::balancer::compute_weights;
use crate::failover::FailoverDecision;
use crate::registry::{EndpointRegistry, RegistrySnapshot};

/// スナップショットからステータスを組み立てる（副作用なし）
pub fn build_report(snapshot: &RegistrySnapshot) -> StatusReport {
    let weights = compute_weights(&snapshot.endpoints);
    let decision = FailoverDecision::from_snapshot(snapshot);

    let endpoints = snapshot
        .endpoints
        .iter()
        .map(|endpoint| EndpointStatus {
            weight: weights.get(&endpoint.id).unwrap_or(0.0),
            routable: snapshot.active_routing_set.contains(&endpoint.id),
            endpoint: endpoint.clone(),
        })
        .collect();

    StatusReport {
        auto_failover_enabled: snapshot.auto_failover_enabled,
        failed_over: decision.failed_over,
        active_routing_set: snapshot.active_routing_set.clone(),
        summary: HealthSummary::from_endpoints(&snapshot.endpoints),
        weights,
        endpoints,
    }
}

/// ステータスレポーター
#[derive(Clone)]
pub struct StatusReporter {
    registry: EndpointRegistry,
}

impl StatusReporter {
    /// 新しいレポーターを作成
    pub fn new(registry: EndpointRegistry) -> Self {
        Self { registry }
    }

    /// 現在のステータス
    pub async fn report(&self) -> StatusReport {
        build_report(&self.registry.snapshot().await)
    }

    /// 現在の推奨トラフィック比率
    pub async fn weights(&self) -> TrafficWeights {
        compute_weights(&self.registry.list().await)
    }

    /// ルーティング情報（重みとアクティブルーティングセット）
    pub async fn routing(&self) -> RoutingResponse {
        let snapshot = self.registry.snapshot().await;
        RoutingResponse {
            weights: compute_weights(&snapshot.endpoints),
            active_routing_set: snapshot.active_routing_set,
        }
    }
}
