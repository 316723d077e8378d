//! トラフィック配分エンジン
//!
//! 現在のヘルス状態と負荷率から、エンドポイントごとの推奨トラフィック比率を計算する。
//! 比率はレジストリの状態だけから決まる純粋関数で、サイクル間で保持しない。

use failover_common::protocol::{EndpointWeight, TrafficWeights};
use failover_common::types::{clamp_load, Endpoint, HealthState, MAX_LOAD_PERCENT};

/// スコアの下限（高負荷でも比率がゼロにならないための床）
pub const MIN_SCORE: f64 = 10.0;

/// 負荷率からスコアを計算する: `max(10, 100 - load)`
pub fn score(load: f64) -> f64 {
    (MAX_LOAD_PERCENT - clamp_load(load)).max(MIN_SCORE)
}

/// 推奨トラフィック比率を計算する
///
/// healthyなエンドポイントだけが対象。degraded/unhealthyは比率0（エントリなし）。
/// 対象が存在しない場合は空の結果を返し、呼び出し側はこれを
/// 「安全なエンドポイントなし」として扱わなければならない。
pub fn compute_weights(endpoints: &[Endpoint]) -> TrafficWeights {
    let scored: Vec<(&Endpoint, f64)> = endpoints
        .iter()
        .filter(|e| e.health == HealthState::Healthy)
        .map(|e| (e, score(e.load)))
        .collect();

    if scored.is_empty() {
        return TrafficWeights::default();
    }

    let total: f64 = scored.iter().map(|(_, s)| s).sum();
    let entries = scored
        .into_iter()
        .map(|(endpoint, score)| EndpointWeight {
            endpoint_id: endpoint.id.clone(),
            score,
            weight: score / total,
        })
        .collect();

    TrafficWeights::new(entries)
}
