//! フェイルオーバー判断
//!
//! 自動フェイルオーバーが有効でプライマリがunhealthyの場合、プライマリを
//! アクティブルーティングセットから除外する。フェイルバックは暗黙かつ即時で、
//! プライマリのヘルスが戻れば次回の計算で再び対象になる。

use failover_common::types::{Endpoint, HealthState};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::registry::RegistrySnapshot;

/// ルーティングセットの優先段（小さいほど優先）
fn tier(endpoint: &Endpoint, retained_primary: bool) -> Option<u8> {
    match endpoint.health {
        HealthState::Healthy => Some(0),
        HealthState::Degraded => Some(1),
        // 自動フェイルオーバー無効時のプライマリは除外しないが、degradedより後ろに置く
        HealthState::Unhealthy if retained_primary => Some(2),
        HealthState::Unhealthy => None,
    }
}

/// アクティブルーティングセットを計算する
///
/// healthy → degraded の順に、各段の中では役割の序数、負荷率の昇順、設定順で並べる。
/// unhealthyは除外する。ただし自動フェイルオーバーが無効な場合、指定プライマリは
/// unhealthyでも除外されず、セットの末尾に置かれる。
pub fn active_routing_set(endpoints: &[Endpoint], auto_failover_enabled: bool) -> Vec<String> {
    let primary_index = endpoints.iter().position(|e| e.is_primary());

    let mut candidates: Vec<(usize, u8, &Endpoint)> = endpoints
        .iter()
        .enumerate()
        .filter_map(|(index, endpoint)| {
            let retained = !auto_failover_enabled && Some(index) == primary_index;
            tier(endpoint, retained).map(|t| (index, t, endpoint))
        })
        .collect();

    candidates.sort_by(|(ia, ta, a), (ib, tb, b)| {
        ta.cmp(tb)
            .then_with(|| a.role.ordinal().cmp(&b.role.ordinal()))
            .then_with(|| a.load.partial_cmp(&b.load).unwrap_or(Ordering::Equal))
            .then_with(|| ia.cmp(ib))
    });

    candidates
        .into_iter()
        .map(|(_, _, endpoint)| endpoint.id.clone())
        .collect()
}

/// フェイルオーバー判定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailoverDecision {
    /// 指定プライマリのID（未設定なら None）
    pub primary_id: Option<String>,
    /// プライマリのヘルス
    pub primary_health: Option<HealthState>,
    /// プライマリが除外されているか
    pub failed_over: bool,
    /// 除外時に最優先となるエンドポイント
    pub promoted: Option<String>,
}

impl FailoverDecision {
    /// スナップショットから判定する（副作用なし）
    pub fn from_snapshot(snapshot: &RegistrySnapshot) -> Self {
        let Some(primary) = snapshot.primary() else {
            return Self {
                primary_id: None,
                primary_health: None,
                failed_over: false,
                promoted: None,
            };
        };

        let failed_over =
            snapshot.auto_failover_enabled && primary.health == HealthState::Unhealthy;

        Self {
            primary_id: Some(primary.id.clone()),
            primary_health: Some(primary.health),
            failed_over,
            promoted: if failed_over {
                snapshot.active_routing_set.first().cloned()
            } else {
                None
            },
        }
    }
}

/// フェイルオーバーコントローラー
///
/// 判定自体は [`FailoverDecision::from_snapshot`] の純粋関数。ここでは
/// 直前の判定だけを保持し、フェイルオーバー/フェイルバックの遷移をログに残す。
#[derive(Clone, Default)]
pub struct FailoverController {
    failed_over: Arc<AtomicBool>,
}

impl FailoverController {
    /// 新しいコントローラーを作成
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_failed_over(&self) -> bool {
        self.failed_over.load(AtomicOrdering::SeqCst)
    }

    /// スナップショットを評価し、遷移があればログを出す
    pub fn evaluate(&self, snapshot: &RegistrySnapshot) -> FailoverDecision {
        let decision = FailoverDecision::from_snapshot(snapshot);
        let previous = self
            .failed_over
            .swap(decision.failed_over, AtomicOrdering::SeqCst);

        match (previous, decision.failed_over) {
            (false, true) => match decision.promoted.as_deref() {
                Some(promoted) => warn!(
                    primary_id = ?decision.primary_id,
                    promoted = %promoted,
                    "Primary endpoint is unhealthy, failing over"
                ),
                None => warn!(
                    primary_id = ?decision.primary_id,
                    "Primary endpoint is unhealthy and no backup is eligible"
                ),
            },
            (true, false) => info!(
                primary_id = ?decision.primary_id,
                primary_health = ?decision.primary_health,
                auto_failover = snapshot.auto_failover_enabled,
                "Primary endpoint restored to routing set"
            ),
            _ => {}
        }

        decision
    }
}
