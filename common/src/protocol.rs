//! 通信プロトコル定義
//!
//! ステータスAPIの要求/応答と、バックエンドの `/health` 応答ボディ

use serde::{Deserialize, Serialize};

use crate::types::{Endpoint, HealthState};

/// バックエンドの `/health` 応答ボディ
///
/// どちらのフィールドも任意。JSONでない応答はボディなしとして扱う。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HealthReport {
    /// 自己申告ステータス（"ok" / "healthy" / "degraded" 等）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// 自己申告の負荷率 (0.0-100.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
}

impl HealthReport {
    /// 自己申告ステータスが正常を示すか（未申告は正常扱い）
    pub fn reports_ok(&self) -> bool {
        match self.status.as_deref() {
            None => true,
            Some(status) => matches!(
                status.to_ascii_lowercase().as_str(),
                "ok" | "healthy" | "up" | "pass" | "ready"
            ),
        }
    }
}

/// エンドポイント単位の推奨トラフィック比率
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointWeight {
    /// エンドポイントID
    pub endpoint_id: String,
    /// 正規化前スコア
    pub score: f64,
    /// 正規化済み比率 (0.0-1.0)
    pub weight: f64,
}

/// 推奨トラフィック比率一覧
///
/// 空の場合は「安全なエンドポイントが存在しない」ことを意味する。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct TrafficWeights {
    entries: Vec<EndpointWeight>,
}

impl TrafficWeights {
    /// エントリ列から作成
    pub fn new(entries: Vec<EndpointWeight>) -> Self {
        Self { entries }
    }

    /// 空か
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// エントリ数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// エントリ一覧
    pub fn entries(&self) -> &[EndpointWeight] {
        &self.entries
    }

    /// 指定エンドポイントの比率（対象外は None）
    pub fn get(&self, endpoint_id: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.endpoint_id == endpoint_id)
            .map(|e| e.weight)
    }

    /// 比率の合計
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// `[0, 1)` の一様乱数値からエンドポイントを選ぶ
    ///
    /// 乱数の生成は呼び出し側の責務。範囲外の値は端に丸める。
    pub fn pick(&self, roll: f64) -> Option<&str> {
        let last = self.entries.last()?;
        let roll = if roll.is_nan() { 0.0 } else { roll.max(0.0) };

        let mut cumulative = 0.0;
        for entry in &self.entries {
            cumulative += entry.weight;
            if roll < cumulative {
                return Some(&entry.endpoint_id);
            }
        }
        Some(&last.endpoint_id)
    }
}

/// 全体のヘルス
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    /// 全エンドポイントがhealthy
    Healthy,
    /// 一部のみhealthy、またはdegradedのみ
    Degraded,
    /// healthyなエンドポイントなし
    Unavailable,
}

/// ヘルス集計
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthSummary {
    /// エンドポイント総数
    pub total: usize,
    /// healthy数
    pub healthy: usize,
    /// degraded数
    pub degraded: usize,
    /// unhealthy数
    pub unhealthy: usize,
    /// 全体のヘルス
    pub overall: OverallHealth,
}

impl HealthSummary {
    /// エンドポイント一覧から集計する
    pub fn from_endpoints(endpoints: &[Endpoint]) -> Self {
        let count = |state: HealthState| endpoints.iter().filter(|e| e.health == state).count();
        let healthy = count(HealthState::Healthy);
        let degraded = count(HealthState::Degraded);
        let unhealthy = count(HealthState::Unhealthy);
        let total = endpoints.len();

        let overall = if total > 0 && healthy == total {
            OverallHealth::Healthy
        } else if healthy > 0 {
            OverallHealth::Degraded
        } else {
            OverallHealth::Unavailable
        };

        Self {
            total,
            healthy,
            degraded,
            unhealthy,
            overall,
        }
    }
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} healthy", self.healthy, self.total)
    }
}

/// ステータス表示用のエンドポイント情報
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointStatus {
    /// エンドポイント状態
    #[serde(flatten)]
    pub endpoint: Endpoint,
    /// 推奨トラフィック比率（対象外は0）
    pub weight: f64,
    /// アクティブルーティングセットに含まれるか
    pub routable: bool,
}

/// ステータススナップショット
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    /// 自動フェイルオーバー有効フラグ
    pub auto_failover_enabled: bool,
    /// プライマリが除外されているか
    pub failed_over: bool,
    /// ルーティング対象のエンドポイントID（優先順）
    pub active_routing_set: Vec<String>,
    /// 推奨トラフィック比率
    pub weights: TrafficWeights,
    /// エンドポイント一覧（設定順）
    pub endpoints: Vec<EndpointStatus>,
    /// ヘルス集計
    pub summary: HealthSummary,
}

/// GET /api/routing のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingResponse {
    /// 推奨トラフィック比率
    pub weights: TrafficWeights,
    /// ルーティング対象のエンドポイントID（優先順）
    pub active_routing_set: Vec<String>,
}

/// PUT /api/failover のリクエスト / GET /api/failover のレスポンス
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailoverToggle {
    /// 自動フェイルオーバー有効フラグ
    pub enabled: bool,
}

/// PUT /api/endpoints/:id/load のリクエスト
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LoadUpdateRequest {
    /// 負荷率 (0.0-100.0)
    pub load: f64,
}
