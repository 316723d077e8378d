//! エンドポイントレジストリ
//!
//! エンドポイントの状態と自動フェイルオーバーフラグをメモリ内で管理する。
//! グローバル状態ではなく、生成したハンドルをクローンして各コンポーネントへ渡す。

use chrono::{DateTime, Utc};
use failover_common::config::ControllerConfig;
use failover_common::types::{clamp_load, Endpoint, HealthState};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

use crate::failover::active_routing_set;

/// プローブ結果としてレジストリへ書き戻すフィールド
#[derive(Debug, Clone, PartialEq)]
pub struct HealthUpdate {
    /// ヘルス状態
    pub health: HealthState,
    /// 応答レイテンシ（応答がなければ None）
    pub response_time_ms: Option<u32>,
    /// プローブ試行時刻
    pub last_checked_at: DateTime<Utc>,
    /// 応答ボディで申告された負荷率
    pub load: Option<f64>,
    /// 非healthy判定の理由
    pub last_error: Option<String>,
    /// 連続失敗回数
    pub error_count: u32,
    /// 連続healthy観測回数
    pub success_streak: u32,
}

/// レジストリの不変スナップショット
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrySnapshot {
    /// エンドポイント一覧（設定順）
    pub endpoints: Vec<Endpoint>,
    /// 自動フェイルオーバー有効フラグ
    pub auto_failover_enabled: bool,
    /// ルーティング対象のエンドポイントID（優先順）
    pub active_routing_set: Vec<String>,
}

impl RegistrySnapshot {
    /// 指定IDのエンドポイント
    pub fn get(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }

    /// 指定されたプライマリ（設定順で最初のprimary）
    pub fn primary(&self) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.is_primary())
    }
}

/// エンドポイントレジストリ
///
/// 書き込みはプローバー（ヘルス関連フィールド）、外部テレメトリ（負荷率）、
/// 運用者のトグル（フラグ）の3系統のみ。
#[derive(Clone)]
pub struct EndpointRegistry {
    /// エンドポイント一覧（設定順）
    endpoints: Arc<RwLock<Vec<Endpoint>>>,
    /// 自動フェイルオーバー有効フラグ
    auto_failover: Arc<watch::Sender<bool>>,
}

impl EndpointRegistry {
    /// エンドポイント一覧からレジストリを作成
    pub fn new(endpoints: Vec<Endpoint>, auto_failover_enabled: bool) -> Self {
        let (tx, _rx) = watch::channel(auto_failover_enabled);
        Self {
            endpoints: Arc::new(RwLock::new(endpoints)),
            auto_failover: Arc::new(tx),
        }
    }

    /// 設定からレジストリを作成（全エンドポイントはUnhealthyで開始）
    pub fn from_config(config: &ControllerConfig) -> Self {
        let endpoints: Vec<Endpoint> = config.endpoints.iter().map(Endpoint::from).collect();
        info!(
            endpoint_count = endpoints.len(),
            auto_failover = config.auto_failover,
            "Endpoint registry initialized"
        );
        Self::new(endpoints, config.auto_failover)
    }

    /// すべてのエンドポイントを設定順で取得
    pub async fn list(&self) -> Vec<Endpoint> {
        self.endpoints.read().await.clone()
    }

    /// エンドポイントを取得
    pub async fn get(&self, id: &str) -> Option<Endpoint> {
        self.endpoints
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// プローブ結果を反映する
    ///
    /// 未知のIDは設定ミスとして警告ログを出し、何もせず `false` を返す。
    pub async fn update(&self, id: &str, update: HealthUpdate) -> bool {
        let mut endpoints = self.endpoints.write().await;
        let Some(endpoint) = endpoints.iter_mut().find(|e| e.id == id) else {
            warn!(endpoint_id = %id, "Ignoring health update for unknown endpoint");
            return false;
        };

        endpoint.health = update.health;
        endpoint.response_time_ms = update.response_time_ms;
        endpoint.last_checked_at = Some(update.last_checked_at);
        endpoint.last_error = update.last_error;
        endpoint.error_count = update.error_count;
        endpoint.success_streak = update.success_streak;
        if let Some(load) = update.load {
            endpoint.load = clamp_load(load);
        }
        true
    }

    /// 外部テレメトリから負荷率のみを更新する
    pub async fn update_load(&self, id: &str, load: f64) -> bool {
        let mut endpoints = self.endpoints.write().await;
        match endpoints.iter_mut().find(|e| e.id == id) {
            Some(endpoint) => {
                endpoint.load = clamp_load(load);
                true
            }
            None => {
                warn!(endpoint_id = %id, "Ignoring load update for unknown endpoint");
                false
            }
        }
    }

    /// 自動フェイルオーバーの有効/無効を切り替え、以前の値を返す
    ///
    /// 次回のフェイルオーバー判定から反映される。
    pub fn set_auto_failover(&self, enabled: bool) -> bool {
        let previous = self.auto_failover.send_replace(enabled);
        if previous != enabled {
            info!(enabled, "Auto-failover toggled");
        }
        previous
    }

    /// 自動フェイルオーバーが有効か
    pub fn auto_failover_enabled(&self) -> bool {
        *self.auto_failover.borrow()
    }

    /// フラグの変更を購読する
    pub fn subscribe_auto_failover(&self) -> watch::Receiver<bool> {
        self.auto_failover.subscribe()
    }

    /// 現在の状態のスナップショットを取得
    pub async fn snapshot(&self) -> RegistrySnapshot {
        let endpoints = self.endpoints.read().await.clone();
        let auto_failover_enabled = self.auto_failover_enabled();
        let active_routing_set = active_routing_set(&endpoints, auto_failover_enabled);
        RegistrySnapshot {
            endpoints,
            auto_failover_enabled,
            active_routing_set,
        }
    }
}
