//! 共通型定義
//!
//! Endpoint, HealthState, EndpointRole等のコアデータ型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EndpointConfig;

/// 負荷率の上限（パーセント）
pub const MAX_LOAD_PERCENT: f64 = 100.0;

/// エンドポイントの役割
///
/// 序数が小さいほど優先度が高い。フェイルオーバー時は序数の小さい
/// healthyエンドポイントが優先される。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    /// プライマリ
    Primary,
    /// セカンダリ（バックアップ）
    #[default]
    Secondary,
}

impl EndpointRole {
    /// 優先度の序数（0が最優先）
    pub fn ordinal(&self) -> u8 {
        match self {
            EndpointRole::Primary => 0,
            EndpointRole::Secondary => 1,
        }
    }

    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointRole::Primary => "primary",
            EndpointRole::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// エンドポイントのヘルス状態
///
/// 「不明」状態は存在しない。一度もプローブされていないエンドポイントは
/// `Unhealthy` として扱う。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// 正常
    Healthy,
    /// 応答はあるが遅延または異常ステータス
    Degraded,
    /// 応答なし・タイムアウト・エラー
    #[default]
    Unhealthy,
}

impl HealthState {
    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// バックエンドエンドポイント
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    /// 一意識別子
    pub id: String,
    /// 表示名
    pub name: String,
    /// ベースURL（ヘルスチェックとルーティングに使用）
    pub url: String,
    /// 役割
    pub role: EndpointRole,
    /// ヘルス状態
    pub health: HealthState,
    /// 直近で応答を得たプローブのレイテンシ（ミリ秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u32>,
    /// 負荷率 (0.0-100.0)
    pub load: f64,
    /// 最終プローブ試行時刻
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
    /// 直近の非healthy判定の理由
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// 連続プローブ失敗回数
    #[serde(default)]
    pub error_count: u32,
    /// 連続healthy観測回数
    #[serde(default)]
    pub success_streak: u32,
}

impl Endpoint {
    /// 未プローブ状態（Unhealthy）のエンドポイントを作成
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            role: EndpointRole::Secondary,
            health: HealthState::Unhealthy,
            response_time_ms: None,
            load: 0.0,
            last_checked_at: None,
            last_error: None,
            error_count: 0,
            success_streak: 0,
        }
    }

    /// 役割を設定
    pub fn with_role(mut self, role: EndpointRole) -> Self {
        self.role = role;
        self
    }

    /// 負荷率を設定（0-100にクランプ）
    pub fn with_load(mut self, load: f64) -> Self {
        self.load = clamp_load(load);
        self
    }

    /// ヘルス状態を設定
    pub fn with_health(mut self, health: HealthState) -> Self {
        self.health = health;
        self
    }

    /// 一度でもプローブされたか
    pub fn has_been_probed(&self) -> bool {
        self.last_checked_at.is_some()
    }

    /// プライマリか
    pub fn is_primary(&self) -> bool {
        self.role == EndpointRole::Primary
    }
}

impl From<&EndpointConfig> for Endpoint {
    fn from(config: &EndpointConfig) -> Self {
        Endpoint::new(
            config.id.clone(),
            config.display_name().to_string(),
            config.url.clone(),
        )
        .with_role(config.role)
        .with_load(config.load)
    }
}

/// 負荷率を0-100の範囲に収める（NaNは0とみなす）
pub fn clamp_load(load: f64) -> f64 {
    if load.is_nan() {
        0.0
    } else {
        load.clamp(0.0, MAX_LOAD_PERCENT)
    }
}
