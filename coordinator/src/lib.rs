//! Failover Coordinator
//!
//! 少数のバックエンドエンドポイントのヘルスを監視し、トラフィック配分の推奨値と
//! プライマリの自動フェイルオーバー判断を提供するコントローラー

#![warn(missing_docs)]

/// REST APIハンドラー（ステータス取得・フェイルオーバー切替）
pub mod api;

/// トラフィック配分エンジン（負荷ベースの重み計算）
pub mod balancer;

/// CLIインターフェース
pub mod cli;

/// フェイルオーバー判断
pub mod failover;

/// ヘルスプローブ
pub mod health;

/// ロギング初期化ユーティリティ
pub mod logging;

/// エンドポイントレジストリ
pub mod registry;

/// コンポーネント結線（レジストリ・プローバー・フェイルオーバー・レポーター）
pub mod service;

/// Shutdown controller
pub mod shutdown;

/// ステータスレポーター
pub mod status;

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// フェイルオーバーサービス
    pub service: service::FailoverService,
}
