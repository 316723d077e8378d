//! Failover Coordinator 共通ライブラリ
//!
//! coordinator本体とCLIで共有する型・設定・エラー定義

#![warn(missing_docs)]

/// 共通型定義（Endpoint, HealthState等）
pub mod types;

/// ステータスAPIの要求/応答型
pub mod protocol;

/// 設定管理
pub mod config;

/// エラー型定義
pub mod error;
