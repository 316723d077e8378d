//! 設定管理
//!
//! ControllerConfig, ProbeConfig, EndpointConfig等の設定構造体。
//! 設定ファイル（TOML/JSON/YAML）と `FAILOVER__*` 環境変数から読み込む。

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};
use crate::types::{EndpointRole, MAX_LOAD_PERCENT};

/// 環境変数オーバーライドのプレフィックス
pub const ENV_PREFIX: &str = "FAILOVER";

/// 環境変数のキー区切り（例: `FAILOVER__PROBE__INTERVAL_SECS`）
pub const ENV_SEPARATOR: &str = "__";

/// コントローラー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// ステータスAPIのホストアドレス (デフォルト: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// ステータスAPIのポート番号 (デフォルト: 32780)
    #[serde(default = "default_port")]
    pub port: u16,

    /// 起動時の自動フェイルオーバー有効フラグ (デフォルト: true)
    #[serde(default = "default_auto_failover")]
    pub auto_failover: bool,

    /// ヘルスプローブ設定
    #[serde(default)]
    pub probe: ProbeConfig,

    /// エンドポイント一覧（設定順がそのまま優先順になる）
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    32780
}

fn default_auto_failover() -> bool {
    true
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auto_failover: default_auto_failover(),
            probe: ProbeConfig::default(),
            endpoints: Vec::new(),
        }
    }
}

impl ControllerConfig {
    /// 設定ファイル（任意）と環境変数から設定を読み込み、検証する
    pub fn load(path: Option<&Path>) -> CommonResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: ControllerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// バインドアドレス
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 設定値を検証する
    pub fn validate(&self) -> CommonResult<()> {
        if self.endpoints.is_empty() {
            return Err(CommonError::Config("no endpoints configured".to_string()));
        }

        let mut seen = HashSet::new();
        let mut primaries = 0usize;
        for endpoint in &self.endpoints {
            endpoint.validate()?;
            if !seen.insert(endpoint.id.as_str()) {
                return Err(CommonError::Config(format!(
                    "duplicate endpoint id: {}",
                    endpoint.id
                )));
            }
            if endpoint.role == EndpointRole::Primary {
                primaries += 1;
            }
        }
        if primaries > 1 {
            return Err(CommonError::Config(format!(
                "at most one primary endpoint is allowed, found {}",
                primaries
            )));
        }

        self.probe.validate()
    }
}

/// ヘルスプローブ設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeConfig {
    /// プローブ間隔（秒）(デフォルト: 30)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// 1回のプローブのタイムアウト（秒）(デフォルト: 5)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// これを超えるとdegradedとみなすレイテンシ（ミリ秒）(デフォルト: 2000)
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,

    /// ヘルスチェックのパス (デフォルト: "/health")
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// healthyへ復帰するまでに必要な連続healthy観測回数 (デフォルト: 1 = 即時復帰)
    #[serde(default = "default_recovery_threshold")]
    pub recovery_threshold: u32,

    /// 自動フェイルオーバー無効時に定期プローブを止めるか (デフォルト: true)
    ///
    /// false にすると無効化中もタイマーは動き続け、ヘルスが更新され続ける。
    #[serde(default = "default_pause_when_failover_disabled")]
    pub pause_when_failover_disabled: bool,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_slow_threshold_ms() -> u64 {
    2000
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_recovery_threshold() -> u32 {
    1
}

fn default_pause_when_failover_disabled() -> bool {
    true
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            slow_threshold_ms: default_slow_threshold_ms(),
            health_path: default_health_path(),
            recovery_threshold: default_recovery_threshold(),
            pause_when_failover_disabled: default_pause_when_failover_disabled(),
        }
    }
}

impl ProbeConfig {
    /// プローブ間隔
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// プローブタイムアウト
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// degraded判定のレイテンシ閾値
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }

    fn validate(&self) -> CommonResult<()> {
        if self.interval_secs == 0 {
            return Err(CommonError::Config(
                "probe.interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(CommonError::Config(
                "probe.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.recovery_threshold == 0 {
            return Err(CommonError::Config(
                "probe.recovery_threshold must be at least 1".to_string(),
            ));
        }
        if !self.health_path.starts_with('/') {
            return Err(CommonError::Config(format!(
                "probe.health_path must start with '/': {}",
                self.health_path
            )));
        }
        Ok(())
    }
}

/// エンドポイント設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// 一意識別子
    pub id: String,
    /// 表示名（省略時はid）
    #[serde(default)]
    pub name: Option<String>,
    /// ベースURL
    pub url: String,
    /// 役割 (デフォルト: secondary)
    #[serde(default)]
    pub role: EndpointRole,
    /// 初期負荷率 (デフォルト: 0)
    #[serde(default)]
    pub load: f64,
}

impl EndpointConfig {
    /// 表示名（未設定ならid）
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    fn validate(&self) -> CommonResult<()> {
        if self.id.trim().is_empty() {
            return Err(CommonError::Config("endpoint id must not be empty".to_string()));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(CommonError::Config(format!(
                "endpoint {} has a non-http url: {}",
                self.id, self.url
            )));
        }
        if !(0.0..=MAX_LOAD_PERCENT).contains(&self.load) {
            return Err(CommonError::Config(format!(
                "endpoint {} load must be within 0-100, got {}",
                self.id, self.load
            )));
        }
        Ok(())
    }
}
