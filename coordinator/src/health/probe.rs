//! ヘルスプローブ
//!
//! 1エンドポイントに対する1回のヘルスチェック呼び出し。想定内の失敗は
//! 例外やパニックではなく [`ProbeOutcome::Failed`] として値で返す。

use async_trait::async_trait;
use failover_common::config::ProbeConfig;
use failover_common::error::{CoordinatorError, CoordinatorResult};
use failover_common::protocol::HealthReport;
use failover_common::types::Endpoint;
use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;

/// プローブ失敗の理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// タイムアウト
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    /// 接続失敗
    #[error("connection failed: {0}")]
    Connect(String),
    /// その他のリクエスト失敗
    #[error("request failed: {0}")]
    Request(String),
}

/// プローブ結果
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// HTTP応答を受信した（ステータスは問わない）
    Responded {
        /// HTTPステータスコード
        status: u16,
        /// 往復時間
        latency: Duration,
        /// JSONボディ（解釈できなければ None）
        report: Option<HealthReport>,
    },
    /// 応答なし
    Failed(ProbeError),
}

/// ヘルスプローブ
///
/// 本番は [`HttpProbe`]。テストでは任意の結果を返す実装を差し込む。
#[async_trait]
pub trait Probe: Send + Sync {
    /// エンドポイントを1回プローブする
    async fn probe(&self, endpoint: &Endpoint) -> ProbeOutcome;
}

/// HTTP GETによるヘルスプローブ
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
    health_path: String,
    timeout: Duration,
}

impl HttpProbe {
    /// プローブ設定からHTTPプローブを作成
    pub fn new(config: &ProbeConfig) -> CoordinatorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CoordinatorError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            health_path: config.health_path.clone(),
            timeout: config.timeout(),
        })
    }

    /// ヘルスチェックURL
    pub fn health_url(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", endpoint.url.trim_end_matches('/'), self.health_path)
    }

    fn map_error(&self, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else if err.is_connect() {
            ProbeError::Connect(err.to_string())
        } else {
            ProbeError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let url = self.health_url(endpoint);
        let start = Instant::now();

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return ProbeOutcome::Failed(self.map_error(e)),
        };
        let status = response.status().as_u16();

        let report = match response.bytes().await {
            Ok(body) => serde_json::from_slice::<HealthReport>(&body).ok(),
            Err(e) if e.is_timeout() => return ProbeOutcome::Failed(ProbeError::Timeout(self.timeout)),
            Err(_) => None,
        };

        ProbeOutcome::Responded {
            status,
            latency: start.elapsed(),
            report,
        }
    }
}
