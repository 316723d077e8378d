//! コンポーネント結線
//!
//! レジストリ・プローバー・フェイルオーバーコントローラー・レポーターを1つの
//! ハンドルにまとめる。APIハンドラーとCLIはこのハンドル経由でのみ状態に触れる。

use failover_common::config::ControllerConfig;
use failover_common::error::{CommonError, CoordinatorError, CoordinatorResult};
use failover_common::protocol::{RoutingResponse, StatusReport, TrafficWeights};
use failover_common::types::MAX_LOAD_PERCENT;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::failover::{FailoverController, FailoverDecision};
use crate::health::{CycleReport, HealthProber, HttpProbe, Probe};
use crate::registry::EndpointRegistry;
use crate::shutdown::ShutdownController;
use crate::status::StatusReporter;

/// フェイルオーバーサービス
#[derive(Clone)]
pub struct FailoverService {
    registry: EndpointRegistry,
    failover: FailoverController,
    prober: HealthProber,
    reporter: StatusReporter,
    shutdown: ShutdownController,
}

impl FailoverService {
    /// 設定からHTTPプローブを使うサービスを作成
    pub fn from_config(config: &ControllerConfig) -> CoordinatorResult<Self> {
        let probe = HttpProbe::new(&config.probe)?;
        Ok(Self::with_probe(config, Arc::new(probe)))
    }

    /// 任意のプローブ実装でサービスを作成
    pub fn with_probe(config: &ControllerConfig, probe: Arc<dyn Probe>) -> Self {
        let registry = EndpointRegistry::from_config(config);
        let failover = FailoverController::new();
        let shutdown = ShutdownController::default();
        let prober = HealthProber::new(
            registry.clone(),
            probe,
            failover.clone(),
            shutdown.clone(),
            config.probe.clone(),
        );

        Self {
            reporter: StatusReporter::new(registry.clone()),
            registry,
            failover,
            prober,
            shutdown,
        }
    }

    /// レジストリ
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// シャットダウンコントローラー
    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// バックグラウンドのプローブループを開始
    pub fn start(&self) -> JoinHandle<()> {
        self.prober.clone().start()
    }

    /// プローブサイクルを1回実行
    pub async fn run_cycle(&self) -> CycleReport {
        self.prober.run_cycle().await
    }

    /// 自動フェイルオーバーを切り替え、その場で判定し直す
    pub async fn set_auto_failover(&self, enabled: bool) -> FailoverDecision {
        self.registry.set_auto_failover(enabled);
        self.failover.evaluate(&self.registry.snapshot().await)
    }

    /// 自動フェイルオーバーが有効か
    pub fn auto_failover_enabled(&self) -> bool {
        self.registry.auto_failover_enabled()
    }

    /// 外部テレメトリの負荷率を反映する
    pub async fn update_load(&self, id: &str, load: f64) -> CoordinatorResult<()> {
        if !load.is_finite() || !(0.0..=MAX_LOAD_PERCENT).contains(&load) {
            return Err(CommonError::Validation(format!(
                "load must be within 0-{MAX_LOAD_PERCENT}, got {load}"
            ))
            .into());
        }

        if !self.registry.update_load(id, load).await {
            return Err(CoordinatorError::EndpointNotFound(id.to_string()));
        }
        info!(endpoint_id = %id, load, "Endpoint load updated");
        Ok(())
    }

    /// 現在のステータス
    pub async fn report(&self) -> StatusReport {
        self.reporter.report().await
    }

    /// 現在の推奨トラフィック比率
    pub async fn weights(&self) -> TrafficWeights {
        self.reporter.weights().await
    }

    /// ルーティング情報
    pub async fn routing(&self) -> RoutingResponse {
        self.reporter.routing().await
    }

    /// プローブループの停止を要求
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.request_shutdown();
    }
}
