//! ヘルスプローバー
//!
//! 定期的に全エンドポイントを並列プローブし、判定結果をレジストリへ書き戻す。
//! 1サイクルの書き込みが終わった後にフェイルオーバー判定を1回実行する。

use chrono::{DateTime, Utc};
use failover_common::config::ProbeConfig;
use failover_common::types::{Endpoint, HealthState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::probe::{Probe, ProbeError, ProbeOutcome};
use crate::failover::{FailoverController, FailoverDecision};
use crate::registry::{EndpointRegistry, HealthUpdate};
use crate::shutdown::ShutdownController;

/// 1回のプローブ結果の判定
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// 観測されたヘルス（ヒステリシス適用前）
    pub health: HealthState,
    /// 応答レイテンシ（応答がなければ None）
    pub response_time_ms: Option<u32>,
    /// 応答ボディで申告された負荷率
    pub load: Option<f64>,
    /// 非healthyの理由
    pub reason: Option<String>,
}

/// プローブ結果をヘルス状態へ分類する
///
/// - 応答なし（接続失敗・タイムアウト）→ unhealthy
/// - 429 / 503 → degraded（過負荷だが生存）
/// - その他の非2xx → unhealthy
/// - 2xxでボディの `status` が正常以外 → degraded
/// - 2xxでレイテンシが閾値超過 → degraded
/// - それ以外の2xx → healthy
pub fn classify(outcome: &ProbeOutcome, slow_threshold: Duration) -> Observation {
    match outcome {
        ProbeOutcome::Failed(err) => Observation {
            health: HealthState::Unhealthy,
            response_time_ms: None,
            load: None,
            reason: Some(err.to_string()),
        },
        ProbeOutcome::Responded {
            status,
            latency,
            report,
        } => {
            let status = *status;
            let response_time_ms = Some(u32::try_from(latency.as_millis()).unwrap_or(u32::MAX));
            let load = report.as_ref().and_then(|r| r.load);

            let (health, reason) = if matches!(status, 429 | 503) {
                (HealthState::Degraded, Some(format!("HTTP {status}")))
            } else if !(200..300).contains(&status) {
                (HealthState::Unhealthy, Some(format!("HTTP {status}")))
            } else if let Some(reported) = report
                .as_ref()
                .filter(|r| !r.reports_ok())
                .and_then(|r| r.status.clone())
            {
                (
                    HealthState::Degraded,
                    Some(format!("reported status: {reported}")),
                )
            } else if *latency > slow_threshold {
                (
                    HealthState::Degraded,
                    Some(format!(
                        "slow response: {}ms > {}ms",
                        latency.as_millis(),
                        slow_threshold.as_millis()
                    )),
                )
            } else {
                (HealthState::Healthy, None)
            };

            Observation {
                health,
                response_time_ms,
                load,
                reason,
            }
        }
    }
}

/// 観測結果と前回状態から次のレジストリ更新を組み立てる
///
/// 一度でもプローブされた非healthyのエンドポイントは、連続healthy観測が
/// `recovery_threshold` 回に達するまで前回のヘルスに留まる。
fn next_update(
    previous: &Endpoint,
    observation: Observation,
    recovery_threshold: u32,
    checked_at: DateTime<Utc>,
) -> HealthUpdate {
    let observed_healthy = observation.health == HealthState::Healthy;
    let success_streak = if observed_healthy {
        previous.success_streak.saturating_add(1)
    } else {
        0
    };
    let error_count = if observation.health == HealthState::Unhealthy {
        previous.error_count.saturating_add(1)
    } else {
        0
    };

    let holding = observed_healthy
        && previous.has_been_probed()
        && previous.health != HealthState::Healthy
        && success_streak < recovery_threshold;

    let (health, last_error) = if holding {
        (
            previous.health,
            Some(format!(
                "recovering: {success_streak}/{recovery_threshold} healthy probes"
            )),
        )
    } else {
        (observation.health, observation.reason)
    };

    HealthUpdate {
        health,
        response_time_ms: observation.response_time_ms,
        last_checked_at: checked_at,
        load: observation.load,
        last_error,
        error_count,
        success_streak,
    }
}

/// 1サイクルの集計
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// プローブしたエンドポイント数
    pub probed: usize,
    /// healthy数
    pub healthy: usize,
    /// degraded数
    pub degraded: usize,
    /// unhealthy数
    pub unhealthy: usize,
    /// パニック等で異常終了したプローブタスク数
    pub task_failures: usize,
    /// サイクル後のフェイルオーバー判定
    pub decision: FailoverDecision,
}

/// ヘルスプローバー
#[derive(Clone)]
pub struct HealthProber {
    registry: EndpointRegistry,
    probe: Arc<dyn Probe>,
    failover: FailoverController,
    shutdown: ShutdownController,
    config: ProbeConfig,
    /// サイクルの多重実行防止
    cycle_lock: Arc<Mutex<()>>,
}

impl HealthProber {
    /// 新しいプローバーを作成
    pub fn new(
        registry: EndpointRegistry,
        probe: Arc<dyn Probe>,
        failover: FailoverController,
        shutdown: ShutdownController,
        config: ProbeConfig,
    ) -> Self {
        Self {
            registry,
            probe,
            failover,
            shutdown,
            config,
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    /// バックグラウンドで監視を開始
    ///
    /// 起動直後に1サイクル実行し、以降は `interval_secs` ごとに繰り返す。
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_cycle().await;
            if self.shutdown.is_shutdown_requested() {
                return;
            }
            self.monitor_loop().await;
        })
    }

    /// 監視ループ
    async fn monitor_loop(&self) {
        let mut timer = interval(self.config.interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.config.interval_secs,
            pause_when_failover_disabled = self.config.pause_when_failover_disabled,
            "Health prober started"
        );

        // 初回tickは即時に返る。起動時サイクルは実行済みなので読み捨てる
        timer.tick().await;

        let pause_enabled = self.config.pause_when_failover_disabled;
        let mut failover_rx = self.registry.subscribe_auto_failover();

        loop {
            // シャットダウン要求はtickより常に優先する
            let ticked = tokio::select! {
                biased;
                _ = self.shutdown.wait() => break,
                _ = timer.tick() => true,
                _ = failover_rx.wait_for(|enabled| !*enabled), if pause_enabled => false,
            };

            if pause_enabled && !self.registry.auto_failover_enabled() {
                if !self.wait_until_failover_enabled().await {
                    break;
                }
                timer.reset();
            } else if !ticked {
                continue;
            }

            self.run_cycle().await;
        }

        info!("Health prober stopped");
    }

    /// 自動フェイルオーバーが再度有効になるまで待つ（シャットダウン時は false）
    async fn wait_until_failover_enabled(&self) -> bool {
        let mut rx = self.registry.subscribe_auto_failover();
        info!("Auto-failover disabled, pausing health probes");

        let reenabled = tokio::select! {
            biased;
            _ = self.shutdown.wait() => false,
            result = rx.wait_for(|enabled| *enabled) => result.is_ok(),
        };
        if !reenabled {
            return false;
        }

        info!("Auto-failover re-enabled, resuming health probes");
        true
    }

    /// 全エンドポイントを並列プローブし、フェイルオーバー判定まで実行する
    pub async fn run_cycle(&self) -> CycleReport {
        let _guard = self.cycle_lock.lock().await;
        let endpoints = self.registry.list().await;

        if endpoints.is_empty() {
            debug!("No endpoints to probe");
        }

        let mut handles = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let prober = self.clone();
            let probed = endpoint.clone();
            handles.push((
                endpoint,
                tokio::spawn(async move { prober.probe_endpoint(&probed).await.health }),
            ));
        }

        let mut probed = 0;
        let mut healthy = 0;
        let mut degraded = 0;
        let mut unhealthy = 0;
        let mut task_failures = 0;

        for (endpoint, handle) in handles {
            probed += 1;
            let health = match handle.await {
                Ok(health) => health,
                Err(e) => {
                    error!(
                        endpoint_id = %endpoint.id,
                        endpoint_name = %endpoint.name,
                        "Probe task join error: {}",
                        e
                    );
                    task_failures += 1;
                    self.record_task_failure(&endpoint).await
                }
            };
            match health {
                HealthState::Healthy => healthy += 1,
                HealthState::Degraded => degraded += 1,
                HealthState::Unhealthy => unhealthy += 1,
            }
        }

        let snapshot = self.registry.snapshot().await;
        let decision = self.failover.evaluate(&snapshot);

        info!(
            probed,
            healthy,
            degraded,
            unhealthy,
            failed_over = decision.failed_over,
            "Probe cycle completed"
        );

        CycleReport {
            probed,
            healthy,
            degraded,
            unhealthy,
            task_failures,
            decision,
        }
    }

    /// 単一エンドポイントをプローブし、結果をレジストリへ反映する
    pub async fn probe_endpoint(&self, endpoint: &Endpoint) -> HealthUpdate {
        let checked_at = Utc::now();
        let probe_timeout = self.config.timeout();

        let outcome = match timeout(probe_timeout, self.probe.probe(endpoint)).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::Failed(ProbeError::Timeout(probe_timeout)),
        };

        let observation = classify(&outcome, self.config.slow_threshold());
        let update = next_update(
            endpoint,
            observation,
            self.config.recovery_threshold,
            checked_at,
        );
        self.apply(endpoint, update.clone()).await;
        update
    }

    /// プローブタスク自体が失敗した場合はunhealthyとして記録する
    async fn record_task_failure(&self, endpoint: &Endpoint) -> HealthState {
        let observation = Observation {
            health: HealthState::Unhealthy,
            response_time_ms: None,
            load: None,
            reason: Some("probe task failed".to_string()),
        };
        let update = next_update(
            endpoint,
            observation,
            self.config.recovery_threshold,
            Utc::now(),
        );
        let health = update.health;
        self.apply(endpoint, update).await;
        health
    }

    async fn apply(&self, previous: &Endpoint, update: HealthUpdate) {
        let from = previous.health;
        let to = update.health;
        let response_time_ms = update.response_time_ms;
        let reason = update.last_error.clone();

        if !self.registry.update(&previous.id, update).await {
            return;
        }

        if from == to {
            debug!(
                endpoint_id = %previous.id,
                health = %to,
                response_time_ms = ?response_time_ms,
                "Health check completed"
            );
        } else if to == HealthState::Healthy {
            info!(
                endpoint_id = %previous.id,
                endpoint_name = %previous.name,
                from = %from,
                to = %to,
                response_time_ms = ?response_time_ms,
                "Endpoint health changed"
            );
        } else {
            warn!(
                endpoint_id = %previous.id,
                endpoint_name = %previous.name,
                from = %from,
                to = %to,
                reason = ?reason,
                "Endpoint health changed"
            );
        }
    }
}
