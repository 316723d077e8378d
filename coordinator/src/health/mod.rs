//! ヘルスチェック監視
//!
//! PULL型ヘルスチェックを提供する。各エンドポイントの `<url>/health` を定期的に
//! 呼び出し、応答ステータスとレイテンシから healthy / degraded / unhealthy を判定する。

pub mod probe;
pub mod prober;

pub use probe::{HttpProbe, Probe, ProbeError, ProbeOutcome};
pub use prober::{classify, CycleReport, HealthProber, Observation};
