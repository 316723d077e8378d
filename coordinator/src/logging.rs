//! ロギング初期化
//!
//! ログレベルは `FAILOVER_LOG_LEVEL`、未設定なら `RUST_LOG`、どちらもなければ `info`。
//! `FAILOVER_LOG_DIR` を指定すると標準出力に加えて日次ローテーションのファイルへも出力する。

use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// ログレベル指定の環境変数
pub const LOG_LEVEL_ENV: &str = "FAILOVER_LOG_LEVEL";

/// ログ出力ディレクトリの環境変数
pub const LOG_DIR_ENV: &str = "FAILOVER_LOG_DIR";

/// ログファイル名のプレフィックス
const LOG_FILE_PREFIX: &str = "failover-coordinator.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter() -> EnvFilter {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// グローバルsubscriberを初期化する
///
/// 既に初期化済みの場合はエラーを返す。
pub fn init() -> anyhow::Result<()> {
    let stdout_layer = fmt::layer().with_target(true).boxed();

    let file_layer = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().with_ansi(false).with_writer(writer).boxed())
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
