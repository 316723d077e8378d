//! serve サブコマンド
//!
//! ヘルスプローバーとステータスAPIを起動します。

use clap::Args;
use failover_common::config::ControllerConfig;
use failover_common::error::CommonResult;
use std::path::PathBuf;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Config file (TOML/YAML/JSON)
    #[arg(short, long, env = "FAILOVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen port (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind address (overrides the config file)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Start with automatic failover disabled
    #[arg(long, default_value_t = false)]
    pub no_auto_failover: bool,
}

impl ServeArgs {
    /// 設定ファイル・環境変数・引数の順に重ねた設定を返す
    pub fn load_config(&self) -> CommonResult<ControllerConfig> {
        let mut config = ControllerConfig::load(self.config.as_deref())?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.no_auto_failover {
            config.auto_failover = false;
        }
        Ok(config)
    }
}
