//! Failover Coordinator Entry Point

use clap::Parser;
use failover_common::config::ControllerConfig;
use failover_coordinator::cli::{serve::ServeArgs, Cli, Commands};
use failover_coordinator::service::FailoverService;
use failover_coordinator::shutdown::ShutdownController;
use failover_coordinator::{api, logging, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Status(args)) => {
            if let Err(e) = failover_coordinator::cli::status::execute(&args).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Failover(args)) => {
            if let Err(e) = failover_coordinator::cli::failover::execute(&args).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve(args)) => serve(args).await,
        None => {
            // No subcommand - default to serve with env/config-file settings
            let args = ServeArgs {
                config: std::env::var_os("FAILOVER_CONFIG").map(Into::into),
                ..Default::default()
            };
            serve(args).await;
        }
    }
}

async fn serve(args: ServeArgs) {
    if let Err(e) = logging::init() {
        eprintln!("Error: failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_server(config).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server(config: ControllerConfig) -> anyhow::Result<()> {
    info!(
        endpoints = config.endpoints.len(),
        interval_secs = config.probe.interval_secs,
        timeout_secs = config.probe.timeout_secs,
        auto_failover = config.auto_failover,
        "Starting failover coordinator"
    );

    let service = FailoverService::from_config(&config)?;
    let prober = service.start();
    let shutdown = service.shutdown_controller().clone();

    let app = api::create_router(AppState {
        service: service.clone(),
    });

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Failover coordinator listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    // 実行中のサイクルは中断せず、次のサイクルだけを止める
    service.shutdown();
    if let Err(e) = prober.await {
        error!("Health prober task failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// シャットダウンシグナルを待機
async fn shutdown_signal(shutdown: ShutdownController) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = shutdown.wait() => {
            info!("Shutdown requested, shutting down...");
        }
    }
}
