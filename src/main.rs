use activity_map::core::{ConfigProvider, TimeFilter};
use activity_map::utils::error::{ErrorSeverity, MapError};
use activity_map::utils::{logger, validation::Validate};
use activity_map::{
    CliConfig, GeoJsonSurface, HttpFetcher, IngestEngine, LocalStorage, MapRenderer, MapView,
    RefreshScheduler, SheetPipeline, TomlConfig, ViewCommand,
};
use clap::Parser;
use std::io::BufRead;
use tokio::sync::{mpsc, oneshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting activity-map");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    match cli.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let config = TomlConfig::from_file(&path).unwrap_or_else(|e| exit_with(&e));
            let monitor = cli.monitor || config.monitoring_enabled();
            run(config, &cli, monitor).await
        }
        None => {
            let monitor = cli.monitor;
            run(cli.clone(), &cli, monitor).await
        }
    }
}

async fn run<C: ConfigProvider + Validate>(
    config: C,
    cli: &CliConfig,
    monitor_enabled: bool,
) -> anyhow::Result<()> {
    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let surface = GeoJsonSurface::new(LocalStorage::new(config.output_path()));
    surface.write_page().await?;

    let renderer = MapRenderer::for_policy(config.cluster_policy(), config.cluster_cell_degrees());
    let mut view = MapView::new(surface, renderer, config.initial_filter());

    let pipeline = SheetPipeline::new(HttpFetcher::from_config(&config));
    let engine = IngestEngine::new_with_monitoring(pipeline, monitor_enabled);

    tracing::info!(
        "📡 Source: {} → output: {} (filter: {}, clusters: {})",
        config.source_url(),
        config.output_path(),
        view.filter().as_str(),
        config.cluster_policy().as_str()
    );

    if cli.once {
        let records = engine.run().await.unwrap_or_else(|e| exit_with(&e));
        let visible = view.load(records).await?;
        println!("✅ Rendered {} markers to {}", visible, config.output_path());
        return Ok(());
    }

    let (command_tx, command_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    spawn_filter_control(command_tx);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl-C, shutting down");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                // 沒有訊號處理就一直跑，直到行程被終止
                tracing::error!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    let summary = RefreshScheduler::new(engine, view)
        .run(command_rx, shutdown_rx)
        .await;

    println!(
        "✅ Stopped after {} refresh cycles ({} failed, {} skipped)",
        summary.cycles_completed, summary.cycles_failed, summary.ticks_skipped
    );
    Ok(())
}

/// Reads filter selections from stdin, one per line. A plain thread keeps a
/// blocked read from holding up runtime shutdown.
fn spawn_filter_control(commands: mpsc::Sender<ViewCommand>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let filter = TimeFilter::from_selection(Some(line.as_str()));
            if commands.blocking_send(ViewCommand::SetFilter(filter)).is_err() {
                break;
            }
        }
    });
}

fn exit_with(e: &MapError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
