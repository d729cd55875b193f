mod logging;
mod settings;
mod wiring;

use bolsa_cache::MemCache;
use bolsa_core::common::time::{RealTimeProvider, TimeProvider};
use bolsa_monitor::{Dashboard, Monitor, MonitorSettings};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 日线行情波动监控
#[derive(Parser, Debug)]
#[command(name = "bolsa", version, about)]
struct Cli {
    /// 配置文件路径，覆盖 BOLSA_CONFIG 与默认的 bolsa.toml
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 只执行一轮刷新后退出
    #[arg(long)]
    once: bool,
}

/// # Summary
/// 执行一轮刷新并写出看板快照。
///
/// # Logic
/// 1. 刷新成功：生成看板，存在不可用标的时告警，原子写入快照。
/// 2. 刷新中止：记录错误，保留上一次快照。
async fn refresh(monitor: &mut Monitor, snapshot_path: &Path) {
    match monitor.run_cycle().await {
        Ok(report) => {
            let dashboard = Dashboard::from_report(&report, monitor.watchlist());
            if let Some(warning) = &dashboard.warning {
                warn!("{}", warning);
            }
            match dashboard.write_atomic(snapshot_path).await {
                Ok(()) => debug!("Dashboard updated: {}", snapshot_path.display()),
                Err(e) => error!("Failed to write snapshot {}: {}", snapshot_path.display(), e),
            }
        }
        Err(e) => error!("{}", e),
    }
}

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 Monitor。
///
/// # Logic
/// 1. 解析命令行，加载 `.env` 与分层配置。
/// 2. 初始化全局日志，安装 TLS 加密后端。
/// 3. 实例化基础设施层 (数据源、缓存、通知通道)。
/// 4. 构造 Monitor，循环执行刷新直到收到 Ctrl-C (或 `--once` 时执行一轮即退出)。
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let dotenv = dotenvy::dotenv();

    // 1. 配置与日志
    let config = settings::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.log)?;
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }
    info!("Bolsa monitor starting...");

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("TLS crypto provider already installed");
    }

    // 2. 实例化基础设施层
    let provider = wiring::build_provider(&config.provider)?;
    let notifier = wiring::build_notifier(&config.notify)?;
    let clock: Arc<dyn TimeProvider> = Arc::new(RealTimeProvider);
    let cache = Arc::new(MemCache::with_clock(clock.clone()));

    // 3. 构造监控器
    let snapshot_path = PathBuf::from(&config.monitor.snapshot_path);
    let interval = config.monitor.refresh_interval();
    let mut monitor = Monitor::new(
        provider,
        cache.clone(),
        notifier,
        clock,
        config.watchlist.clone(),
        MonitorSettings::from(&config),
    );
    info!(
        "Watching {} tickers, refresh every {:?}",
        config.tickers().len(),
        interval
    );

    // 4. 主循环，等待外部退出信号
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = refresh(&mut monitor, &snapshot_path) => {}
            res = &mut shutdown => {
                res?;
                info!("Shutdown signal received. Exiting...");
                break;
            }
        }
        if cli.once {
            break;
        }
        cache.purge_expired();

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            res = &mut shutdown => {
                res?;
                info!("Shutdown signal received. Exiting...");
                break;
            }
        }
    }

    Ok(())
}
