mod logging;
mod settings;

use std::path::Path;
use std::sync::Arc;

use gridpulse_api::server::{AppState, start_server};
use gridpulse_cache::mem::MemSeriesCache;
use gridpulse_feed::factory::build_channel;
use gridpulse_market::registry::ServiceRegistry;
use gridpulse_market::service::MarketDataService;
use tracing::{info, warn};

/// # Summary
/// 应用启动入口，纯粹的组合根。
/// 负责实例化所有具体实现组件并通过 `Arc<dyn Trait>` 注入到行情服务。
///
/// # Logic
/// 1. 加载配置并初始化日志。
/// 2. 实例化基础设施层（缓存、订阅通道）。
/// 3. 通过 `ServiceRegistry` 构造唯一的行情服务并连接通道。
/// 4. 启动 HTTP 服务，收到退出信号后优雅停机并释放服务资源。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 配置与日志
    let config = settings::load(Path::new(settings::DEFAULT_PATH))?;
    let _log_guard = logging::init(&config.log)?;
    info!("GridPulse starting...");

    // wss:// 传输需要进程级 TLS 提供者
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    // 2. 基础设施层
    let cache = Arc::new(MemSeriesCache::new());
    let channel = build_channel(&config.feed)?;

    // 3. 行情服务（进程内单实例）
    let registry = ServiceRegistry::new();
    let service =
        registry.get_or_init(|| MarketDataService::new(&config.market, cache, channel));
    if let Err(e) = service.connect().await {
        // 服务仍可提供历史序列，实时推送在通道恢复前为空
        warn!("Live feed unavailable: {}", e);
    }

    // 4. HTTP 服务，挂起直到退出信号
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        service: registry.get()?,
    };
    start_server(state, &bind_addr, shutdown_signal()).await?;

    info!("Shutdown signal received. Exiting...");
    service.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
