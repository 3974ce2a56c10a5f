//! 日志初始化：终端输出，可选按天滚动的文件输出。

use gridpulse_core::config::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "gridpulse.log";

/// # Summary
/// 安装全局 tracing 订阅器。
///
/// # Logic
/// 1. `RUST_LOG` 存在时优先，否则使用配置中的级别。
/// 2. 配置了目录时额外写入按天滚动的日志文件（无 ANSI 颜色）。
///
/// # Returns
/// 文件输出的后台写入守卫，必须在进程退出前保持存活，否则尾部日志会丢失。
pub fn init(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;
    let console = fmt::layer().with_target(true);

    let Some(dir) = &config.dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console)
            .try_init()?;
        return Ok(None);
    };

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;

    tracing::info!(level = %config.level, dir = %dir, "File logging enabled");
    Ok(Some(guard))
}
