//! 配置加载：可选的 TOML 文件叠加 `GRIDPULSE__*` 环境变量。

use config::{Config, ConfigError, Environment, File};
use gridpulse_core::config::AppConfig;
use std::path::Path;

/// 默认配置文件位置（相对工作目录）
pub const DEFAULT_PATH: &str = "config/gridpulse.toml";

/// 环境变量前缀，层级以 `__` 分隔，如 `GRIDPULSE__SERVER__PORT=9000`
const ENV_PREFIX: &str = "GRIDPULSE";

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 文件不存在时跳过，缺失的键取 `AppConfig` 默认值。
/// 2. 环境变量覆盖文件中的同名键。
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
