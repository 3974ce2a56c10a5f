use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub feed: FeedConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 行情服务参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    // 短周期均线窗口
    pub short_ma_period: usize,
    // 长周期均线窗口
    pub long_ma_period: usize,
    // 实时滚动窗口容量
    pub window_capacity: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            short_ma_period: 5,
            long_ma_period: 20,
            window_capacity: 100,
        }
    }
}

/// 实时行情来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    // 本地周期性合成推送
    Simulated,
    // 转发外部传输层事件
    Transport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub mode: FeedMode,
    // 模拟推送周期（秒）
    pub simulated_period_secs: u64,
    // 模拟推送的品种标识
    pub simulated_category: String,
    // 传输层地址，例如 wss://feed.example.com/stream
    pub transport_url: Option<String>,
    // 携带行情数据点的事件名
    pub event_name: String,
    // 上游凭据
    pub api_key: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::Simulated,
            simulated_period_secs: 5,
            simulated_category: "crude-oil".to_string(),
            transport_url: None,
            event_name: "marketUpdate".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    // 默认日志级别，可被 RUST_LOG 覆盖
    pub level: String,
    // 滚动日志目录，为空时只输出到终端
    pub dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}
