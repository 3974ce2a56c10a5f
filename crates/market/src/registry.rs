use crate::service::MarketDataService;
use gridpulse_core::market::error::MarketError;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// # Summary
/// 行情服务的单实例持有者。
///
/// # Invariants
/// - 由组合根（应用启动入口）创建并按引用传递，不是全局静态变量。
/// - 至多持有一个服务实例：首个调用方提供构造逻辑，后续调用方复用同一实例。
/// - 初始化之前访问返回 `NotInitialized`。
#[derive(Default)]
pub struct ServiceRegistry {
    slot: OnceLock<Arc<MarketDataService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// 获取实例，若尚未创建则调用 `build` 构造。
    ///
    /// # Logic
    /// 1. 已初始化时直接返回现有实例，`build` 不会被调用。
    /// 2. 否则执行 `build` 并保存结果，并发调用时只有一个 `build` 生效。
    pub fn get_or_init<F>(&self, build: F) -> Arc<MarketDataService>
    where
        F: FnOnce() -> Arc<MarketDataService>,
    {
        self.slot
            .get_or_init(|| {
                info!("Initializing market data service");
                build()
            })
            .clone()
    }

    /// 获取已初始化的实例
    pub fn get(&self) -> Result<Arc<MarketDataService>, MarketError> {
        self.slot.get().cloned().ok_or(MarketError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }
}
