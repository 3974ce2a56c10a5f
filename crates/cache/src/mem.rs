use async_trait::async_trait;
use dashmap::DashMap;
use gridpulse_core::cache::error::CacheError;
use gridpulse_core::cache::port::{SeriesCache, SeriesKey};
use gridpulse_core::market::entity::Series;
use std::sync::Arc;
use tracing::debug;

/// # Summary
/// 基于 DashMap 的内存序列缓存。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 不提供自动过期或容量限制，进程重启后数据丢失。
pub struct MemSeriesCache {
    storage: DashMap<SeriesKey, Arc<Series>>,
}

impl MemSeriesCache {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }
}

impl Default for MemSeriesCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeriesCache for MemSeriesCache {
    /// # Summary
    /// 读取缓存条目。
    ///
    /// # Logic
    /// 克隆 `Arc` 指针返回，调用方拿到的是与缓存内同一份序列。
    async fn get(&self, key: &SeriesKey) -> Result<Option<Arc<Series>>, CacheError> {
        Ok(self.storage.get(key).map(|v| v.value().clone()))
    }

    /// # Summary
    /// 写入缓存条目。
    ///
    /// # Logic
    /// 整体替换同名键的旧序列，不做合并。
    async fn set(&self, key: SeriesKey, series: Arc<Series>) -> Result<(), CacheError> {
        if self.storage.insert(key, series).is_some() {
            debug!("Series cache entry {} overwritten", key);
        }
        Ok(())
    }

    async fn remove(&self, key: &SeriesKey) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }

    /// # Summary
    /// 清空缓存并返回移除的条数。
    ///
    /// # Logic
    /// 逐分片持锁移除，计数与实际移除的条目一一对应。
    async fn clear(&self) -> Result<usize, CacheError> {
        let mut evicted = 0;
        self.storage.retain(|_, _| {
            evicted += 1;
            false
        });
        Ok(evicted)
    }

    async fn len(&self) -> Result<usize, CacheError> {
        Ok(self.storage.len())
    }
}
