use crate::cache::error::CacheError;
use crate::common::{Category, TimeRange};
use crate::market::entity::Series;
use async_trait::async_trait;
use std::sync::Arc;

/// # Summary
/// 序列缓存的复合键：(品种, 时间范围)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub category: Category,
    pub range: TimeRange,
}

impl SeriesKey {
    pub fn new(category: Category, range: TimeRange) -> Self {
        Self { category, range }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.range)
    }
}

/// # Summary
/// 行情序列缓存接口 (Port)。
///
/// # Invariants
/// - 条目整体覆盖，不做局部合并；同一键的并发写入以最后一次为准。
/// - 不提供自动过期，新鲜度由调用方决定。
/// - 以 `Arc<Series>` 存取，命中时返回的是同一份对象。
#[async_trait]
pub trait SeriesCache: Send + Sync {
    /// # Summary
    /// 读取指定键的序列。
    ///
    /// # Arguments
    /// * `key`: 缓存键。
    ///
    /// # Returns
    /// 命中返回 `Some(Arc<Series>)`，否则返回 `None`。
    async fn get(&self, key: &SeriesKey) -> Result<Option<Arc<Series>>, CacheError>;

    /// # Summary
    /// 写入（覆盖）指定键的序列。
    ///
    /// # Arguments
    /// * `key`: 缓存键。
    /// * `series`: 完整序列。
    ///
    /// # Returns
    /// 成功返回 Ok。
    async fn set(&self, key: SeriesKey, series: Arc<Series>) -> Result<(), CacheError>;

    /// # Summary
    /// 删除单个键。键不存在时同样返回 Ok。
    async fn remove(&self, key: &SeriesKey) -> Result<(), CacheError>;

    /// # Summary
    /// 清空全部条目（运维操作或进程退出时调用）。
    ///
    /// # Returns
    /// 本次实际移除的条目数。与清理并发写入的条目要么被移除并计入，要么保留。
    async fn clear(&self) -> Result<usize, CacheError>;

    /// 当前条目数量
    async fn len(&self) -> Result<usize, CacheError>;
}
