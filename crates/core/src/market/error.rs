use crate::cache::error::CacheError;
use thiserror::Error;

/// # Summary
/// 行情域错误枚举，覆盖参数校验、单例生命周期、生成与传输故障。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
/// - `InvalidCategory` 与 `UnknownTimeRange` 属于调用方错误，不应重试。
#[derive(Error, Debug)]
pub enum MarketError {
    // 未知的品种标识
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    // 未知的时间范围标识
    #[error("Unknown time range: {0}")]
    UnknownTimeRange(String),
    // 服务在完成配置构造前被访问
    #[error("Market data service is not initialized")]
    NotInitialized,
    // 数据点违反实体不变量（非有限值、负值或趋势与涨跌幅矛盾）
    #[error("Invalid data point: {0}")]
    InvalidDataPoint(String),
    // 合成数据生成过程中的异常
    #[error("Generation failure: {0}")]
    GenerationFailure(String),
    // 传输层错误（建连失败、帧解析失败等）
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl MarketError {
    /// 是否为调用方参数错误
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            MarketError::InvalidCategory(_) | MarketError::UnknownTimeRange(_)
        )
    }
}
