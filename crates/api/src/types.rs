//! # DTO (Data Transfer Object) 层
//!
//! 面向前端 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use gridpulse_core::common::{Category, TimeRange};
use gridpulse_core::market::entity::{ChannelState, DataPoint};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================
//  行情相关 DTO
// ============================================================

/// 可查询的品种与时间区间目录
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogResponse {
    /// 支持的能源品种
    pub categories: Vec<Category>,
    /// 支持的时间区间标记
    pub ranges: Vec<TimeRange>,
}

impl CatalogResponse {
    pub fn full() -> Self {
        Self {
            categories: Category::all().to_vec(),
            ranges: TimeRange::all().to_vec(),
        }
    }
}

/// 实时滚动窗口快照
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WindowResponse {
    /// 订阅通道当前状态
    pub channel_state: ChannelState,
    /// 按时间顺序排列的窗口数据，末尾为最新一条
    pub points: Vec<DataPoint>,
}

/// 缓存清理结果
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheClearedResponse {
    /// 清理前缓存中的序列条数
    #[schema(example = 3)]
    pub evicted: usize,
}

/// WebSocket 推送帧：`{"event": "marketUpdate", "data": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LiveEvent {
    #[schema(example = "marketUpdate")]
    pub event: String,
    pub data: DataPoint,
}

impl LiveEvent {
    pub const MARKET_UPDATE: &'static str = "marketUpdate";

    pub fn market_update(data: DataPoint) -> Self {
        Self {
            event: Self::MARKET_UPDATE.to_string(),
            data,
        }
    }
}

// ============================================================
//  通用响应 DTO
// ============================================================

/// 统一 API 响应包装器
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T: Serialize + ToSchema> {
    /// 是否成功
    pub success: bool,
    /// 数据载荷 (成功时)
    pub data: Option<T>,
    /// 错误信息 (失败时)
    pub error: Option<String>,
}

impl<T: Serialize + ToSchema> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// 失败响应 (不含泛型载荷)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}
