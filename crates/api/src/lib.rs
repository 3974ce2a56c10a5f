//! # `gridpulse-api` - HTTP / WebSocket 网关
//!
//! 本 crate 是 GridPulse 行情服务的对外入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 提供历史序列查询、滚动窗口快照与缓存管理的 REST 接口
//! - 通过 WebSocket 向浏览器推送实时行情更新
//! - 将领域错误映射为 HTTP 状态码

pub mod error;
pub mod routes;
pub mod server;
pub mod types;
