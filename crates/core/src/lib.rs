//! # `gridpulse-core` - 领域核心
//!
//! 行情数据管线的纯领域层：实体、错误、端口 (Port) 与运行配置。
//! 本 crate 不依赖任何具体适配器，缓存、订阅通道与传输实现均在下游 crate 中注入。

pub mod cache;
pub mod common;
pub mod config;
pub mod market;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
