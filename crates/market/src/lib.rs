//! # `gridpulse-market` - 行情合成与分发
//!
//! 合成历史序列、计算技术指标、维护实时滚动窗口，
//! 并通过 `MarketDataService` 门面对外提供统一入口。

pub mod buffer;
pub mod generator;
pub mod indicator;
pub mod policy;
pub mod registry;
pub mod service;
