//! # `gridpulse-feed` - 实时行情来源
//!
//! 订阅通道的两种可互换实现：本地周期合成 (`SimulatedChannel`)
//! 与外部传输转发 (`TransportChannel`)，以及按配置选择实现的工厂。

mod lifecycle;

pub mod factory;
pub mod simulated;
pub mod transport;
pub mod ws;
