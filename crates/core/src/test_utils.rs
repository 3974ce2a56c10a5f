//! 测试辅助实现，仅在 `test-utils` 特性下编译。

use crate::market::entity::{ChannelState, DataPoint, Trend};
use crate::market::error::MarketError;
use crate::market::port::{SubscriptionChannel, UpdateHandler};
use crate::market::subscriber::{Subscribers, Subscription};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;

/// # Summary
/// 手动驱动的订阅通道，由测试代码调用 `emit` 推送更新。
///
/// # Invariants
/// - 只有处于 `Connected` 时 `emit` 才会投递。
pub struct ManualChannel {
    state: Mutex<ChannelState>,
    subscribers: Subscribers<DataPoint>,
}

impl ManualChannel {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChannelState::Disconnected),
            subscribers: Subscribers::new(),
        }
    }

    /// 推送一条更新，返回实际投递的回调数量
    pub fn emit(&self, point: &DataPoint) -> usize {
        if self.state() != ChannelState::Connected {
            return 0;
        }
        self.subscribers.dispatch(point)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for ManualChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionChannel for ManualChannel {
    async fn connect(&self) -> Result<(), MarketError> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ChannelState::Connected;
        Ok(())
    }

    async fn disconnect(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ChannelState::Disconnected;
    }

    fn subscribe(&self, handler: UpdateHandler) -> Subscription {
        self.subscribers.subscribe(handler)
    }

    fn state(&self) -> ChannelState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 固定的测试基准时间 2024-01-01T00:00:00Z
pub fn base_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0)
        .single()
        .unwrap_or_default()
}

/// 构造第 `seq` 个测试数据点，时间戳按分钟递增
pub fn point_at(seq: i64, value: f64) -> DataPoint {
    DataPoint {
        label: base_time() + Duration::minutes(seq),
        value,
        volume: 1_000.0,
        change: 0.0,
        volatility: 0.1,
        trend: Trend::Stable,
        short_moving_average: None,
        long_moving_average: None,
    }
}
