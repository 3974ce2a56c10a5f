use crate::market::entity::{ChannelState, DataPoint};
use crate::market::error::MarketError;
use crate::market::subscriber::{Handler, Subscription};
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// 实时行情更新回调
pub type UpdateHandler = Handler<DataPoint>;

/// # Summary
/// 传输层下行的具名事件，`data` 保留原始 JSON，由通道按事件名解码。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedEvent {
    pub event: String,
    pub data: serde_json::Value,
}

/// 传输层事件流。流结束或产出错误均视为连接断开。
pub type EventStream = Pin<Box<dyn Stream<Item = Result<NamedEvent, MarketError>> + Send>>;

/// # Summary
/// 实时行情订阅通道契约（发布/订阅）。
///
/// # Invariants
/// - 状态机：`Disconnected → Connecting → Connected → Disconnected`。
/// - `connect` 幂等：处于 `Connecting` / `Connected` 时调用为空操作。
/// - `subscribe` 在任意状态下均可调用；未连接时只登记，不投递。
/// - `disconnect` 之后不再产生任何投递，直到再次 `connect`。
/// - 模拟实现与传输实现对订阅者不可区分。
#[async_trait]
pub trait SubscriptionChannel: Send + Sync {
    /// # Summary
    /// 建立连接并开始投递。
    ///
    /// # Logic
    /// 1. 若已连接或正在连接则直接返回。
    /// 2. 切换到 `Connecting`，建立底层连接。
    /// 3. 成功后切换到 `Connected` 并启动后台投递任务；失败回落到 `Disconnected`。
    ///
    /// # Returns
    /// 建连失败返回 `MarketError::Transport`。
    async fn connect(&self) -> Result<(), MarketError>;

    /// # Summary
    /// 断开连接，取消全部待执行的周期投递。
    async fn disconnect(&self);

    /// # Summary
    /// 登记订阅回调。
    ///
    /// # Returns
    /// 返回订阅句柄，调用其 `unsubscribe` 即可注销。
    fn subscribe(&self, handler: UpdateHandler) -> Subscription;

    /// 当前连接状态
    fn state(&self) -> ChannelState;
}

/// # Summary
/// 面向连接的双工传输接口，通道只把它当作具名事件的来源。
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Summary
    /// 打开连接并返回下行事件流。
    ///
    /// # Returns
    /// 成功返回事件流，失败返回 `MarketError::Transport`。
    async fn open(&self) -> Result<EventStream, MarketError>;
}
