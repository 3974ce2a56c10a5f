use crate::lifecycle::Lifecycle;
use async_trait::async_trait;
use futures::StreamExt;
use gridpulse_core::market::entity::{ChannelState, DataPoint};
use gridpulse_core::market::error::MarketError;
use gridpulse_core::market::port::{SubscriptionChannel, Transport, UpdateHandler};
use gridpulse_core::market::subscriber::{Subscribers, Subscription};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// # Summary
/// 传输订阅通道：转发外部连接上收到的具名行情事件。
///
/// # Invariants
/// - 只转发事件名与配置一致、负载可解码且满足数据点不变量的事件，保持到达顺序。
/// - `disconnect` 返回后，进行中的批次不再调用剩余回调。
/// - 连接中断（流结束或流错误）只在本地回落到 `Disconnected`，不向订阅者报错。
/// - 不做自动重连，重连节奏由上层决定。
pub struct TransportChannel<T: Transport + 'static> {
    transport: Arc<T>,
    // 承载数据点的事件名
    event_name: Arc<str>,
    lifecycle: Arc<Lifecycle>,
    subscribers: Subscribers<DataPoint>,
}

impl<T: Transport + 'static> TransportChannel<T> {
    pub fn new(transport: T, event_name: impl Into<String>) -> Self {
        Self {
            transport: Arc::new(transport),
            event_name: Arc::from(event_name.into()),
            lifecycle: Arc::new(Lifecycle::new()),
            subscribers: Subscribers::new(),
        }
    }
}

#[async_trait]
impl<T: Transport + 'static> SubscriptionChannel for TransportChannel<T> {
    /// # Summary
    /// 打开传输并启动转发任务。
    ///
    /// # Logic
    /// 1. 非 `Disconnected` 状态直接返回。
    /// 2. 进入 `Connecting` 并等待传输建连；失败回落到 `Disconnected` 并返回错误。
    /// 3. 建连期间若被 `disconnect`，丢弃新连接。
    /// 4. 进入 `Connected`，后台任务逐条解码并投递，流终止后标记连接丢失。
    async fn connect(&self) -> Result<(), MarketError> {
        let Some(epoch) = self.lifecycle.begin_connect() else {
            return Ok(());
        };

        let mut stream = match self.transport.open().await {
            Ok(stream) => stream,
            Err(e) => {
                self.lifecycle.connection_lost(epoch);
                warn!("Transport connect failed: {}", e);
                return Err(e);
            }
        };
        if !self.lifecycle.mark_connected(epoch) {
            debug!("Transport connected after disconnect was requested, dropping connection");
            return Ok(());
        }

        let event_name = self.event_name.clone();
        let lifecycle = self.lifecycle.clone();
        let subscribers = self.subscribers.clone();

        let task = tokio::spawn(async move {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(event) if event.event == *event_name => {
                        let point = match serde_json::from_value::<DataPoint>(event.data) {
                            Ok(point) => point,
                            Err(e) => {
                                warn!("Dropping undecodable {} payload: {}", event_name, e);
                                continue;
                            }
                        };
                        if let Err(e) = point.validate() {
                            warn!("Dropping invalid {} payload: {}", event_name, e);
                            continue;
                        }
                        if !lifecycle.is_current(epoch) {
                            return;
                        }
                        subscribers.dispatch_while(&point, || lifecycle.is_current(epoch));
                    }
                    Ok(event) => debug!(event = %event.event, "Ignoring unrelated transport event"),
                    Err(e) => {
                        warn!("Transport stream failed: {}", e);
                        break;
                    }
                }
            }
            if lifecycle.connection_lost(epoch) {
                warn!("Transport connection lost");
            }
        });
        self.lifecycle.attach_task(epoch, task.abort_handle());

        info!(event = %self.event_name, "Transport channel connected");
        Ok(())
    }

    async fn disconnect(&self) {
        if self.lifecycle.disconnect() {
            info!(event = %self.event_name, "Transport channel disconnected");
        }
    }

    fn subscribe(&self, handler: UpdateHandler) -> Subscription {
        self.subscribers.subscribe(handler)
    }

    fn state(&self) -> ChannelState {
        self.lifecycle.state()
    }
}
