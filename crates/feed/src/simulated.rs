use crate::lifecycle::Lifecycle;
use async_trait::async_trait;
use gridpulse_core::common::Category;
use gridpulse_core::common::time::{SystemClock, TimeProvider};
use gridpulse_core::market::entity::{ChannelState, DataPoint};
use gridpulse_core::market::error::MarketError;
use gridpulse_core::market::port::{SubscriptionChannel, UpdateHandler};
use gridpulse_core::market::subscriber::{Subscribers, Subscription};
use gridpulse_market::generator::generate_tick;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// 推送周期下限，避免零周期导致计时器 panic
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// # Summary
/// 模拟订阅通道：连接后按固定周期合成一条实时更新并投递。
///
/// # Invariants
/// - 首条更新在连接后一个周期到达，之后每个周期一条。
/// - 断开后取消计时任务，进行中的批次不再调用剩余回调；重新连接时从上一条更新继续随机游走。
pub struct SimulatedChannel {
    // 合成的品种
    category: Category,
    // 推送周期
    period: Duration,
    clock: Arc<dyn TimeProvider>,
    rng: Arc<Mutex<StdRng>>,
    // 最近一次推送的数据点
    last: Arc<Mutex<Option<DataPoint>>>,
    lifecycle: Arc<Lifecycle>,
    subscribers: Subscribers<DataPoint>,
}

impl SimulatedChannel {
    pub fn new(category: Category, period: Duration) -> Self {
        Self::with_parts(
            category,
            period,
            Arc::new(SystemClock),
            StdRng::from_entropy(),
        )
    }

    /// 注入时钟与随机源构造，测试中用于复现推送序列
    pub fn with_parts(
        category: Category,
        period: Duration,
        clock: Arc<dyn TimeProvider>,
        rng: StdRng,
    ) -> Self {
        Self {
            category,
            period: period.max(MIN_PERIOD),
            clock,
            rng: Arc::new(Mutex::new(rng)),
            last: Arc::new(Mutex::new(None)),
            lifecycle: Arc::new(Lifecycle::new()),
            subscribers: Subscribers::new(),
        }
    }
}

#[async_trait]
impl SubscriptionChannel for SimulatedChannel {
    /// # Summary
    /// 启动周期推送任务。
    ///
    /// # Logic
    /// 1. 非 `Disconnected` 状态直接返回。
    /// 2. 本地合成无需握手，立即进入 `Connected`。
    /// 3. 启动计时任务，每个周期复核 epoch 后合成并投递一条更新。
    async fn connect(&self) -> Result<(), MarketError> {
        let Some(epoch) = self.lifecycle.begin_connect() else {
            return Ok(());
        };
        if !self.lifecycle.mark_connected(epoch) {
            return Ok(());
        }

        let period = self.period;
        let category = self.category;
        let clock = self.clock.clone();
        let rng = self.rng.clone();
        let last = self.last.clone();
        let lifecycle = self.lifecycle.clone();
        let subscribers = self.subscribers.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !lifecycle.is_current(epoch) {
                    break;
                }
                let point = {
                    let mut rng = rng.lock().unwrap_or_else(|e| e.into_inner());
                    let mut last = last.lock().unwrap_or_else(|e| e.into_inner());
                    let point = generate_tick(last.as_ref(), category, &mut *rng, clock.now());
                    *last = Some(point.clone());
                    point
                };
                let delivered = subscribers.dispatch_while(&point, || lifecycle.is_current(epoch));
                debug!(%category, value = point.value, delivered, "Simulated update emitted");
            }
        });
        self.lifecycle.attach_task(epoch, task.abort_handle());

        info!(category = %self.category, period = ?self.period, "Simulated channel connected");
        Ok(())
    }

    async fn disconnect(&self) {
        if self.lifecycle.disconnect() {
            info!(category = %self.category, "Simulated channel disconnected");
        }
    }

    fn subscribe(&self, handler: UpdateHandler) -> Subscription {
        self.subscribers.subscribe(handler)
    }

    fn state(&self) -> ChannelState {
        self.lifecycle.state()
    }
}
