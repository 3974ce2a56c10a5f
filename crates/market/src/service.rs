use crate::buffer::RollingBuffer;
use crate::generator::{expand_history, generate_seed};
use crate::indicator::{annotate, trailing_mean, trend_of, volatility_of};
use crate::policy::policy_for;
use gridpulse_core::cache::port::{SeriesCache, SeriesKey};
use gridpulse_core::common::time::{SystemClock, TimeProvider};
use gridpulse_core::common::{Category, TimeRange};
use gridpulse_core::config::MarketConfig;
use gridpulse_core::market::entity::{ChannelState, DataPoint, Series};
use gridpulse_core::market::error::MarketError;
use gridpulse_core::market::port::SubscriptionChannel;
use gridpulse_core::market::subscriber::{Handler, Subscribers, Subscription};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// 实时窗口回调，参数为更新后的完整窗口（按时间顺序，末尾是最新一条）
pub type LiveHandler = Handler<[DataPoint]>;

/// # Summary
/// 行情数据服务门面：编排生成器、指标计算、时间范围策略与缓存，并持有订阅通道。
///
/// # Invariants
/// - 缓存与订阅者集合只由本服务修改。
/// - 构造时向订阅通道注册唯一一个内部回调，负责维护滚动窗口并转发给实时订阅者。
/// - 缓存未命中的“读-生成-写”在生成锁内完成，同一时刻只有一个生成流程。
pub struct MarketDataService {
    // 序列缓存
    cache: Arc<dyn SeriesCache>,
    // 实时订阅通道
    channel: Arc<dyn SubscriptionChannel>,
    // 时钟
    clock: Arc<dyn TimeProvider>,
    // 随机源
    rng: Mutex<StdRng>,
    // 缓存未命中时的生成锁
    generation_lock: tokio::sync::Mutex<()>,
    // 实时滚动窗口
    window: Arc<Mutex<RollingBuffer<DataPoint>>>,
    // 实时窗口订阅者
    live: Subscribers<[DataPoint]>,
    // 服务在通道上的内部订阅
    feed_subscription: Subscription,
    short_period: usize,
    long_period: usize,
}

impl MarketDataService {
    /// # Summary
    /// 使用系统时钟与熵源随机数构造服务。
    ///
    /// # Arguments
    /// * `config`: 均线周期与窗口容量。
    /// * `cache`: 序列缓存实现。
    /// * `channel`: 订阅通道实现（模拟或传输）。
    pub fn new(
        config: &MarketConfig,
        cache: Arc<dyn SeriesCache>,
        channel: Arc<dyn SubscriptionChannel>,
    ) -> Arc<Self> {
        Self::with_parts(
            config,
            cache,
            channel,
            Arc::new(SystemClock),
            StdRng::from_entropy(),
        )
    }

    /// # Summary
    /// 注入全部依赖构造服务，测试中用于固定时钟与随机种子。
    ///
    /// # Logic
    /// 1. 初始化滚动窗口与实时订阅者集合。
    /// 2. 向通道注册内部回调：补齐均线、写入窗口、向实时订阅者投递窗口快照。
    pub fn with_parts(
        config: &MarketConfig,
        cache: Arc<dyn SeriesCache>,
        channel: Arc<dyn SubscriptionChannel>,
        clock: Arc<dyn TimeProvider>,
        rng: StdRng,
    ) -> Arc<Self> {
        let window = Arc::new(Mutex::new(RollingBuffer::<DataPoint>::new(
            config.window_capacity,
        )));
        let live = Subscribers::<[DataPoint]>::new();
        let (short_period, long_period) = (config.short_ma_period, config.long_ma_period);

        let feed_window = window.clone();
        let feed_live = live.clone();
        let feed_subscription = channel.subscribe(Arc::new(move |point: &DataPoint| {
            let snapshot = {
                let mut window = feed_window.lock().unwrap_or_else(|e| e.into_inner());
                let mut point = point.clone();
                let mut values: Vec<f64> = window.iter().map(|p| p.value).collect();
                values.push(point.value);
                point.short_moving_average = point
                    .short_moving_average
                    .or_else(|| trailing_mean(&values, short_period));
                point.long_moving_average = point
                    .long_moving_average
                    .or_else(|| trailing_mean(&values, long_period));
                window.push(point);
                window.to_vec()
            };
            feed_live.dispatch(snapshot.as_slice());
        }));

        info!(
            window_capacity = config.window_capacity,
            short_period, long_period, "Market data service created"
        );

        Arc::new(Self {
            cache,
            channel,
            clock,
            rng: Mutex::new(rng),
            generation_lock: tokio::sync::Mutex::new(()),
            window,
            live,
            feed_subscription,
            short_period,
            long_period,
        })
    }

    /// # Summary
    /// 按文本标识获取序列。
    ///
    /// # Logic
    /// 1. 先解析品种与时间范围，非法标识在触碰缓存之前返回错误。
    /// 2. 委托 `series_for` 完成缓存查询与生成。
    ///
    /// # Returns
    /// 成功返回序列；非法标识返回 `InvalidCategory` / `UnknownTimeRange`。
    pub async fn get_series(&self, category: &str, range: &str) -> Result<Arc<Series>, MarketError> {
        let category: Category = category.parse()?;
        let range: TimeRange = range.parse()?;
        self.series_for(category, range).await
    }

    /// # Summary
    /// 获取指定 (品种, 时间范围) 的序列。
    ///
    /// # Logic
    /// 1. 查询缓存，命中则直接返回缓存中的同一份 `Arc`。
    /// 2. 未命中时获取生成锁并复查缓存，避免重复生成。
    /// 3. 生成种子点 → 按策略展开历史 → 标注均线 → 汇总趋势与波动率 → 写入缓存。
    /// 4. 生成失败时记录日志并返回空序列（不写缓存）。
    pub async fn series_for(
        &self,
        category: Category,
        range: TimeRange,
    ) -> Result<Arc<Series>, MarketError> {
        let key = SeriesKey::new(category, range);
        if let Some(hit) = self.cache.get(&key).await? {
            debug!(%key, "Series cache hit");
            return Ok(hit);
        }

        let _guard = self.generation_lock.lock().await;
        if let Some(hit) = self.cache.get(&key).await? {
            debug!(%key, "Series cache filled while waiting");
            return Ok(hit);
        }

        match self.generate(category, range) {
            Ok(series) => {
                let series = Arc::new(series);
                self.cache.set(key, series.clone()).await?;
                debug!(%key, points = series.len(), "Series generated and cached");
                Ok(series)
            }
            Err(e) => {
                error!(%key, "Series generation failed: {}", e);
                Ok(Arc::new(Series::empty(category, range)))
            }
        }
    }

    fn generate(&self, category: Category, range: TimeRange) -> Result<Series, MarketError> {
        let policy = policy_for(range);
        let now = self.clock.now();
        let mut points = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            let seed = generate_seed(category, &mut *rng, now);
            expand_history(&seed, &policy, &mut *rng, now)?
        };
        annotate(&mut points, self.short_period, self.long_period);

        Ok(Series {
            category,
            range,
            trend: trend_of(&points),
            volatility: volatility_of(&points),
            points,
        })
    }

    /// # Summary
    /// 订阅实时滚动窗口。
    ///
    /// # Returns
    /// 订阅句柄，调用 `unsubscribe` 注销。
    pub fn subscribe_live(&self, callback: LiveHandler) -> Subscription {
        self.live.subscribe(callback)
    }

    /// 当前滚动窗口快照
    pub fn live_window(&self) -> Vec<DataPoint> {
        self.window
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .to_vec()
    }

    pub async fn connect(&self) -> Result<(), MarketError> {
        self.channel.connect().await
    }

    pub async fn disconnect(&self) {
        self.channel.disconnect().await;
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    /// 运维操作：清空全部缓存序列，返回实际移除的条数
    pub async fn clear_cache(&self) -> Result<usize, MarketError> {
        let evicted = self.cache.clear().await?;
        info!(evicted, "Series cache cleared");
        Ok(evicted)
    }

    /// # Summary
    /// 进程退出前调用：断开通道并清空缓存。
    pub async fn shutdown(&self) {
        self.channel.disconnect().await;
        if let Err(e) = self.cache.clear().await {
            warn!("Failed to clear series cache on shutdown: {}", e);
        }
        info!("Market data service shut down");
    }
}

impl Drop for MarketDataService {
    fn drop(&mut self) {
        self.feed_subscription.unsubscribe();
    }
}
