use crate::common::{Category, TimeRange};
use crate::market::error::MarketError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 趋势判定阈值（百分比）。涨跌幅绝对值低于此值视为持平。
pub const TREND_THRESHOLD_PCT: f64 = 0.1;

/// # Summary
/// 价格趋势方向。
///
/// # Invariants
/// - 只能由涨跌幅推导得出，不可脱离其描述的数值单独赋值。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    /// # Summary
    /// 根据百分比涨跌幅推导趋势。
    ///
    /// # Logic
    /// 1. 非有限值或绝对值小于 `TREND_THRESHOLD_PCT` 时返回 `Stable`。
    /// 2. 否则按符号返回 `Up` / `Down`。
    pub fn from_change(change_pct: f64) -> Self {
        if !change_pct.is_finite() || change_pct.abs() < TREND_THRESHOLD_PCT {
            Trend::Stable
        } else if change_pct > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }
}

/// # Summary
/// 行情数据点，序列的最小单元。
///
/// # Invariants
/// - `label` 在序列内唯一且严格递增。
/// - `value` 为有限值，`volume` 与 `volatility` 非负。
/// - `change` 永不为 NaN。
/// - 均线字段在历史不足时为 `None`，这是合法的缺失状态而非错误。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    // 时间戳标识 (ISO-8601)
    pub label: DateTime<Utc>,
    // 报价
    pub value: f64,
    // 成交量
    pub volume: f64,
    // 相对参考值的百分比涨跌幅
    pub change: f64,
    // 波动率
    pub volatility: f64,
    // 趋势方向
    pub trend: Trend,
    // 短周期均线
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_moving_average: Option<f64>,
    // 长周期均线
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_moving_average: Option<f64>,
}

impl DataPoint {
    /// # Summary
    /// 校验单点不变量，用于来自进程外的数据点。
    ///
    /// # Logic
    /// 1. `value`、`change` 与已给出的均线必须是有限值。
    /// 2. `volume`、`volatility` 必须是非负有限值。
    /// 3. `trend` 必须等于 `Trend::from_change(change)`。
    ///
    /// # Returns
    /// 违反任一条返回 `MarketError::InvalidDataPoint`。
    pub fn validate(&self) -> Result<(), MarketError> {
        let invalid = |reason: String| Err(MarketError::InvalidDataPoint(reason));
        if !self.value.is_finite() {
            return invalid(format!("value {} is not finite", self.value));
        }
        if !self.change.is_finite() {
            return invalid(format!("change {} is not finite", self.change));
        }
        if !(self.volume.is_finite() && self.volume >= 0.0) {
            return invalid(format!("volume {} is negative or not finite", self.volume));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return invalid(format!(
                "volatility {} is negative or not finite",
                self.volatility
            ));
        }
        let averages = [self.short_moving_average, self.long_moving_average];
        if averages.iter().flatten().any(|v| !v.is_finite()) {
            return invalid("moving average is not finite".to_string());
        }
        let expected = Trend::from_change(self.change);
        if self.trend != expected {
            return invalid(format!(
                "trend {:?} contradicts change {} (expected {:?})",
                self.trend, self.change, expected
            ));
        }
        Ok(())
    }
}

/// # Summary
/// 某个 (品种, 时间范围) 下的有序行情序列。
///
/// # Invariants
/// - `points` 的插入顺序即时间顺序。
/// - `trend` 与 `volatility` 为整条序列的指标汇总。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub category: Category,
    pub range: TimeRange,
    pub points: Vec<DataPoint>,
    pub trend: Trend,
    pub volatility: f64,
}

impl Series {
    /// 构造空序列，用于生成失败时的降级返回
    pub fn empty(category: Category, range: TimeRange) -> Self {
        Self {
            category,
            range,
            points: Vec::new(),
            trend: Trend::Stable,
            volatility: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// # Summary
/// 订阅通道的连接状态机：`Disconnected → Connecting → Connected → Disconnected`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}
