use chrono::Duration;
use gridpulse_core::common::TimeRange;

/// # Summary
/// 时间范围对应的生成参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRangePolicy {
    // 序列点数
    pub points: usize,
    // 相邻点的采样间隔
    pub interval: Duration,
    // 波动放大系数
    pub volatility_multiplier: f64,
}

/// # Summary
/// 静态查表：时间范围 → 生成参数。
///
/// # Invariants
/// - 表内数值是对外兼容契约，不可调整。
pub fn policy_for(range: TimeRange) -> TimeRangePolicy {
    let (points, interval, volatility_multiplier) = match range {
        TimeRange::OneDay => (24, Duration::hours(1), 1.0),
        TimeRange::OneWeek => (7, Duration::days(1), 1.2),
        TimeRange::OneMonth => (30, Duration::days(1), 1.5),
        TimeRange::ThreeMonths => (90, Duration::days(1), 1.8),
        TimeRange::OneYear => (52, Duration::weeks(1), 2.0),
        TimeRange::All => (365, Duration::days(1), 2.5),
    };
    TimeRangePolicy {
        points,
        interval,
        volatility_multiplier,
    }
}
