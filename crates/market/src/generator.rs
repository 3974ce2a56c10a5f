//! 合成行情生成器。
//!
//! 随机源与当前时间都由调用方注入：给定相同种子的 `StdRng` 与固定时钟，输出完全可复现。

use crate::indicator::percent_change;
use crate::policy::TimeRangePolicy;
use chrono::{DateTime, Duration, Utc};
use gridpulse_core::common::Category;
use gridpulse_core::market::entity::{DataPoint, Trend};
use gridpulse_core::market::error::MarketError;
use rand::Rng;

/// 种子点涨跌幅区间（百分比）
const SEED_CHANGE_PCT: f64 = 5.0;
/// 实时推送单步涨跌幅区间（百分比）
const TICK_CHANGE_PCT: f64 = 1.0;
/// 波动率上界（不含）
const MAX_VOLATILITY: f64 = 0.5;

/// 品种的合理报价区间
pub fn price_band(category: Category) -> (f64, f64) {
    match category {
        Category::CrudeOil => (60.0, 95.0),
        Category::NaturalGas => (2.0, 6.0),
        Category::Electricity => (30.0, 120.0),
        Category::Renewables => (10.0, 40.0),
        Category::Coal => (80.0, 150.0),
        Category::Carbon => (55.0, 100.0),
    }
}

/// 品种的合理成交量区间
pub fn volume_band(category: Category) -> (f64, f64) {
    match category {
        Category::CrudeOil => (10_000.0, 50_000.0),
        Category::NaturalGas => (50_000.0, 200_000.0),
        Category::Electricity => (5_000.0, 25_000.0),
        Category::Renewables => (1_000.0, 8_000.0),
        Category::Coal => (2_000.0, 12_000.0),
        Category::Carbon => (3_000.0, 15_000.0),
    }
}

/// # Summary
/// 生成单个种子数据点。
///
/// # Logic
/// 1. 报价、成交量在品种区间内均匀抽样。
/// 2. 涨跌幅在 `[-5, 5)` 内抽样，波动率在 `[0, 0.5)` 内抽样。
/// 3. 趋势由涨跌幅推导。
pub fn generate_seed<R: Rng + ?Sized>(
    category: Category,
    rng: &mut R,
    now: DateTime<Utc>,
) -> DataPoint {
    let (price_lo, price_hi) = price_band(category);
    let (volume_lo, volume_hi) = volume_band(category);
    let change = rng.gen_range(-SEED_CHANGE_PCT..SEED_CHANGE_PCT);
    DataPoint {
        label: now,
        value: rng.gen_range(price_lo..price_hi),
        volume: rng.gen_range(volume_lo..volume_hi),
        change,
        volatility: rng.gen_range(0.0..MAX_VOLATILITY),
        trend: Trend::from_change(change),
        short_moving_average: None,
        long_moving_average: None,
    }
}

/// # Summary
/// 以种子点为中心展开历史序列。
///
/// # Logic
/// 1. 第 `i` 个点的时间戳为 `now - (points - i) * interval`，严格递增。
/// 2. 报价与成交量按 `±volatility * multiplier / 2` 的幅度扰动，成交量截断到 0。
/// 3. 涨跌幅为相对种子报价的百分比，趋势随之推导。
///
/// # Returns
/// 时间戳越界或出现非有限数值时返回 `GenerationFailure`。
pub fn expand_history<R: Rng + ?Sized>(
    seed: &DataPoint,
    policy: &TimeRangePolicy,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Vec<DataPoint>, MarketError> {
    let swing = seed.volatility * policy.volatility_multiplier;
    let mut points = Vec::with_capacity(policy.points);

    for i in 0..policy.points {
        let steps = i32::try_from(policy.points - i)
            .map_err(|e| MarketError::GenerationFailure(e.to_string()))?;
        let label = policy
            .interval
            .checked_mul(steps)
            .and_then(|offset| now.checked_sub_signed(offset))
            .ok_or_else(|| {
                MarketError::GenerationFailure(format!("timestamp out of range at step {i}"))
            })?;

        let value = seed.value * (1.0 + (rng.gen_range(0.0..1.0) - 0.5) * swing);
        let volume = (seed.volume * (1.0 + (rng.gen_range(0.0..1.0) - 0.5) * swing)).max(0.0);
        if !value.is_finite() || !volume.is_finite() {
            return Err(MarketError::GenerationFailure(format!(
                "non-finite sample at step {i}"
            )));
        }

        let change = percent_change(seed.value, value);
        points.push(DataPoint {
            label,
            value,
            volume,
            change,
            volatility: swing,
            trend: Trend::from_change(change),
            short_moving_average: None,
            long_moving_average: None,
        });
    }

    Ok(points)
}

/// # Summary
/// 生成一条实时更新。
///
/// # Logic
/// 1. 没有前值时退化为种子点。
/// 2. 否则在前值基础上随机游走 `[-1, 1)` 个百分点，成交量与波动率重新抽样。
/// 3. 时间戳不早于前值 + 1ms，保证序列严格递增。
pub fn generate_tick<R: Rng + ?Sized>(
    previous: Option<&DataPoint>,
    category: Category,
    rng: &mut R,
    now: DateTime<Utc>,
) -> DataPoint {
    let Some(previous) = previous else {
        return generate_seed(category, rng, now);
    };

    let (volume_lo, volume_hi) = volume_band(category);
    let change = rng.gen_range(-TICK_CHANGE_PCT..TICK_CHANGE_PCT);
    let floor = previous
        .label
        .checked_add_signed(Duration::milliseconds(1))
        .unwrap_or(previous.label);

    DataPoint {
        label: now.max(floor),
        value: previous.value * (1.0 + change / 100.0),
        volume: rng.gen_range(volume_lo..volume_hi),
        change,
        volatility: rng.gen_range(0.0..MAX_VOLATILITY),
        trend: Trend::from_change(change),
        short_moving_average: None,
        long_moving_average: None,
    }
}
