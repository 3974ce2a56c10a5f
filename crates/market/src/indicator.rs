//! 技术指标计算：均线、趋势、波动率。全部为无副作用的纯函数。

use gridpulse_core::market::entity::{DataPoint, Trend};

/// 相对参考值的百分比变化；参考值为 0 时返回 0，保证结果不会是 NaN。
pub fn percent_change(reference: f64, value: f64) -> f64 {
    if reference == 0.0 {
        return 0.0;
    }
    let pct = (value - reference) / reference * 100.0;
    if pct.is_finite() { pct } else { 0.0 }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0.0), |(sum, count), v| (sum + v, count + 1.0));
    if count > 0.0 { Some(sum / count) } else { None }
}

/// # Summary
/// 简单移动平均。
///
/// # Logic
/// 1. 输出长度与输入一致。
/// 2. 前 `period - 1` 个位置为 `None`（历史不足，不是错误）。
/// 3. `period` 为 0 或大于序列长度时全部为 `None`。
pub fn moving_average(points: &[DataPoint], period: usize) -> Vec<Option<f64>> {
    if period == 0 || period > points.len() {
        return vec![None; points.len()];
    }
    let mut out = vec![None; period - 1];
    out.extend(
        points
            .windows(period)
            .map(|window| mean(window.iter().map(|p| p.value))),
    );
    out
}

/// 取 `values` 末尾 `period` 个值的均值，数量不足时返回 `None`
pub fn trailing_mean(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    mean(values[values.len() - period..].iter().copied())
}

/// # Summary
/// 比较首尾两点判定整体趋势。
///
/// # Logic
/// 1. 少于 2 个点返回 `Stable`。
/// 2. 涨跌幅绝对值小于 0.1% 为 `Stable`，否则按符号判定。
pub fn trend_of(points: &[DataPoint]) -> Trend {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => {
            Trend::from_change(percent_change(first.value, last.value))
        }
        _ => Trend::Stable,
    }
}

/// # Summary
/// 相邻点相对变化绝对值的均值。
///
/// # Logic
/// 1. 少于 2 个点返回 0。
/// 2. 前值为 0 的相邻对按 0 计入。
pub fn volatility_of(points: &[DataPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    mean(points.windows(2).map(|pair| {
        let (prev, next) = (pair[0].value, pair[1].value);
        if prev == 0.0 {
            0.0
        } else {
            ((next - prev) / prev).abs()
        }
    }))
    .filter(|v| v.is_finite())
    .unwrap_or(0.0)
}

/// 将长短均线写入每个数据点
pub fn annotate(points: &mut [DataPoint], short_period: usize, long_period: usize) {
    let short = moving_average(points, short_period);
    let long = moving_average(points, long_period);
    for ((point, short), long) in points.iter_mut().zip(short).zip(long) {
        point.short_moving_average = short;
        point.long_moving_average = long;
    }
}
