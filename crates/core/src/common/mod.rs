use crate::market::error::MarketError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

pub mod time;

/// # Summary
/// 市场品种枚举，代表门户展示的能源交易细分市场。
///
/// # Invariants
/// - 封闭枚举：每条序列只属于一个品种。
/// - 文本标识为 kebab-case，解析时大小写不敏感。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    // 原油
    CrudeOil,
    // 天然气
    NaturalGas,
    // 电力
    Electricity,
    // 可再生能源证书
    Renewables,
    // 煤炭
    Coal,
    // 碳排放配额
    Carbon,
}

impl Category {
    /// 全部品种，按展示顺序排列
    pub fn all() -> &'static [Category] {
        &[
            Category::CrudeOil,
            Category::NaturalGas,
            Category::Electricity,
            Category::Renewables,
            Category::Coal,
            Category::Carbon,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CrudeOil => "crude-oil",
            Category::NaturalGas => "natural-gas",
            Category::Electricity => "electricity",
            Category::Renewables => "renewables",
            Category::Coal => "coal",
            Category::Carbon => "carbon",
        }
    }
}

impl FromStr for Category {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crude-oil" => Ok(Category::CrudeOil),
            "natural-gas" => Ok(Category::NaturalGas),
            "electricity" => Ok(Category::Electricity),
            "renewables" => Ok(Category::Renewables),
            "coal" => Ok(Category::Coal),
            "carbon" => Ok(Category::Carbon),
            _ => Err(MarketError::InvalidCategory(s.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// # Summary
/// 请求的时间范围，决定序列的跨度与采样粒度。
///
/// # Invariants
/// - 文本标识固定为 `1D`/`1W`/`1M`/`3M`/`1Y`/`ALL`，不存在静默默认值。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum TimeRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "ALL")]
    All,
}

impl TimeRange {
    pub fn all() -> &'static [TimeRange] {
        &[
            TimeRange::OneDay,
            TimeRange::OneWeek,
            TimeRange::OneMonth,
            TimeRange::ThreeMonths,
            TimeRange::OneYear,
            TimeRange::All,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::OneYear => "1Y",
            TimeRange::All => "ALL",
        }
    }
}

impl FromStr for TimeRange {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(TimeRange::OneDay),
            "1W" => Ok(TimeRange::OneWeek),
            "1M" => Ok(TimeRange::OneMonth),
            "3M" => Ok(TimeRange::ThreeMonths),
            "1Y" => Ok(TimeRange::OneYear),
            "ALL" => Ok(TimeRange::All),
            _ => Err(MarketError::UnknownTimeRange(s.to_string())),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tokens() {
        for c in Category::all() {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), *c);
        }
        assert_eq!("Crude-Oil".parse::<Category>().unwrap(), Category::CrudeOil);
        assert!(matches!(
            "uranium".parse::<Category>(),
            Err(MarketError::InvalidCategory(token)) if token == "uranium"
        ));
    }

    #[test]
    fn test_time_range_tokens() {
        assert_eq!("1d".parse::<TimeRange>().unwrap(), TimeRange::OneDay);
        assert_eq!("all".parse::<TimeRange>().unwrap(), TimeRange::All);
        assert!(matches!(
            "2Y".parse::<TimeRange>(),
            Err(MarketError::UnknownTimeRange(_))
        ));
    }

    #[test]
    fn test_serde_tokens_match_display() {
        let json = serde_json::to_string(&TimeRange::ThreeMonths).unwrap();
        assert_eq!(json, "\"3M\"");
        let json = serde_json::to_string(&Category::NaturalGas).unwrap();
        assert_eq!(json, "\"natural-gas\"");
    }
}
