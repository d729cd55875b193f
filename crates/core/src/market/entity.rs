use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::market::error::MarketError;

/// 下游指标所需的最少有效 K 线数量 (MACD 慢线跨度)。
pub const MIN_SERIES_LEN: usize = 26;

/// # Summary
/// 单个交易日的 K 线数据。
///
/// # Invariants
/// - 数值字段为 `None` 表示数据源给出的值无法解析 (显式缺失标记)。
/// - 存在时价格与成交量均非负且有限。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    // 交易日
    pub date: NaiveDate,
    // 开盘价
    pub open: Option<f64>,
    // 最高价
    pub high: Option<f64>,
    // 最低价
    pub low: Option<f64>,
    // 收盘价
    pub close: Option<f64>,
    // 成交量 (整数值，以 f64 承载)
    pub volume: Option<f64>,
}

/// # Summary
/// 单个标的按日期升序排列的 K 线序列。
///
/// # Invariants
/// - 日期严格递增且唯一。
/// - 只能通过 `Series::new` 构造，构造时校验排序。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    /// # Summary
    /// 从已排序的 K 线列表构造序列。
    ///
    /// # Logic
    /// 1. 逐对检查相邻日期，发现非严格递增即拒绝。
    ///
    /// # Arguments
    /// * `symbol`: 交易代码。
    /// * `bars`: 已按日期升序排列的 K 线。
    ///
    /// # Returns
    /// 成功返回 Series，日期乱序或重复返回 `MarketError::DataUnavailable`。
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, MarketError> {
        let symbol = symbol.into();
        if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(MarketError::unavailable(
                &symbol,
                format!("dates not strictly increasing at {}", pair[1].date),
            ));
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 收盘价列，缺失值保持为 `None`
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// 带收盘价的 K 线数量
    pub fn usable_len(&self) -> usize {
        self.bars.iter().filter(|b| b.close.is_some()).count()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}
