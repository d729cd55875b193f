use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::market::entity::{Bar, Series};

/// # Summary
/// 附着在单根 K 线上的技术指标列。
///
/// # Invariants
/// - 所有字段均为其所在行之前 (含) 序列前缀的纯函数。
/// - 预热期内或输入缺失时为 `None`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    // 布林中轨 (简单移动平均)
    pub sma: Option<f64>,
    // 窗口样本标准差
    pub std_dev: Option<f64>,
    // 布林上轨
    pub upper: Option<f64>,
    // 布林下轨
    pub lower: Option<f64>,
    // 相对强弱指数
    pub rsi: Option<f64>,
    // MACD 快线 EMA
    pub ema_fast: Option<f64>,
    // MACD 慢线 EMA
    pub ema_slow: Option<f64>,
    // MACD 值 (快线 - 慢线)
    pub macd: Option<f64>,
    // 信号线
    pub signal: Option<f64>,
    // 柱状图 (MACD - 信号线)
    pub histogram: Option<f64>,
}

/// # Summary
/// K 线与其指标列组成的一行。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedRow {
    #[serde(flatten)]
    pub bar: Bar,
    #[serde(flatten)]
    pub indicators: IndicatorRow,
}

/// # Summary
/// 已追加指标列的序列。
///
/// # Invariants
/// - 行数与来源 Series 相同，原始 K 线字段保持不变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedSeries {
    pub symbol: String,
    pub rows: Vec<AnalyzedRow>,
}

impl AnalyzedSeries {
    /// 收盘价列，缺失值保持为 `None`
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.bar.close).collect()
    }

    /// 最近 `n` 行，用于图表窗口
    pub fn tail(&self, n: usize) -> &[AnalyzedRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }
}

impl From<Series> for AnalyzedSeries {
    fn from(series: Series) -> Self {
        let symbol = series.symbol().to_string();
        let rows = series
            .into_bars()
            .into_iter()
            .map(|bar| AnalyzedRow {
                bar,
                indicators: IndicatorRow::default(),
            })
            .collect();
        Self { symbol, rows }
    }
}

/// # Summary
/// RSI 极值标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiTag {
    Overbought,
    Oversold,
}

/// # Summary
/// MACD 柱状图穿越零轴的方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdCross {
    #[serde(rename = "bullish cross")]
    Bullish,
    #[serde(rename = "bearish cross")]
    Bearish,
}

impl std::fmt::Display for RsiTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RsiTag::Overbought => write!(f, "overbought"),
            RsiTag::Oversold => write!(f, "oversold"),
        }
    }
}

impl std::fmt::Display for MacdCross {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MacdCross::Bullish => write!(f, "bullish cross"),
            MacdCross::Bearish => write!(f, "bearish cross"),
        }
    }
}

/// # Summary
/// 单个标的在最新 K 线上的信号快照。
///
/// # Invariants
/// - 每轮刷新重新计算，不持久化。
/// - `alert` 仅由 `percent_change` 与配置阈值决定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    // 最新 K 线日期
    pub date: NaiveDate,
    // 最新收盘价
    pub price: f64,
    // 前一有效交易日收盘价
    pub previous_close: f64,
    // 相对前收盘的涨跌幅 (百分比)
    pub percent_change: f64,
    // 是否触发波动告警
    pub alert: bool,
    // 最新成交量
    pub volume: Option<f64>,
    // 最新 RSI 值
    pub rsi: Option<f64>,
    pub rsi_tag: Option<RsiTag>,
    pub macd_cross: Option<MacdCross>,
}
