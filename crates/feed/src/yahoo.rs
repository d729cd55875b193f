use async_trait::async_trait;
use bolsa_core::common::Ticker;
use bolsa_core::market::entity::Series;
use bolsa_core::market::error::MarketError;
use bolsa_core::market::port::DataProvider;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::http::{build_client, get_bytes};
use crate::normalize::{RawBar, coerce_num, normalize};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// # Summary
/// Yahoo Finance 日线提供者实现，无需 API Key。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯。
#[derive(Clone)]
pub struct YahooProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
}

impl YahooProvider {
    /// # Summary
    /// 创建一个新的 YahooProvider 实例。
    ///
    /// # Arguments
    /// * `timeout`: 单次请求超时。
    ///
    /// # Returns
    /// 返回初始化后的 YahooProvider，HTTP 客户端构建失败时返回错误。
    pub fn new(timeout: Duration) -> Result<Self, MarketError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }
}

/// # Summary
/// Yahoo API 响应顶层结构。
///
/// # Invariants
/// - 映射自 Yahoo v8 chart 接口。
#[derive(Deserialize, Debug)]
struct YahooResponse {
    chart: YahooChart,
}

/// Yahoo API 图表数据部分
#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

/// Yahoo API 错误详情
#[derive(Deserialize, Debug)]
struct YahooError {
    description: String,
}

/// Yahoo API 单个时间序列结果
#[derive(Deserialize, Debug)]
struct YahooResult {
    meta: Option<YahooMeta>,
    // 无成交的标的可能缺少该字段
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

/// 交易所元信息，仅使用时区偏移
#[derive(Deserialize, Debug)]
struct YahooMeta {
    #[serde(default)]
    gmtoffset: i64,
}

/// Yahoo API 指标容器
#[derive(Deserialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

/// # Summary
/// Yahoo API 原始报价数据，按列平行存放，缺失值为 null。
#[derive(Deserialize, Debug)]
struct YahooQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// 回溯长度映射为 Yahoo 的 range 参数 (按交易日估算)
pub fn range_for(lookback: usize) -> &'static str {
    match lookback {
        0..=20 => "1mo",
        21..=60 => "3mo",
        61..=120 => "6mo",
        121..=250 => "1y",
        _ => "2y",
    }
}

/// # Summary
/// 解析 Yahoo chart 响应体。
///
/// # Logic
/// 1. 反序列化嵌套 JSON，`chart.error` 或空结果视为数据不可用。
/// 2. 时间戳加上交易所 `gmtoffset` 后取日期，得到交易所本地交易日。
/// 3. 按索引对齐平行数组，null 保留为缺失标记。
///
/// # Arguments
/// * `symbol`: 交易代码。
/// * `body`: 原始响应体。
///
/// # Returns
/// 成功返回未排序的 K 线列表。
pub fn parse_chart(symbol: &str, body: &[u8]) -> Result<Vec<RawBar>, MarketError> {
    let json: YahooResponse = serde_json::from_slice(body)
        .map_err(|e| MarketError::unavailable(symbol, format!("malformed chart payload: {}", e)))?;

    if let Some(err) = json.chart.error {
        return Err(MarketError::unavailable(symbol, err.description));
    }

    let result = json
        .chart
        .result
        .and_then(|mut r| r.pop())
        .ok_or_else(|| MarketError::unavailable(symbol, "chart.result is empty"))?;

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| MarketError::unavailable(symbol, "no quote data"))?;
    let offset = result.meta.map(|m| m.gmtoffset).unwrap_or(0);
    let at = |col: &[Option<f64>], i: usize| coerce_num(col.get(i).copied().flatten());

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(time) = ts
            .checked_add(offset)
            .and_then(|local| DateTime::from_timestamp(local, 0))
        else {
            debug!("Skipping out-of-range timestamp {} for {}", ts, symbol);
            continue;
        };
        bars.push(RawBar {
            date: time.date_naive(),
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close: at(&quote.close, i),
            volume: at(&quote.volume, i),
        });
    }

    Ok(bars)
}

#[async_trait]
impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    /// # Summary
    /// 从 Yahoo Finance 抓取日线历史数据。
    ///
    /// # Logic
    /// 1. 根据回溯长度选择 range，interval 固定为 1d。
    /// 2. 发起异步请求并解析嵌套的 JSON 数据。
    /// 3. 规范化为升序 Series。
    async fn fetch_daily(&self, ticker: &Ticker, lookback: usize) -> Result<Series, MarketError> {
        let symbol = ticker.symbol.as_str();
        let url = format!("{}/{}", CHART_URL, symbol);
        let body = get_bytes(
            &self.client,
            &url,
            &[("range", range_for(lookback)), ("interval", "1d")],
            symbol,
        )
        .await?;

        let raw = parse_chart(symbol, &body)?;
        normalize(symbol, raw, lookback)
    }
}
