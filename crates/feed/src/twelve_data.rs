use async_trait::async_trait;
use bolsa_core::common::Ticker;
use bolsa_core::market::entity::Series;
use bolsa_core::market::error::MarketError;
use bolsa_core::market::port::DataProvider;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::http::{build_client, get_bytes};
use crate::normalize::{RawBar, coerce, normalize, parse_date};

const SERIES_URL: &str = "https://api.twelvedata.com/time_series";

/// # Summary
/// Twelve Data `time_series` 提供者。
///
/// # Invariants
/// - 未配置 API Key 时不发起任何请求。
pub struct TwelveDataProvider {
    client: Client,
    api_key: Option<String>,
}

impl TwelveDataProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, MarketError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

/// 响应体：成功时带 `values`，失败时 `status = "error"` 并附 `message`
#[derive(Deserialize, Debug)]
struct TwelveResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    values: Option<Vec<TwelveValue>>,
}

/// 单条 K 线，数值字段为字符串
#[derive(Deserialize, Debug)]
struct TwelveValue {
    datetime: String,
    #[serde(default)]
    open: Value,
    #[serde(default)]
    high: Value,
    #[serde(default)]
    low: Value,
    #[serde(default)]
    close: Value,
    #[serde(default)]
    volume: Value,
}

/// # Summary
/// 解析 Twelve Data 日线响应体。
///
/// # Logic
/// 1. `status = "error"` 或缺少 `values` 时视为数据不可用。
/// 2. `values` 为新→旧排列的数组，逐条强制转换数值。
pub fn parse_time_series(symbol: &str, body: &[u8]) -> Result<Vec<RawBar>, MarketError> {
    let json: TwelveResponse = serde_json::from_slice(body)
        .map_err(|e| MarketError::unavailable(symbol, format!("malformed payload: {}", e)))?;

    if json.status.as_deref() == Some("error") {
        let msg = json.message.unwrap_or_else(|| "unknown error".to_string());
        return Err(MarketError::unavailable(symbol, msg));
    }

    let values = json
        .values
        .ok_or_else(|| MarketError::unavailable(symbol, "missing 'values'"))?;

    Ok(values
        .iter()
        .filter_map(|v| {
            let Some(date) = parse_date(&v.datetime) else {
                debug!("Skipping unparsable datetime '{}' for {}", v.datetime, symbol);
                return None;
            };
            Some(RawBar {
                date,
                open: coerce(&v.open),
                high: coerce(&v.high),
                low: coerce(&v.low),
                close: coerce(&v.close),
                volume: coerce(&v.volume),
            })
        })
        .collect())
}

#[async_trait]
impl DataProvider for TwelveDataProvider {
    fn name(&self) -> &str {
        "twelve_data"
    }

    async fn fetch_daily(&self, ticker: &Ticker, lookback: usize) -> Result<Series, MarketError> {
        let symbol = ticker.symbol.as_str();
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(MarketError::unavailable(symbol, "Twelve Data API key not configured"));
        };

        let size = lookback.to_string();
        let body = get_bytes(
            &self.client,
            SERIES_URL,
            &[
                ("symbol", symbol),
                ("interval", "1day"),
                ("outputsize", size.as_str()),
                ("apikey", api_key),
            ],
            symbol,
        )
        .await?;

        let raw = parse_time_series(symbol, &body)?;
        normalize(symbol, raw, lookback)
    }
}
