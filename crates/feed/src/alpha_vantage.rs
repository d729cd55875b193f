use async_trait::async_trait;
use bolsa_core::common::Ticker;
use bolsa_core::market::entity::Series;
use bolsa_core::market::error::MarketError;
use bolsa_core::market::port::DataProvider;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

use crate::http::{build_client, get_bytes};
use crate::normalize::{RawBar, coerce, normalize, parse_date};

const QUERY_URL: &str = "https://www.alphavantage.co/query";
const SERIES_KEY: &str = "Time Series (Daily)";
// 限频、密钥无效等情况下数据源以 200 返回这些字段
const NOTICE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

/// # Summary
/// Alpha Vantage `TIME_SERIES_DAILY_ADJUSTED` 提供者。
///
/// # Invariants
/// - 未配置 API Key 时不发起任何请求，所有标的均返回数据不可用。
/// - 免费额度约每分钟 5 次，调用方需配置足够的请求间隔。
pub struct AlphaVantageProvider {
    client: Client,
    api_key: Option<String>,
}

impl AlphaVantageProvider {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, MarketError> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

/// `compact` 最多返回 100 根，超出则请求完整历史
pub fn output_size_for(lookback: usize) -> &'static str {
    if lookback <= 100 { "compact" } else { "full" }
}

/// 去掉 `"1. open"` 形式的序号前缀
fn field_name(key: &str) -> &str {
    key.split_once(". ").map(|(_, name)| name).unwrap_or(key)
}

fn parse_fields(date: chrono::NaiveDate, fields: &Map<String, Value>) -> RawBar {
    let mut bar = RawBar {
        date,
        open: None,
        high: None,
        low: None,
        close: None,
        volume: None,
    };
    for (key, value) in fields {
        match field_name(key) {
            "open" => bar.open = coerce(value),
            "high" => bar.high = coerce(value),
            "low" => bar.low = coerce(value),
            "close" => bar.close = coerce(value),
            "volume" => bar.volume = coerce(value),
            _ => {}
        }
    }
    bar
}

/// # Summary
/// 解析 Alpha Vantage 日线响应体。
///
/// # Logic
/// 1. 响应中出现错误或限频提示字段时视为数据不可用。
/// 2. 缺少 `Time Series (Daily)` 顶层键时视为数据不可用。
/// 3. 以日期为键逐条解析，字段值为字符串，统一强制转换为数值。
///
/// # Arguments
/// * `symbol`: 交易代码。
/// * `body`: 原始响应体。
///
/// # Returns
/// 成功返回未排序的 K 线列表 (数据源为新→旧)。
pub fn parse_daily(symbol: &str, body: &[u8]) -> Result<Vec<RawBar>, MarketError> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| MarketError::unavailable(symbol, format!("malformed payload: {}", e)))?;

    for key in NOTICE_KEYS {
        if let Some(msg) = json.get(key).and_then(Value::as_str) {
            return Err(MarketError::unavailable(symbol, format!("{}: {}", key, msg)));
        }
    }

    let series = json
        .get(SERIES_KEY)
        .and_then(Value::as_object)
        .ok_or_else(|| MarketError::unavailable(symbol, format!("missing '{}'", SERIES_KEY)))?;

    let mut bars = Vec::with_capacity(series.len());
    for (date_text, fields) in series {
        let (Some(date), Some(fields)) = (parse_date(date_text), fields.as_object()) else {
            debug!("Skipping unparsable entry '{}' for {}", date_text, symbol);
            continue;
        };
        bars.push(parse_fields(date, fields));
    }
    Ok(bars)
}

#[async_trait]
impl DataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    async fn fetch_daily(&self, ticker: &Ticker, lookback: usize) -> Result<Series, MarketError> {
        let symbol = ticker.symbol.as_str();
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(MarketError::unavailable(symbol, "Alpha Vantage API key not configured"));
        };

        let body = get_bytes(
            &self.client,
            QUERY_URL,
            &[
                ("function", "TIME_SERIES_DAILY_ADJUSTED"),
                ("symbol", symbol),
                ("outputsize", output_size_for(lookback)),
                ("apikey", api_key),
            ],
            symbol,
        )
        .await?;

        let raw = parse_daily(symbol, &body)?;
        normalize(symbol, raw, lookback)
    }
}
