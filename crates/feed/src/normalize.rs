use bolsa_core::market::entity::{Bar, MIN_SERIES_LEN, Series};
use bolsa_core::market::error::MarketError;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

/// # Summary
/// 适配器解析出的未排序 K 线，字段已完成数值强制转换。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl From<RawBar> for Bar {
    fn from(raw: RawBar) -> Self {
        Bar {
            date: raw.date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        }
    }
}

/// # Summary
/// 将 JSON 数值或数值字符串强制转换为 f64。
///
/// # Logic
/// 1. 数字直接取值，字符串去空白后解析。
/// 2. 无法解析、非有限或为负数时返回 None (显式缺失)。
pub fn coerce(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}

/// `coerce` 的 Option<f64> 版本，供已强类型反序列化的数据源使用
pub fn coerce_num(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

/// 解析 `YYYY-MM-DD` 开头的日期字符串 (忽略其后的时间部分)
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// # Summary
/// 将任意顺序的原始 K 线规范化为 Series。
///
/// # Logic
/// 1. 按日期稳定排序 (兼容新→旧与旧→新两种顺序)。
/// 2. 同一日期出现多次时，以数据源顺序中最后出现的一条为准。
/// 3. 仅保留最近 `lookback` 根。
/// 4. 有收盘价的 K 线少于 `MIN_SERIES_LEN` 时视为数据不可用。
///
/// # Arguments
/// * `symbol`: 交易代码。
/// * `raw`: 适配器解析出的 K 线。
/// * `lookback`: 最多保留的 K 线数量。
///
/// # Returns
/// 成功返回 Series，否则返回 `MarketError::DataUnavailable`。
pub fn normalize(
    symbol: &str,
    mut raw: Vec<RawBar>,
    lookback: usize,
) -> Result<Series, MarketError> {
    raw.sort_by_key(|b| b.date);

    let mut bars: Vec<Bar> = Vec::with_capacity(raw.len());
    for item in raw {
        match bars.last_mut() {
            Some(last) if last.date == item.date => *last = item.into(),
            _ => bars.push(item.into()),
        }
    }

    if bars.len() > lookback {
        bars.drain(..bars.len() - lookback);
    }

    let series = Series::new(symbol, bars)?;
    let usable = series.usable_len();
    if usable < MIN_SERIES_LEN {
        return Err(MarketError::unavailable(
            symbol,
            format!("only {} bars with a close, need {}", usable, MIN_SERIES_LEN),
        ));
    }
    debug!("Normalized {} bars for {}", series.len(), symbol);
    Ok(series)
}
