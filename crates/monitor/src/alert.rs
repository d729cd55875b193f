use bolsa_core::analysis::entity::Signal;
use bolsa_core::common::Ticker;
use bolsa_core::common::time::DedupPeriod;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// # Summary
/// 告警去重闸门，保证同一标的在同一周期内最多通知一次。
///
/// # Invariants
/// - 由 Monitor 独占持有，通过 `&mut self` 修改，无需加锁。
/// - `sent` 只记录当前周期桶内已放行的标的，桶切换时整体清空。
#[derive(Debug, Clone)]
pub struct AlertGate {
    period: DedupPeriod,
    sent: HashSet<String>,
    bucket: Option<String>,
}

impl AlertGate {
    pub fn new(period: DedupPeriod) -> Self {
        Self {
            period,
            sent: HashSet::new(),
            bucket: None,
        }
    }

    pub fn period(&self) -> DedupPeriod {
        self.period
    }

    /// # Summary
    /// 判断是否放行一次告警。
    ///
    /// # Logic
    /// 1. 计算 `now` 所属周期桶，与上次不同则清空已发送集合。
    /// 2. 标的首次出现在本桶内时记录并放行，否则拦截。
    ///
    /// # Arguments
    /// * `symbol`: 交易代码。
    /// * `now`: 当前时刻。
    ///
    /// # Returns
    /// 本周期内第一次调用返回 true，其余返回 false。
    pub fn should_send(&mut self, symbol: &str, now: DateTime<Utc>) -> bool {
        let bucket = self.period.bucket(now);
        if self.bucket.as_deref() != Some(bucket.as_str()) {
            self.sent.clear();
            self.bucket = Some(bucket);
        }
        self.sent.insert(symbol.to_string())
    }
}

/// 告警正文
pub fn format_alert(ticker: &Ticker, signal: &Signal) -> String {
    format!(
        "⚠️ ALERT: {} ({}) moved {:+.2}% · price {:.2}",
        ticker.name, ticker.symbol, signal.percent_change, signal.price
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, h, m, 0).unwrap()
    }

    #[test]
    fn test_once_per_day() {
        let mut gate = AlertGate::new(DedupPeriod::Day);
        assert!(gate.should_send("AAPL", at(14, 0)));
        assert!(!gate.should_send("AAPL", at(20, 59)));
        assert!(gate.should_send("MSFT", at(20, 59)));

        let next_day = Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 1).unwrap();
        assert!(gate.should_send("AAPL", next_day));
    }

    #[test]
    fn test_hour_period_rolls() {
        let mut gate = AlertGate::new(DedupPeriod::Hour);
        assert!(gate.should_send("KO", at(14, 5)));
        assert!(!gate.should_send("KO", at(14, 55)));
        assert!(gate.should_send("KO", at(15, 0)));
    }

    #[test]
    fn test_format_alert() {
        let ticker = Ticker::new("Apple", "AAPL");
        let signal = Signal {
            symbol: "AAPL".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            price: 194.5,
            previous_close: 188.2,
            percent_change: -3.1,
            alert: true,
            volume: None,
            rsi: None,
            rsi_tag: None,
            macd_cross: None,
        };
        assert_eq!(
            format_alert(&ticker, &signal),
            "⚠️ ALERT: Apple (AAPL) moved -3.10% · price 194.50"
        );
    }
}
