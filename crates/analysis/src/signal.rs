use bolsa_core::analysis::entity::{AnalyzedRow, AnalyzedSeries, MacdCross, RsiTag, Signal};
use bolsa_core::analysis::error::SignalError;

/// # Summary
/// 信号推导器：从最后两行可用数据得出涨跌幅、告警与定性标签。
///
/// # Invariants
/// - 可用行 = 有收盘价且布林中轨已定义的行。
/// - 涨跌幅以最新收盘价对比前一可用行收盘价。
#[derive(Debug, Clone, Copy)]
pub struct SignalDeriver {
    pub threshold: f64,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
}

impl Default for SignalDeriver {
    fn default() -> Self {
        Self::new(2.5)
    }
}

/// 涨跌幅 (百分比)，前收盘为 0 时定义为 0
pub fn percent_change(previous: f64, latest: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (latest - previous) / previous * 100.0
}

/// 告警判定: |涨跌幅| >= 阈值 (含边界)
pub fn is_alert(percent_change: f64, threshold: f64) -> bool {
    percent_change.abs() >= threshold
}

/// # Summary
/// 判断柱状图是否穿越零轴。
///
/// # Logic
/// 1. 前值 < 0 且现值 > 0 => 金叉。
/// 2. 前值 > 0 且现值 < 0 => 死叉。
/// 3. 前值恰为 0 时不判定任何方向。
pub fn macd_cross(previous: f64, current: f64) -> Option<MacdCross> {
    if previous < 0.0 && current > 0.0 {
        Some(MacdCross::Bullish)
    } else if previous > 0.0 && current < 0.0 {
        Some(MacdCross::Bearish)
    } else {
        None
    }
}

impl SignalDeriver {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
        }
    }

    pub fn rsi_tag(&self, rsi: f64) -> Option<RsiTag> {
        if rsi > self.rsi_overbought {
            Some(RsiTag::Overbought)
        } else if rsi < self.rsi_oversold {
            Some(RsiTag::Oversold)
        } else {
            None
        }
    }

    /// # Summary
    /// 推导最新一根 K 线的信号快照。
    ///
    /// # Logic
    /// 1. 过滤出可用行，不足两行返回 `InsufficientHistory`。
    /// 2. 取最后两行计算涨跌幅与告警。
    /// 3. 由最新 RSI 得出极值标签，由两行柱状图得出穿越标签。
    ///
    /// # Arguments
    /// * `series`: 已追加指标列的序列。
    ///
    /// # Returns
    /// 成功返回 Signal。
    pub fn derive(&self, series: &AnalyzedSeries) -> Result<Signal, SignalError> {
        let usable: Vec<(&AnalyzedRow, f64)> = series
            .rows
            .iter()
            .filter(|r| r.indicators.sma.is_some())
            .filter_map(|r| r.bar.close.map(|c| (r, c)))
            .collect();

        let [.., (prev, prev_close), (latest, price)] = usable.as_slice() else {
            return Err(SignalError::InsufficientHistory {
                symbol: series.symbol.clone(),
                usable: usable.len(),
            });
        };

        let change = percent_change(*prev_close, *price);
        let rsi = latest.indicators.rsi;
        let cross = match (prev.indicators.histogram, latest.indicators.histogram) {
            (Some(p), Some(c)) => macd_cross(p, c),
            _ => None,
        };

        Ok(Signal {
            symbol: series.symbol.clone(),
            date: latest.bar.date,
            price: *price,
            previous_close: *prev_close,
            percent_change: change,
            alert: is_alert(change, self.threshold),
            volume: latest.bar.volume,
            rsi,
            rsi_tag: rsi.and_then(|v| self.rsi_tag(v)),
            macd_cross: cross,
        })
    }
}
