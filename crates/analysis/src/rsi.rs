use bolsa_core::analysis::entity::AnalyzedSeries;

use crate::engine::IndicatorStage;
use crate::ewm::{alpha_from_com, ema_weighted};

/// # Summary
/// RSI 阶段：对涨幅与跌幅分别做质心为 `window − 1` 的指数加权平均。
///
/// # Invariants
/// - 结果始终落在 [0, 100]。
/// - 平均跌幅为 0 时: 平均涨幅 > 0 记为 100，两者皆 0 记为 50。
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    pub window: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { window: 14 }
    }
}

/// # Summary
/// 拆分逐日涨跌幅。
///
/// # Logic
/// 1. 首行及相邻收盘价缺失的行没有涨跌值，涨跌均记 0。
/// 2. 正变动计入涨幅，负变动的绝对值计入跌幅。
///
/// # Returns
/// (gains, losses)，长度与输入相同。
pub fn gains_and_losses(closes: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        let delta = match (i.checked_sub(1).and_then(|p| closes[p]), closes[i]) {
            (Some(prev), Some(cur)) => cur - prev,
            _ => 0.0,
        };
        gains.push(if delta > 0.0 { delta } else { 0.0 });
        losses.push(if delta < 0.0 { -delta } else { 0.0 });
    }
    (gains, losses)
}

/// 由平均涨跌幅换算 RSI，非有限结果返回 None
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };
    rsi.is_finite().then_some(rsi)
}

impl IndicatorStage for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn warmup(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn apply(&self, series: &mut AnalyzedSeries) {
        if self.window == 0 {
            return;
        }
        let (gains, losses) = gains_and_losses(&series.closes());
        let alpha = alpha_from_com(self.window - 1);
        let avg_gain = ema_weighted(&gains, alpha, self.window);
        let avg_loss = ema_weighted(&losses, alpha, self.window);

        for (row, (g, l)) in series
            .rows
            .iter_mut()
            .zip(avg_gain.into_iter().zip(avg_loss))
        {
            row.indicators.rsi = match (g, l) {
                (Some(g), Some(l)) => rsi_from_averages(g, l),
                _ => None,
            };
        }
    }
}
