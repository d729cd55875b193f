use bolsa_core::analysis::entity::AnalyzedSeries;

use crate::engine::IndicatorStage;
use crate::ewm::{alpha_from_span, ema_recursive};

/// # Summary
/// MACD 阶段：快慢两条递推 EMA 之差，及其信号线与柱状图。
///
/// # Invariants
/// - EMA 从首个观测值起递推，但本阶段所有列仅从第 `slow − 1` 行开始输出。
/// - 柱状图严格等于同一行的 MACD − 信号线。
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

impl IndicatorStage for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn warmup(&self) -> usize {
        self.slow.saturating_sub(1)
    }

    fn apply(&self, series: &mut AnalyzedSeries) {
        let closes = series.closes();
        let fast = ema_recursive(&closes, alpha_from_span(self.fast));
        let slow = ema_recursive(&closes, alpha_from_span(self.slow));

        let macd: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = ema_recursive(&macd, alpha_from_span(self.signal));

        let warmup = self.warmup();
        for (i, row) in series.rows.iter_mut().enumerate().skip(warmup) {
            let ind = &mut row.indicators;
            ind.ema_fast = fast[i];
            ind.ema_slow = slow[i];
            ind.macd = macd[i];
            ind.signal = signal[i];
            ind.histogram = match (macd[i], signal[i]) {
                (Some(m), Some(s)) => Some(m - s),
                _ => None,
            };
        }
    }
}
