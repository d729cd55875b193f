use bolsa_core::analysis::entity::AnalyzedSeries;

use crate::count_f64;
use crate::engine::IndicatorStage;

/// # Summary
/// 布林带阶段：中轨为简单移动平均，上下轨为中轨 ± k 倍样本标准差。
///
/// # Invariants
/// - `window >= 2`，否则样本标准差无定义，该阶段不产生任何值。
/// - 窗口内任一收盘价缺失时该行为 `None`。
#[derive(Debug, Clone, Copy)]
pub struct Bollinger {
    pub window: usize,
    pub num_std: f64,
}

impl Default for Bollinger {
    fn default() -> Self {
        Self {
            window: 20,
            num_std: 2.0,
        }
    }
}

/// 单个窗口的计算结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub sma: f64,
    pub std_dev: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Bollinger {
    /// # Summary
    /// 计算一个完整窗口的布林带。
    ///
    /// # Logic
    /// 1. 均值 = 窗口和 / n。
    /// 2. 样本方差 = Σ(x − 均值)² / (n − 1)。
    /// 3. 上下轨 = 均值 ± num_std·标准差。
    ///
    /// # Returns
    /// 窗口长度不足 2 或结果非有限时返回 None。
    pub fn band(&self, window: &[f64]) -> Option<Band> {
        if window.len() < 2 {
            return None;
        }
        let n = count_f64(window.len());
        let sma = window.iter().sum::<f64>() / n;
        let variance = window.iter().map(|x| (x - sma).powi(2)).sum::<f64>() / (n - 1.0);
        let std_dev = variance.sqrt();
        let band = Band {
            sma,
            std_dev,
            upper: sma + self.num_std * std_dev,
            lower: sma - self.num_std * std_dev,
        };
        (band.upper.is_finite() && band.lower.is_finite()).then_some(band)
    }
}

impl IndicatorStage for Bollinger {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn warmup(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn apply(&self, series: &mut AnalyzedSeries) {
        if self.window < 2 {
            return;
        }
        let closes = series.closes();
        for end in self.warmup()..closes.len() {
            let slice = &closes[end + 1 - self.window..=end];
            let window: Option<Vec<f64>> = slice.iter().copied().collect();
            let Some(band) = window.and_then(|w| self.band(&w)) else {
                continue;
            };
            let row = &mut series.rows[end].indicators;
            row.sma = Some(band.sma);
            row.std_dev = Some(band.std_dev);
            row.upper = Some(band.upper);
            row.lower = Some(band.lower);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_uses_sample_std() {
        // 样本方差: ((1-2.5)² + (2-2.5)² + (3-2.5)² + (4-2.5)²) / 3 = 5/3
        let band = Bollinger::default().band(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((band.sma - 2.5).abs() < 1e-12);
        assert!((band.std_dev - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((band.upper - (2.5 + 2.0 * band.std_dev)).abs() < 1e-12);
    }

    #[test]
    fn band_flat_window_collapses() {
        let band = Bollinger::default().band(&[7.0; 20]).unwrap();
        assert_eq!(band.std_dev, 0.0);
        assert_eq!(band.upper, 7.0);
        assert_eq!(band.lower, 7.0);
    }

    #[test]
    fn band_too_short() {
        assert!(Bollinger::default().band(&[1.0]).is_none());
    }
}
