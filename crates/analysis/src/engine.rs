use bolsa_core::analysis::entity::AnalyzedSeries;
use bolsa_core::market::entity::Series;
use tracing::trace;

use crate::bollinger::Bollinger;
use crate::macd::Macd;
use crate::rsi::Rsi;

/// # Summary
/// 指标阶段契约。每个阶段只追加自己负责的列，不修改原始 K 线与其他列。
pub trait IndicatorStage: Send + Sync {
    /// 阶段名称
    fn name(&self) -> &str;

    /// 首个可能有值的行索引
    fn warmup(&self) -> usize;

    /// 在序列上原地追加指标列
    fn apply(&self, series: &mut AnalyzedSeries);
}

/// # Summary
/// 指标引擎，按注册顺序依次执行各阶段。
///
/// # Invariants
/// - 输出行数等于输入行数，预热期内的列为 `None`。
/// - 对同一输入 Series 多次运行结果一致。
pub struct IndicatorEngine {
    stages: Vec<Box<dyn IndicatorStage>>,
}

impl IndicatorEngine {
    pub fn new(stages: Vec<Box<dyn IndicatorStage>>) -> Self {
        Self { stages }
    }

    /// 布林带 (20, 2)、RSI (14)、MACD (12, 26, 9)
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(Bollinger::default()),
            Box::new(Rsi::default()),
            Box::new(Macd::default()),
        ])
    }

    /// # Summary
    /// 对规范化后的序列计算全部指标。
    ///
    /// # Arguments
    /// * `series`: 规范化后的日线序列。
    ///
    /// # Returns
    /// 追加了指标列的序列。
    pub fn run(&self, series: Series) -> AnalyzedSeries {
        let mut analyzed = AnalyzedSeries::from(series);
        for stage in &self.stages {
            trace!(
                "Applying stage {} to {} ({} rows)",
                stage.name(),
                analyzed.symbol,
                analyzed.rows.len()
            );
            stage.apply(&mut analyzed);
        }
        analyzed
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::standard()
    }
}
