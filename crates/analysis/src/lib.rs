//! # bolsa-analysis
//!
//! 技术指标引擎与信号推导。纯同步计算，不做任何 I/O。

pub mod bollinger;
pub mod engine;
pub mod ewm;
pub mod macd;
pub mod rsi;
pub mod signal;

/// 将计数转换为 f64，超出 u32 范围时饱和
pub(crate) fn count_f64(n: usize) -> f64 {
    u32::try_from(n).map(f64::from).unwrap_or(f64::from(u32::MAX))
}
