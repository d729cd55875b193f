use thiserror::Error;

/// # Summary
/// 信号推导错误枚举。
///
/// # Invariants
/// - 只影响单个标的，调用方跳过该标的后继续。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    // 指标预热后可用行不足两行
    #[error("Insufficient history for {symbol}: {usable} usable rows")]
    InsufficientHistory { symbol: String, usable: usize },
}
