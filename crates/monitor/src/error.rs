use bolsa_core::analysis::error::SignalError;
use bolsa_core::market::error::MarketError;
use thiserror::Error;

/// # Summary
/// 单个标的在本轮中被跳过的原因。
///
/// # Invariants
/// - 只影响该标的，不会中止整轮刷新。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickerError {
    #[error(transparent)]
    Market(#[from] MarketError),
    #[error(transparent)]
    Signal(#[from] SignalError),
}

/// # Summary
/// 中止整轮刷新的错误。
#[derive(Error, Debug)]
pub enum CycleError {
    // 首个连接级失败即中止，上一次快照保持不变
    #[error("Cycle aborted while fetching {symbol}: {source}")]
    Connection {
        symbol: String,
        #[source]
        source: MarketError,
    },
}

/// 看板快照写入失败
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
