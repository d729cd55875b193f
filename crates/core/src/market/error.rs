use thiserror::Error;

/// # Summary
/// 行情数据域错误枚举。
///
/// # Invariants
/// - `DataUnavailable` 只影响单个标的，调用方跳过该标的后继续。
/// - `ConnectionFailed` 表示传输层整体不可用，调用方中止本轮刷新。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    // 响应缺失、格式错误或有效数据不足
    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },
    // 请求未能发出或未收到任何响应
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

impl MarketError {
    /// 构造单标的数据不可用错误
    pub fn unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        MarketError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    /// 是否为中止整轮刷新的连接级错误
    pub fn is_connection(&self) -> bool {
        matches!(self, MarketError::ConnectionFailed(_))
    }
}
