pub mod time;

use serde::{Deserialize, Serialize};

/// # Summary
/// 监控标的实体，代表看板上的一张行情卡片。
///
/// # Invariants
/// - `symbol` 必须是数据源可识别的交易代码。
/// - 同一份关注列表内 `symbol` 唯一。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    // 展示名称 (例如: Apple)
    pub name: String,
    // 交易代码 (例如: AAPL)
    pub symbol: String,
}

impl Ticker {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.symbol)
    }
}
