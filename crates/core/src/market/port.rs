use crate::common::Ticker;
use crate::market::entity::Series;
use crate::market::error::MarketError;
use async_trait::async_trait;

/// # Summary
/// 日线行情数据提供者接口（原始数据源适配器）。
///
/// # Invariants
/// - 返回的 Series 必须已经过规范化：日期升序、数值已强制转换。
/// - 单标的数据问题返回 `DataUnavailable`，传输失败返回 `ConnectionFailed`。
/// - 实现者不得自行重试或休眠，节流由调用方负责。
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// 数据源名称，用于日志与缓存键
    fn name(&self) -> &str;

    /// # Summary
    /// 获取标的最近一段时间的日线序列。
    ///
    /// # Logic
    /// 1. 构建数据源请求 (代码、回溯长度、密钥)。
    /// 2. 执行一次网络请求。
    /// 3. 将数据源特有的响应结构映射为规范化的 Series。
    ///
    /// # Arguments
    /// * `ticker`: 监控标的。
    /// * `lookback`: 期望的最大 K 线数量。
    ///
    /// # Returns
    /// 成功返回规范化后的 Series，失败返回 MarketError。
    async fn fetch_daily(&self, ticker: &Ticker, lookback: usize) -> Result<Series, MarketError>;
}
