use thiserror::Error;

/// # Summary
/// 缓存域错误枚举，处理值的序列化故障。
///
/// # Invariants
/// - 缓存错误永远不应中止刷新流程，调用方降级为直接请求数据源。
#[derive(Error, Debug)]
pub enum CacheError {
    // 数据序列化失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    // 数据反序列化失败
    #[error("Deserialize error: {0}")]
    Deserialize(String),
}
