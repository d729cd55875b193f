use bolsa_core::market::error::MarketError;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::error::Error as _;
use std::time::Duration;

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// # Summary
/// 构建数据源共用的 HTTP 客户端。
///
/// # Logic
/// 1. 设置请求超时。
/// 2. 设置浏览器 User-Agent 以减少被拦截风险。
///
/// # Returns
/// 成功返回客户端，TLS 后端初始化失败返回 `ConnectionFailed`。
pub fn build_client(timeout: Duration) -> Result<Client, MarketError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| MarketError::ConnectionFailed(format!("failed to build HTTP client: {}", e)))
}

/// # Summary
/// 生成不含请求 URL 的错误描述。
///
/// # Invariants
/// - 查询串里带有 `apikey`，URL 不得进入日志或快照。
fn describe(err: reqwest::Error) -> String {
    let err = err.without_url();
    match err.source() {
        Some(cause) => format!("{}: {}", err, cause),
        None => err.to_string(),
    }
}

/// # Summary
/// 将传输层错误归类。
///
/// # Logic
/// 1. 无法建立连接 (DNS、拒绝连接、网络不可达) => `ConnectionFailed`，中止整轮。
/// 2. 其余 (超时、读取中断等) 只影响当前标的 => `DataUnavailable`。
pub fn classify(symbol: &str, err: reqwest::Error) -> MarketError {
    if err.is_connect() {
        MarketError::ConnectionFailed(describe(err))
    } else if err.is_timeout() {
        MarketError::unavailable(symbol, format!("request timed out: {}", describe(err)))
    } else {
        MarketError::unavailable(symbol, describe(err))
    }
}

/// # Summary
/// 执行一次 GET 请求并返回响应体字节。
///
/// # Arguments
/// * `client`: HTTP 客户端。
/// * `url`: 目标地址。
/// * `query`: 查询参数。
/// * `symbol`: 当前标的，用于错误归属。
///
/// # Returns
/// 2xx 返回响应体，非 2xx 返回 `DataUnavailable`。
pub async fn get_bytes(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
    symbol: &str,
) -> Result<Vec<u8>, MarketError> {
    let resp = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| classify(symbol, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(MarketError::unavailable(symbol, format!("HTTP {}", status)));
    }

    let body = resp.bytes().await.map_err(|e| classify(symbol, e))?;
    Ok(body.to_vec())
}
