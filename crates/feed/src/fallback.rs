use async_trait::async_trait;
use bolsa_core::common::Ticker;
use bolsa_core::market::entity::Series;
use bolsa_core::market::error::MarketError;
use bolsa_core::market::port::DataProvider;
use std::sync::Arc;
use tracing::{debug, warn};

/// # Summary
/// 多数据源回退链，按顺序尝试直到某个数据源成功。
///
/// # Invariants
/// - 顺序尝试，不并发请求。
/// - 全部失败时：只要有一个数据源给出了数据层错误，就返回最后一个数据层错误；
///   否则 (全部为连接失败) 返回最后一个连接错误。
pub struct FallbackProvider {
    providers: Vec<Arc<dyn DataProvider>>,
    name: String,
}

impl FallbackProvider {
    pub fn new(providers: Vec<Arc<dyn DataProvider>>) -> Self {
        let name = providers
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join("+");
        Self { providers, name }
    }
}

#[async_trait]
impl DataProvider for FallbackProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_daily(&self, ticker: &Ticker, lookback: usize) -> Result<Series, MarketError> {
        let mut last_data_err: Option<MarketError> = None;
        let mut last_conn_err: Option<MarketError> = None;

        for provider in &self.providers {
            match provider.fetch_daily(ticker, lookback).await {
                Ok(series) => {
                    debug!("{} served {}", provider.name(), ticker.symbol);
                    return Ok(series);
                }
                Err(e) => {
                    warn!("{} failed for {}: {}", provider.name(), ticker.symbol, e);
                    if e.is_connection() {
                        last_conn_err = Some(e);
                    } else {
                        last_data_err = Some(e);
                    }
                }
            }
        }

        Err(last_data_err.or(last_conn_err).unwrap_or_else(|| {
            MarketError::unavailable(&ticker.symbol, "no data providers configured")
        }))
    }
}
