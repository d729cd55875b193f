use bolsa_analysis::engine::IndicatorEngine;
use bolsa_analysis::signal::SignalDeriver;
use bolsa_core::analysis::entity::{AnalyzedRow, Signal};
use bolsa_core::cache::port::{Cache, CacheExt};
use bolsa_core::common::Ticker;
use bolsa_core::common::time::{DedupPeriod, TimeProvider};
use bolsa_core::config::{AppConfig, CategoryConfig};
use bolsa_core::market::entity::Series;
use bolsa_core::market::error::MarketError;
use bolsa_core::market::port::DataProvider;
use bolsa_core::notify::port::Notifier;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::alert::{AlertGate, format_alert};
use crate::error::{CycleError, TickerError};

/// # Summary
/// 刷新周期的运行参数。
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    // 每次抓取的最大 K 线数量
    pub lookback: usize,
    // 相邻两次网络抓取之间的间隔
    pub request_delay: Duration,
    pub cache_ttl: Duration,
    // 单次通知投递的超时上限
    pub notify_timeout: Duration,
    pub alert_threshold: f64,
    pub dedup_period: DedupPeriod,
    // 快照中每个标的保留的最近行数
    pub chart_window: usize,
}

impl From<&AppConfig> for MonitorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            lookback: config.provider.lookback,
            request_delay: config.provider.request_delay(),
            cache_ttl: config.monitor.cache_ttl(),
            notify_timeout: config.notify.timeout(),
            alert_threshold: config.monitor.alert_threshold,
            dedup_period: config.monitor.dedup_period,
            chart_window: config.monitor.chart_window,
        }
    }
}

/// 成功分析的标的
#[derive(Debug, Clone)]
pub struct TickerRecord {
    pub category: String,
    pub ticker: Ticker,
    pub signal: Signal,
    // 最近 `chart_window` 行，含 OHLCV 与指标列
    pub chart: Vec<AnalyzedRow>,
}

/// 本轮被跳过的标的
#[derive(Debug, Clone)]
pub struct TickerFailure {
    pub category: String,
    pub ticker: Ticker,
    pub error: TickerError,
}

/// # Summary
/// 一轮刷新的结果。
///
/// # Invariants
/// - `records` 与 `failures` 均保持关注列表中的声明顺序。
/// - 每个标的恰好出现在两者之一中。
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub generated_at: DateTime<Utc>,
    pub provider: String,
    pub records: Vec<TickerRecord>,
    pub failures: Vec<TickerFailure>,
    // 实际调用通知器的次数 (含投递失败)
    pub notifications_sent: usize,
}

impl CycleReport {
    pub fn alerts(&self) -> impl Iterator<Item = &TickerRecord> {
        self.records.iter().filter(|r| r.signal.alert)
    }
}

/// # Summary
/// 行情监控器，按顺序驱动每个标的完成一轮完整处理。
///
/// # Invariants
/// - 严格串行：一个标的的抓取、计算、信号生成全部完成后才处理下一个。
/// - 去重状态 `gate` 由监控器独占，跨轮次保留。
/// - 所有外部依赖均通过端口注入，便于替换为测试替身。
pub struct Monitor {
    provider: Arc<dyn DataProvider>,
    cache: Arc<dyn Cache>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn TimeProvider>,
    watchlist: Vec<CategoryConfig>,
    settings: MonitorSettings,
    engine: IndicatorEngine,
    deriver: SignalDeriver,
    gate: AlertGate,
}

/// 序列来源
enum Loaded {
    Cached(Series),
    Fetched(Series),
}

impl Monitor {
    /// # Summary
    /// 组装监控器。
    ///
    /// # Arguments
    /// * `provider`: 行情数据源。
    /// * `cache`: 响应缓存。
    /// * `notifier`: 告警通道。
    /// * `clock`: 时钟，用于去重周期与报告时间戳。
    /// * `watchlist`: 按分类组织的关注列表。
    /// * `settings`: 运行参数。
    pub fn new(
        provider: Arc<dyn DataProvider>,
        cache: Arc<dyn Cache>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn TimeProvider>,
        watchlist: Vec<CategoryConfig>,
        settings: MonitorSettings,
    ) -> Self {
        let deriver = SignalDeriver::new(settings.alert_threshold);
        let gate = AlertGate::new(settings.dedup_period);
        Self {
            provider,
            cache,
            notifier,
            clock,
            watchlist,
            settings,
            engine: IndicatorEngine::standard(),
            deriver,
            gate,
        }
    }

    pub fn watchlist(&self) -> &[CategoryConfig] {
        &self.watchlist
    }

    fn cache_key(&self, symbol: &str) -> String {
        format!("series:{}:{}", self.provider.name(), symbol)
    }

    /// # Summary
    /// 获取标的序列：优先读缓存，未命中再请求数据源。
    ///
    /// # Logic
    /// 1. 缓存命中直接返回，缓存读写失败仅记录警告。
    /// 2. 未命中时，若本轮已发生过网络抓取则先等待 `request_delay`。
    /// 3. 抓取成功后写回缓存。
    async fn load(&self, ticker: &Ticker, fetched_before: bool) -> Result<Loaded, MarketError> {
        let key = self.cache_key(&ticker.symbol);
        match self.cache.get::<Series>(&key).await {
            Ok(Some(series)) => return Ok(Loaded::Cached(series)),
            Ok(None) => {}
            Err(e) => warn!("Cache read failed for {}: {}", ticker.symbol, e),
        }

        if fetched_before && !self.settings.request_delay.is_zero() {
            tokio::time::sleep(self.settings.request_delay).await;
        }

        let series = self
            .provider
            .fetch_daily(ticker, self.settings.lookback)
            .await?;

        if let Err(e) = self
            .cache
            .set(&key, &series, Some(self.settings.cache_ttl))
            .await
        {
            warn!("Cache write failed for {}: {}", ticker.symbol, e);
        }
        Ok(Loaded::Fetched(series))
    }

    /// 指标计算与信号生成
    fn analyze(&self, series: Series) -> Result<(Signal, Vec<AnalyzedRow>), TickerError> {
        let analyzed = self.engine.run(series);
        let signal = self.deriver.derive(&analyzed)?;
        let chart = analyzed.tail(self.settings.chart_window).to_vec();
        Ok((signal, chart))
    }

    /// # Summary
    /// 执行一轮完整刷新。
    ///
    /// # Logic
    /// 1. 按声明顺序逐个处理标的：取序列 → 指标 → 信号。
    /// 2. 数据不可用或历史不足的标的记入 `failures` 后继续。
    /// 3. 首个连接级失败立即中止整轮。
    /// 4. 全部处理完后，对触发告警的标的经去重闸门放行后通知。
    ///
    /// # Returns
    /// 成功返回本轮报告，连接失败返回 `CycleError`。
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let started = self.clock.now();
        info!(
            "Refresh cycle started: {} tickers via {}",
            self.watchlist.iter().map(|c| c.tickers.len()).sum::<usize>(),
            self.provider.name()
        );

        let mut records = Vec::new();
        let mut failures = Vec::new();
        let mut fetched_before = false;

        for category in &self.watchlist {
            for ticker in &category.tickers {
                let loaded = match self.load(ticker, fetched_before).await {
                    Ok(loaded) => loaded,
                    Err(e) if e.is_connection() => {
                        return Err(CycleError::Connection {
                            symbol: ticker.symbol.clone(),
                            source: e,
                        });
                    }
                    Err(e) => {
                        fetched_before = true;
                        warn!("Skipping {}: {}", ticker, e);
                        failures.push(TickerFailure {
                            category: category.name.clone(),
                            ticker: ticker.clone(),
                            error: e.into(),
                        });
                        continue;
                    }
                };

                let series = match loaded {
                    Loaded::Cached(series) => {
                        debug!("Cache hit for {}", ticker.symbol);
                        series
                    }
                    Loaded::Fetched(series) => {
                        fetched_before = true;
                        series
                    }
                };

                match self.analyze(series) {
                    Ok((signal, chart)) => {
                        debug!(
                            "{}: close {:.2} ({:+.2}%)",
                            ticker.symbol, signal.price, signal.percent_change
                        );
                        records.push(TickerRecord {
                            category: category.name.clone(),
                            ticker: ticker.clone(),
                            signal,
                            chart,
                        });
                    }
                    Err(e) => {
                        warn!("Skipping {}: {}", ticker, e);
                        failures.push(TickerFailure {
                            category: category.name.clone(),
                            ticker: ticker.clone(),
                            error: e,
                        });
                    }
                }
            }
        }

        let notifications_sent = self.dispatch_alerts(&records).await;

        info!(
            "Refresh cycle finished: {} ok, {} unavailable, {} notified",
            records.len(),
            failures.len(),
            notifications_sent
        );

        Ok(CycleReport {
            generated_at: started,
            provider: self.provider.name().to_string(),
            records,
            failures,
            notifications_sent,
        })
    }

    /// # Summary
    /// 对告警标的进行去重并投递通知。
    ///
    /// # Logic
    /// 1. 去重闸门拦截本周期内已通知过的标的。
    /// 2. 每次投递受 `notify_timeout` 约束，失败或超时只记录警告。
    ///
    /// # Returns
    /// 实际调用通知器的次数。
    async fn dispatch_alerts(&mut self, records: &[TickerRecord]) -> usize {
        let mut invoked = 0;
        for record in records.iter().filter(|r| r.signal.alert) {
            let now = self.clock.now();
            if !self.gate.should_send(&record.ticker.symbol, now) {
                debug!(
                    "Alert for {} already sent this {}",
                    record.ticker.symbol,
                    self.gate.period()
                );
                continue;
            }

            let message = format_alert(&record.ticker, &record.signal);
            let subject = record.ticker.to_string();
            invoked += 1;
            match tokio::time::timeout(
                self.settings.notify_timeout,
                self.notifier.notify(&subject, &message),
            )
            .await
            {
                Ok(Ok(())) => info!("Alert sent via {}: {}", self.notifier.channel(), message),
                Ok(Err(e)) => warn!(
                    "Notification for {} via {} failed: {}",
                    record.ticker.symbol,
                    self.notifier.channel(),
                    e
                ),
                Err(_) => warn!(
                    "Notification for {} via {} timed out after {:?}",
                    record.ticker.symbol,
                    self.notifier.channel(),
                    self.settings.notify_timeout
                ),
            }
        }
        invoked
    }
}
