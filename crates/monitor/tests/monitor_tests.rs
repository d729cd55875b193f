use async_trait::async_trait;
use bolsa_cache::MemCache;
use bolsa_core::common::Ticker;
use bolsa_core::common::time::{DedupPeriod, FakeClockProvider};
use bolsa_core::config::CategoryConfig;
use bolsa_core::market::entity::{Bar, Series};
use bolsa_core::market::error::MarketError;
use bolsa_core::market::port::DataProvider;
use bolsa_core::notify::error::NotifyError;
use bolsa_core::notify::port::Notifier;
use bolsa_monitor::error::{CycleError, TickerError};
use bolsa_monitor::{Dashboard, Monitor, MonitorSettings};
use chrono::{Days, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 按代码返回预设结果，并记录每次抓取
struct MockProvider {
    responses: HashMap<String, Result<Series, MarketError>>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(responses: Vec<(&str, Result<Series, MarketError>)>) -> Arc<Self> {
        Arc::new(Self {
            responses: responses
                .into_iter()
                .map(|(s, r)| (s.to_string(), r))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_daily(&self, ticker: &Ticker, _lookback: usize) -> Result<Series, MarketError> {
        self.calls.lock().unwrap().push(ticker.symbol.clone());
        self.responses
            .get(&ticker.symbol)
            .cloned()
            .unwrap_or_else(|| Err(MarketError::unavailable(&ticker.symbol, "unknown symbol")))
    }
}

/// 记录收到的告警；可配置为失败或阻塞
#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(String, String)>>,
    fail: bool,
    stall: Option<Duration>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &str {
        "recording"
    }

    async fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .unwrap()
            .push((subject.to_string(), content.to_string()));
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        if self.fail {
            return Err(NotifyError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

fn series(symbol: &str, closes: &[f64]) -> Series {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            date: start + Days::new(i as u64),
            open: Some(c),
            high: Some(c + 0.5),
            low: Some(c - 0.5),
            close: Some(c),
            volume: Some(1_000_000.0),
        })
        .collect();
    Series::new(symbol, bars).unwrap()
}

/// 小幅震荡，最后一根涨幅 +0.1%
fn steady(symbol: &str) -> Result<Series, MarketError> {
    let closes: Vec<f64> = (0..40_u8).map(|i| 100.0 + f64::from(i % 2) * 0.1).collect();
    Ok(series(symbol, &closes))
}

/// 最后一根上涨 5%
fn spike(symbol: &str) -> Result<Series, MarketError> {
    let mut closes: Vec<f64> = (0..39_u8).map(|i| 100.0 + f64::from(i % 2) * 0.1).collect();
    closes.push(105.0);
    Ok(series(symbol, &closes))
}

fn settings() -> MonitorSettings {
    MonitorSettings {
        lookback: 100,
        request_delay: Duration::ZERO,
        cache_ttl: Duration::from_secs(60),
        notify_timeout: Duration::from_secs(5),
        alert_threshold: 2.5,
        dedup_period: DedupPeriod::Day,
        chart_window: 20,
    }
}

/// 分类名与空格分隔的代码列表
fn watchlist(groups: &[(&str, &str)]) -> Vec<CategoryConfig> {
    groups
        .iter()
        .map(|(name, symbols)| CategoryConfig {
            name: name.to_string(),
            tickers: symbols
                .split_whitespace()
                .map(|s| Ticker::new(s, s))
                .collect(),
        })
        .collect()
}

struct Harness {
    monitor: Monitor,
    provider: Arc<MockProvider>,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<FakeClockProvider>,
}

fn harness(
    provider: Arc<MockProvider>,
    notifier: RecordingNotifier,
    groups: &[(&str, &str)],
    settings: MonitorSettings,
) -> Harness {
    let clock = Arc::new(FakeClockProvider::new(
        Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
    ));
    let notifier = Arc::new(notifier);
    let cache = Arc::new(MemCache::with_clock(clock.clone()));
    let monitor = Monitor::new(
        provider.clone(),
        cache,
        notifier.clone(),
        clock.clone(),
        watchlist(groups),
        settings,
    );
    Harness {
        monitor,
        provider,
        notifier,
        clock,
    }
}

#[tokio::test]
async fn test_malformed_ticker_is_skipped() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![
        ("AAPL", steady("AAPL")),
        ("MSFT", Err(MarketError::unavailable("MSFT", "malformed payload"))),
        ("KO", steady("KO")),
    ]);
    let mut h = harness(
        provider,
        RecordingNotifier::default(),
        &[("Tech", "AAPL MSFT"), ("Staples", "KO")],
        settings(),
    );

    let report = h.monitor.run_cycle().await?;

    let ok: Vec<&str> = report
        .records
        .iter()
        .map(|r| r.ticker.symbol.as_str())
        .collect();
    assert_eq!(ok, vec!["AAPL", "KO"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].ticker.symbol, "MSFT");
    assert!(matches!(report.failures[0].error, TickerError::Market(_)));
    assert_eq!(report.records[0].chart.len(), 20);
    assert_eq!(report.notifications_sent, 0);
    Ok(())
}

#[tokio::test]
async fn test_short_history_is_skipped() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![
        ("AAPL", Ok(series("AAPL", &[100.0; 10]))),
        ("KO", steady("KO")),
    ]);
    let mut h = harness(
        provider,
        RecordingNotifier::default(),
        &[("All", "AAPL KO")],
        settings(),
    );

    let report = h.monitor.run_cycle().await?;
    assert_eq!(report.records.len(), 1);
    assert!(matches!(report.failures[0].error, TickerError::Signal(_)));
    Ok(())
}

#[tokio::test]
async fn test_alert_sent_once_per_period() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![("AAPL", spike("AAPL")), ("KO", steady("KO"))]);
    let mut h = harness(
        provider,
        RecordingNotifier::default(),
        &[("All", "AAPL KO")],
        settings(),
    );

    let first = h.monitor.run_cycle().await?;
    assert_eq!(first.alerts().count(), 1);
    assert_eq!(first.notifications_sent, 1);

    h.clock.advance(chrono::Duration::minutes(5));
    let second = h.monitor.run_cycle().await?;
    assert_eq!(second.alerts().count(), 1);
    assert_eq!(second.notifications_sent, 0);

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "AAPL (AAPL)");
    assert_eq!(
        messages[0].1,
        "⚠️ ALERT: AAPL (AAPL) moved +5.00% · price 105.00"
    );

    // 进入下一个周期后再次放行
    h.clock.advance(chrono::Duration::days(1));
    let third = h.monitor.run_cycle().await?;
    assert_eq!(third.notifications_sent, 1);
    assert_eq!(h.notifier.messages().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_connection_failure_aborts_cycle() {
    let provider = MockProvider::new(vec![
        ("AAPL", steady("AAPL")),
        ("MSFT", Err(MarketError::ConnectionFailed("dns error".to_string()))),
        ("KO", spike("KO")),
    ]);
    let mut h = harness(
        provider,
        RecordingNotifier::default(),
        &[("All", "AAPL MSFT KO")],
        settings(),
    );

    let err = h.monitor.run_cycle().await.unwrap_err();
    let CycleError::Connection { symbol, .. } = err;
    assert_eq!(symbol, "MSFT");
    // KO 不再抓取，也不会触发通知
    assert_eq!(h.provider.calls(), vec!["AAPL", "MSFT"]);
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_cache_serves_repeat_requests_until_ttl() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![("AAPL", steady("AAPL")), ("KO", steady("KO"))]);
    let mut h = harness(
        provider,
        RecordingNotifier::default(),
        &[("All", "AAPL KO")],
        settings(),
    );

    h.monitor.run_cycle().await?;
    h.clock.advance(chrono::Duration::seconds(30));
    let cached = h.monitor.run_cycle().await?;
    assert_eq!(cached.records.len(), 2);
    assert_eq!(h.provider.calls().len(), 2);

    h.clock.advance(chrono::Duration::seconds(31));
    h.monitor.run_cycle().await?;
    assert_eq!(h.provider.calls().len(), 4);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_delay_only_between_network_fetches() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![
        ("AAPL", steady("AAPL")),
        ("MSFT", steady("MSFT")),
        ("KO", steady("KO")),
    ]);
    let mut config = settings();
    config.request_delay = Duration::from_secs(13);
    let mut h = harness(
        provider,
        RecordingNotifier::default(),
        &[("All", "AAPL MSFT KO")],
        config,
    );

    let start = tokio::time::Instant::now();
    h.monitor.run_cycle().await?;
    assert_eq!(start.elapsed(), Duration::from_secs(26));

    // 全部命中缓存，不再等待
    let start = tokio::time::Instant::now();
    h.monitor.run_cycle().await?;
    assert_eq!(start.elapsed(), Duration::ZERO);
    Ok(())
}

#[tokio::test]
async fn test_notification_failure_is_swallowed() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![("AAPL", spike("AAPL"))]);
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let mut h = harness(provider, notifier, &[("All", "AAPL")], settings());

    let report = h.monitor.run_cycle().await?;
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.notifications_sent, 1);

    // 投递失败同样计入本周期，不重试
    let again = h.monitor.run_cycle().await?;
    assert_eq!(again.notifications_sent, 0);
    assert_eq!(h.notifier.messages().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stalled_notifier_is_bounded() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![("AAPL", spike("AAPL")), ("KO", spike("KO"))]);
    let notifier = RecordingNotifier {
        stall: Some(Duration::from_secs(60)),
        ..Default::default()
    };
    let mut h = harness(provider, notifier, &[("All", "AAPL KO")], settings());

    let start = tokio::time::Instant::now();
    let report = h.monitor.run_cycle().await?;
    assert_eq!(report.notifications_sent, 2);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    Ok(())
}

#[tokio::test]
async fn test_snapshot_written_atomically() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![
        ("AAPL", spike("AAPL")),
        ("MSFT", Err(MarketError::unavailable("MSFT", "HTTP 429"))),
        ("KO", steady("KO")),
    ]);
    let mut h = harness(
        provider,
        RecordingNotifier::default(),
        &[("Tech", "AAPL MSFT"), ("Staples", "KO"), ("Empty", "")],
        settings(),
    );

    let report = h.monitor.run_cycle().await?;
    let dashboard = Dashboard::from_report(&report, h.monitor.watchlist());

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data").join("dashboard.json");
    dashboard.write_atomic(&path).await?;

    let text = std::fs::read_to_string(&path)?;
    let restored: Dashboard = serde_json::from_str(&text)?;
    assert_eq!(restored, dashboard);

    let names: Vec<&str> = restored.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Tech", "Staples", "Empty"]);
    assert!(restored.categories[2].records.is_empty());

    let aapl = &restored.categories[0].records[0];
    assert!(aapl.alert);
    assert_eq!(aapl.chart.len(), 20);
    assert_eq!(restored.unavailable[0].symbol, "MSFT");
    assert_eq!(
        restored.warning.as_deref(),
        Some("1 ticker(s) unavailable: MSFT")
    );

    let json: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(json["categories"][0]["records"][0]["chart"][19]["close"], 105.0);
    assert!(json["categories"][0]["records"][0]["chart"][19]["histogram"].is_number());

    let leftovers = std::fs::read_dir(path.parent().unwrap())?.count();
    assert_eq!(leftovers, 1);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_write_does_not_block_runtime() -> anyhow::Result<()> {
    let provider = MockProvider::new(vec![("KO", steady("KO"))]);
    let mut h = harness(
        provider,
        RecordingNotifier::default(),
        &[("Staples", "KO")],
        settings(),
    );
    let report = h.monitor.run_cycle().await?;
    let dashboard = Dashboard::from_report(&report, h.monitor.watchlist());

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("dashboard.json");
    std::fs::write(&path, "stale")?;

    // 单线程运行时：写盘期间其他任务仍能被调度
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();
    let other = tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

    dashboard.write_atomic(&path).await?;
    assert!(ran.load(Ordering::SeqCst));
    other.await?;

    let restored: Dashboard = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(restored, dashboard);
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}
