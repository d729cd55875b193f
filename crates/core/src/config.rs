use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::common::Ticker;
use crate::common::time::DedupPeriod;
use crate::market::entity::MIN_SERIES_LEN;

/// # Summary
/// 配置加载或校验错误。
#[derive(Error, Debug)]
pub enum ConfigError {
    // 配置源读取或反序列化失败
    #[error("Config load error: {0}")]
    Load(String),
    // 配置值不合法
    #[error("Invalid config: {0}")]
    Invalid(String),
    // 必需的凭证缺失
    #[error("Missing credential: {0}")]
    Missing(String),
}

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub monitor: MonitorConfig,
    pub notify: NotifyConfig,
    pub log: LogConfig,
    pub watchlist: Vec<CategoryConfig>,
}

/// 行情数据源选择
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    AlphaVantage,
    TwelveData,
    // Yahoo 失败时回退 Alpha Vantage
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    // 每次请求的最大日线数量
    pub lookback: usize,
    // 相邻两次网络请求之间的固定间隔 (数据源限频)
    pub request_delay_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // 涨跌幅告警阈值 (百分比，取绝对值比较)
    pub alert_threshold: f64,
    pub refresh_interval_secs: u64,
    pub cache_ttl_secs: u64,
    pub dedup_period: DedupPeriod,
    // 看板图表保留的最近行数
    pub chart_window: usize,
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub telegram: TelegramConfig,
    pub email: EmailConfig,
    pub timeout_secs: u64,
    // 为 true 时缺少通知凭证视为启动失败
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    // 设置后额外按天滚动写入该目录
    pub dir: Option<String>,
}

/// 看板分组及其标的 (声明顺序即处理顺序)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub tickers: Vec<Ticker>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            lookback: 100,
            request_delay_secs: 13,
            timeout_secs: 10,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            alert_threshold: 2.5,
            refresh_interval_secs: 300,
            cache_ttl_secs: 60,
            dedup_period: DedupPeriod::Day,
            chart_window: 20,
            snapshot_path: "data/dashboard.json".to_string(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            email: EmailConfig::default(),
            timeout_secs: 5,
            required: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl ProviderConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MonitorConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 内置关注列表，未配置 `watchlist` 时使用
pub fn default_watchlist() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig {
            name: "Mega Caps".to_string(),
            tickers: vec![
                Ticker::new("Apple", "AAPL"),
                Ticker::new("Microsoft", "MSFT"),
                Ticker::new("Amazon", "AMZN"),
                Ticker::new("Google", "GOOGL"),
            ],
        },
        CategoryConfig {
            name: "Defensive".to_string(),
            tickers: vec![
                Ticker::new("Coca Cola", "KO"),
                Ticker::new("Walmart", "WMT"),
                Ticker::new("Johnson & Johnson", "JNJ"),
                Ticker::new("Visa", "V"),
            ],
        },
    ]
}

impl AppConfig {
    /// # Summary
    /// 按声明顺序展开全部标的。
    pub fn tickers(&self) -> Vec<Ticker> {
        self.watchlist
            .iter()
            .flat_map(|c| c.tickers.iter().cloned())
            .collect()
    }

    /// # Summary
    /// 校验配置值的合法性。
    ///
    /// # Logic
    /// 1. 空关注列表回填内置默认列表。
    /// 2. 检查阈值、时长、窗口等数值范围。
    /// 3. 检查分类名称与标的代码全局唯一。
    ///
    /// # Returns
    /// 合法返回校验后的配置，否则返回 `ConfigError::Invalid`。
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.watchlist.is_empty() {
            self.watchlist = default_watchlist();
        }

        let threshold = self.monitor.alert_threshold;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "monitor.alert_threshold must be a positive number, got {}",
                threshold
            )));
        }
        if self.provider.lookback < MIN_SERIES_LEN {
            return Err(ConfigError::Invalid(format!(
                "provider.lookback must be at least {}, got {}",
                MIN_SERIES_LEN, self.provider.lookback
            )));
        }
        if self.provider.timeout_secs == 0 || self.notify.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".into()));
        }
        if self.monitor.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "monitor.refresh_interval_secs must be positive".into(),
            ));
        }
        if self.monitor.chart_window == 0 {
            return Err(ConfigError::Invalid("monitor.chart_window must be positive".into()));
        }

        let mut seen = HashSet::new();
        let mut categories = HashSet::new();
        for category in &self.watchlist {
            if !categories.insert(category.name.trim()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate category '{}' in watchlist",
                    category.name
                )));
            }
            if category.tickers.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "category '{}' has no tickers",
                    category.name
                )));
            }
            for ticker in &category.tickers {
                if ticker.symbol.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "ticker '{}' has an empty symbol",
                        ticker.name
                    )));
                }
                if !seen.insert(ticker.symbol.clone()) {
                    return Err(ConfigError::Invalid(format!(
                        "duplicate symbol '{}' in watchlist",
                        ticker.symbol
                    )));
                }
            }
        }

        Ok(self)
    }
}
