use bolsa_core::config::{ConfigError, NotifyConfig, ProviderConfig, ProviderKind};
use bolsa_core::market::error::MarketError;
use bolsa_core::market::port::DataProvider;
use bolsa_core::notify::error::NotifyError;
use bolsa_core::notify::port::Notifier;
use bolsa_feed::alpha_vantage::AlphaVantageProvider;
use bolsa_feed::fallback::FallbackProvider;
use bolsa_feed::twelve_data::TwelveDataProvider;
use bolsa_feed::yahoo::YahooProvider;
use bolsa_notify::email::EmailNotifier;
use bolsa_notify::fanout::FanoutNotifier;
use bolsa_notify::noop::NoopNotifier;
use bolsa_notify::telegram::TelegramNotifier;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// # Summary
/// 按 `provider.kind` 构建行情数据源。
///
/// # Logic
/// 1. 需要 Key 的数据源缺少 Key 时仅告警，运行时每个标的都会报告不可用。
/// 2. `fallback` 组装为 Yahoo → Alpha Vantage 回退链。
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn DataProvider>, MarketError> {
    let timeout = config.timeout();
    let key = config.api_key.clone();
    let needs_key = !matches!(config.kind, ProviderKind::Yahoo);
    if needs_key && filled(&config.api_key).is_none() {
        warn!(
            "No API key configured for {:?}; tickers will report unavailable",
            config.kind
        );
    }

    let provider: Arc<dyn DataProvider> = match config.kind {
        ProviderKind::Yahoo => Arc::new(YahooProvider::new(timeout)?),
        ProviderKind::AlphaVantage => Arc::new(AlphaVantageProvider::new(key, timeout)?),
        ProviderKind::TwelveData => Arc::new(TwelveDataProvider::new(key, timeout)?),
        ProviderKind::Fallback => {
            let primary: Arc<dyn DataProvider> = Arc::new(YahooProvider::new(timeout)?);
            let backup: Arc<dyn DataProvider> = Arc::new(AlphaVantageProvider::new(key, timeout)?);
            Arc::new(FallbackProvider::new(vec![primary, backup]))
        }
    };
    info!("Data provider: {}", provider.name());
    Ok(provider)
}

/// 构建通知器失败的原因
#[derive(Error, Debug)]
pub enum NotifierSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// # Summary
/// 按已配置的凭证构建告警通道。
///
/// # Logic
/// 1. Telegram 需要 token 与 chat id，邮件需要完整的 SMTP 五项配置。
/// 2. 没有任何通道时：`required = true` 返回错误，否则退化为 `NoopNotifier`。
/// 3. 多个通道时组合为 `FanoutNotifier`。
pub fn build_notifier(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, NotifierSetupError> {
    let timeout = config.timeout();
    let mut channels: Vec<Arc<dyn Notifier>> = Vec::new();

    let tg = &config.telegram;
    if let (Some(token), Some(chat_id)) = (filled(&tg.bot_token), filled(&tg.chat_id)) {
        let notifier = TelegramNotifier::new(token.to_string(), chat_id.to_string(), timeout)?;
        channels.push(Arc::new(notifier));
    }

    let mail = &config.email;
    if let (Some(host), Some(user), Some(pass), Some(from), Some(to)) = (
        filled(&mail.host),
        filled(&mail.user),
        filled(&mail.pass),
        filled(&mail.from),
        filled(&mail.to),
    ) {
        let notifier = EmailNotifier::new(host, user, pass, from, to, timeout)?;
        channels.push(Arc::new(notifier));
    }

    let notifier: Arc<dyn Notifier> = match channels.len() {
        0 if config.required => {
            return Err(ConfigError::Missing(
                "notify.required is set but no Telegram or e-mail credentials are configured"
                    .to_string(),
            )
            .into());
        }
        0 => {
            warn!("No notification channel configured; alerts will only be logged");
            Arc::new(NoopNotifier)
        }
        1 => channels.remove(0),
        _ => Arc::new(FanoutNotifier::new(channels)),
    };
    info!("Notification channel: {}", notifier.channel());
    Ok(notifier)
}
