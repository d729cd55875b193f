use async_trait::async_trait;
use bolsa_core::notify::error::NotifyError;
use bolsa_core::notify::port::Notifier;
use bolsa_notify::email::EmailNotifier;
use bolsa_notify::fanout::FanoutNotifier;
use bolsa_notify::noop::NoopNotifier;
use bolsa_notify::telegram::TelegramNotifier;
use std::env;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SAMPLE: &str = "⚠️ ALERT: Apple (AAPL) moved +3.10% · price 189.84";

/// 记录调用的通道，可配置为始终失败
struct RecordingChannel {
    name: &'static str,
    fail: bool,
    sent: Mutex<Vec<String>>,
}

impl RecordingChannel {
    fn new(name: &'static str, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail,
            sent: Mutex::new(Vec::new()),
        })
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingChannel {
    fn channel(&self) -> &str {
        self.name
    }

    async fn notify(&self, _subject: &str, content: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(content.to_string());
        if self.fail {
            Err(NotifyError::Platform("HTTP 401".to_string()))
        } else {
            Ok(())
        }
    }
}

fn fanout(channels: &[&Arc<RecordingChannel>]) -> FanoutNotifier {
    FanoutNotifier::new(
        channels
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn Notifier>)
            .collect(),
    )
}

#[tokio::test]
async fn test_noop_always_succeeds() {
    let notifier = NoopNotifier;
    assert_eq!(notifier.channel(), "noop");
    assert!(notifier.notify("Apple (AAPL)", SAMPLE).await.is_ok());
}

#[tokio::test]
async fn test_fanout_continues_after_failure() {
    let broken = RecordingChannel::new("telegram", true);
    let healthy = RecordingChannel::new("email", false);
    let notifier = fanout(&[&broken, &healthy]);

    assert_eq!(notifier.channel(), "telegram+email");
    assert!(notifier.notify("Apple (AAPL)", SAMPLE).await.is_ok());
    assert_eq!(broken.count(), 1);
    assert_eq!(healthy.count(), 1);
}

#[tokio::test]
async fn test_fanout_fails_when_every_channel_fails() {
    let a = RecordingChannel::new("a", true);
    let b = RecordingChannel::new("b", true);
    let notifier = fanout(&[&a, &b]);

    let err = notifier.notify("Apple (AAPL)", SAMPLE).await.unwrap_err();
    assert!(matches!(err, NotifyError::Platform(_)));
}

#[test]
fn test_telegram_rejects_blank_credentials() {
    let result = TelegramNotifier::new(" ".to_string(), "42".to_string(), Duration::from_secs(5));
    assert!(matches!(result, Err(NotifyError::Config(_))));
}

#[tokio::test]
async fn test_telegram_unreachable_host_is_an_error() -> anyhow::Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    // 端口 9 (discard) 在本机通常无监听，连接会被立即拒绝
    let notifier = TelegramNotifier::new(
        "123:abc".to_string(),
        "42".to_string(),
        Duration::from_secs(2),
    )?
    .with_base_url("http://127.0.0.1:9");

    let result = notifier.notify("Apple (AAPL)", SAMPLE).await;
    assert!(matches!(result, Err(NotifyError::Network(_))));
    Ok(())
}

/// # Summary
/// 集成测试：验证 Telegram 通知发送功能。
///
/// # Logic
/// 1. 加载 .env 环境变量。
/// 2. 从环境变量获取 Bot Token 和 Chat ID。
/// 3. 初始化 TelegramNotifier。
/// 4. 发送测试消息并断言结果。
#[tokio::test]
#[ignore] // 默认忽略，仅在手动测试时通过环境变量开启
async fn test_telegram_notification() -> anyhow::Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let _ = dotenvy::dotenv();
    let bot_token = env::var("TELEGRAM_TOKEN").expect("TELEGRAM_TOKEN must be set");
    let chat_id = env::var("TELEGRAM_CHAT_ID").expect("TELEGRAM_CHAT_ID must be set");

    let notifier = TelegramNotifier::new(bot_token, chat_id, Duration::from_secs(5))?;
    let result = notifier.notify("Apple (AAPL)", SAMPLE).await;

    assert!(result.is_ok(), "Telegram notification failed: {:?}", result);
    Ok(())
}

/// # Summary
/// 集成测试：验证 Email 通知发送功能。
///
/// # Logic
/// 1. 加载 .env 环境变量。
/// 2. 从环境变量获取 SMTP 服务器配置。
/// 3. 初始化 EmailNotifier。
/// 4. 发送测试邮件并断言结果。
#[tokio::test]
#[ignore] // 默认忽略
async fn test_email_notification() -> anyhow::Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let _ = dotenvy::dotenv();
    let host = env::var("BOLSA_EMAIL_HOST").expect("BOLSA_EMAIL_HOST must be set");
    let user = env::var("BOLSA_EMAIL_USER").expect("BOLSA_EMAIL_USER must be set");
    let pass = env::var("BOLSA_EMAIL_PASS").expect("BOLSA_EMAIL_PASS must be set");
    let from = env::var("BOLSA_EMAIL_FROM").expect("BOLSA_EMAIL_FROM must be set");
    let to = env::var("BOLSA_EMAIL_TO").expect("BOLSA_EMAIL_TO must be set");

    let notifier = EmailNotifier::new(&host, &user, &pass, &from, &to, Duration::from_secs(10))?;
    let result = notifier.notify("Apple (AAPL)", SAMPLE).await;

    assert!(result.is_ok(), "Email notification failed: {:?}", result);
    Ok(())
}
