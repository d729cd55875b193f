use async_trait::async_trait;
use bolsa_core::notify::error::NotifyError;
use bolsa_core::notify::port::Notifier;
use tracing::debug;

/// Stand-in used when no delivery channel is configured. Alerts are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    fn channel(&self) -> &str {
        "noop"
    }

    async fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError> {
        debug!("Notification for {} dropped (no channel): {}", subject, content);
        Ok(())
    }
}
