use async_trait::async_trait;
use bolsa_core::notify::error::NotifyError;
use bolsa_core::notify::port::Notifier;
use std::sync::Arc;
use tracing::warn;

/// # Summary
/// Delivers the same alert through several channels, one after another.
///
/// # Invariants
/// * Each channel gets exactly one attempt per alert.
/// * A failing channel does not stop the remaining ones.
/// * The call succeeds if at least one channel delivered.
pub struct FanoutNotifier {
    channels: Vec<Arc<dyn Notifier>>,
    name: String,
}

impl FanoutNotifier {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        let name = channels
            .iter()
            .map(|c| c.channel())
            .collect::<Vec<_>>()
            .join("+");
        Self { channels, name }
    }
}

#[async_trait]
impl Notifier for FanoutNotifier {
    fn channel(&self) -> &str {
        &self.name
    }

    async fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError> {
        let mut delivered = false;
        let mut last_err = None;

        for channel in &self.channels {
            match channel.notify(subject, content).await {
                Ok(()) => delivered = true,
                Err(e) => {
                    warn!("Channel {} failed for {}: {}", channel.channel(), subject, e);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if !delivered => Err(e),
            _ => Ok(()),
        }
    }
}
