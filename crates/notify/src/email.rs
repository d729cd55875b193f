use async_trait::async_trait;
use bolsa_core::notify::error::NotifyError;
use bolsa_core::notify::port::Notifier;
use lettre::message::{Mailbox, Message, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::time::Duration;

/// # Summary
/// A notifier implementation that sends messages via SMTP (e.g., Gmail, QQ Mail).
///
/// # Invariants
/// - Requires valid SMTP credentials and server configuration.
/// - The `AsyncSmtpTransport` is reused for multiple notifications.
/// - Addresses are parsed once at construction.
pub struct EmailNotifier {
    /// The asynchronous SMTP transport.
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    /// The sender's mailbox.
    from: Mailbox,
    /// The recipient's mailbox.
    to: Mailbox,
}

impl EmailNotifier {
    /// # Summary
    /// Creates a new `EmailNotifier`.
    ///
    /// # Logic
    /// 1. Parses sender and recipient addresses.
    /// 2. Sets up the SMTP credentials.
    /// 3. Configures the relay transport with TLS, authentication and a send timeout.
    ///
    /// # Arguments
    /// * `host` - The SMTP server host (e.g., "smtp.gmail.com").
    /// * `user` - The SMTP username (email address).
    /// * `pass` - The SMTP password or app-specific password.
    /// * `from` - The sender's email address.
    /// * `to` - The recipient's email address.
    /// * `timeout` - Upper bound for one SMTP exchange.
    ///
    /// # Returns
    /// * A new instance of `EmailNotifier` or `NotifyError`.
    pub fn new(
        host: &str,
        user: &str,
        pass: &str,
        from: &str,
        to: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Config(format!("Invalid from address: {}", e)))?;
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Config(format!("Invalid to address: {}", e)))?;
        let creds = Credentials::new(user.to_string(), pass.to_string());

        // Use default submission port 587 with STARTTLS
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| NotifyError::Config(format!("Invalid SMTP host: {}", e)))?
            .credentials(creds)
            .timeout(Some(timeout))
            .build();

        Ok(Self { mailer, from, to })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &str {
        "email"
    }

    /// # Summary
    /// Sends a notification email.
    ///
    /// # Logic
    /// 1. Builds an email message with the subject and content.
    /// 2. Sets the Content-Type to plain text.
    /// 3. Sends the email using the configured SMTP transport.
    async fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(format!("Stock alert: {}", subject))
            .header(ContentType::TEXT_PLAIN)
            .body(content.to_string())
            .map_err(|e| NotifyError::Platform(format!("Failed to build email: {}", e)))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Network(format!("SMTP error: {}", e)))?;

        Ok(())
    }
}
