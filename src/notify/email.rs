use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, warn};

use crate::config::SmtpConfig;
use crate::traits::EmailSender;

/// SMTP transport over STARTTLS. Best-effort: any failure is logged and
/// reported as `false`, never raised.
pub struct SmtpEmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(15)))
            .build();

        let from: Mailbox = config
            .sender()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid smtp sender address: {}", e))?;

        Ok(Self { mailer, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> bool {
        let Ok(to_mailbox) = to.parse::<Mailbox>() else {
            warn!(to, "Refusing to send email to unparseable address");
            return false;
        };

        let message = match Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .body(body.to_string())
        {
            Ok(m) => m,
            Err(e) => {
                warn!("Failed to build email message: {}", e);
                return false;
            }
        };

        match self.mailer.send(message).await {
            Ok(_) => {
                debug!(to, subject, "Email accepted by SMTP relay");
                true
            }
            Err(e) => {
                warn!(to, "Email delivery failed: {}", e);
                false
            }
        }
    }
}
