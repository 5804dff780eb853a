//! SMTP delivery for composed campaigns.
//!
//! Implements the core `MailTransport` seam with lettre's async SMTP
//! transport: STARTTLS relay, credential login, plain-text bodies. The
//! health check performs a connection test without delivering anything.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::debug;

use tavolo_core::config::SmtpConfig;
use tavolo_core::dispatch::MailTransport;
use tavolo_core::errors::MailError;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport from configuration. Fails with
    /// `MailError::Configuration` when the host, credentials, or sender
    /// address are unusable; no connection is attempted yet.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let host = config.host.trim();
        if host.is_empty() {
            return Err(MailError::Configuration("smtp.host is not set".to_string()));
        }
        if config.username.trim().is_empty() {
            return Err(MailError::Configuration("smtp.username is not set".to_string()));
        }

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|error| {
                MailError::Configuration(format!("invalid smtp relay `{host}`: {error}"))
            })?
            .port(config.port)
            .credentials(credentials)
            .build();

        let from = sender_mailbox(config)?;
        Ok(Self { transport, from })
    }
}

fn sender_mailbox(config: &SmtpConfig) -> Result<Mailbox, MailError> {
    let address = config.sender_address();
    let rendered = match config.from_name.as_deref().filter(|name| !name.trim().is_empty()) {
        Some(name) => format!("{name} <{address}>"),
        None => address.to_string(),
    };
    rendered.parse().map_err(|error| {
        MailError::Configuration(format!("invalid sender address `{address}`: {error}"))
    })
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let recipient: Mailbox =
            to.parse().map_err(|_| MailError::InvalidAddress(to.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|error| MailError::Transport(format!("failed to build message: {error}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|error| MailError::Transport(error.to_string()))?;

        debug!(event_name = "crm.mail.sent", to, "message handed to smtp relay");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), MailError> {
        let reachable = self
            .transport
            .test_connection()
            .await
            .map_err(|error| MailError::Transport(error.to_string()))?;
        if reachable {
            Ok(())
        } else {
            Err(MailError::Transport("smtp relay refused the connection test".to_string()))
        }
    }
}
