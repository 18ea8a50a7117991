mod message;
mod transport;
use std::fmt::Debug;

pub use message::ComposeError;
pub use message::EmailMessage;
pub use transport::send;
pub use transport::SmtpCommands;
pub use transport::SmtpSession;
pub use transport::SmtpTransport;
pub use transport::TransportError;

use crate::domain::Rate;
use crate::domain::SubscriberEmail;
use crate::utils::error_chain_fmt;

/// Where composed messages go
#[derive(Debug)]
pub enum EmailBackend {
    /// A fresh TLS session per send, never pooled
    Smtp(SmtpTransport),
    /// Nothing leaves the process; the serialized message is logged
    Log,
}

#[derive(thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Debug for SendError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Sends the current rate to subscribers: one message, all subscribers as
/// recipients.
#[derive(Debug)]
pub struct EmailClient {
    sender: SubscriberEmail,
    subject_template: String,
    body_template: String,
    backend: EmailBackend,
}

impl EmailClient {
    pub fn new(
        sender: SubscriberEmail,
        subject_template: String,
        body_template: String,
        backend: EmailBackend,
    ) -> Self {
        Self {
            sender,
            subject_template,
            body_template,
            backend,
        }
    }

    pub fn backend(&self) -> &EmailBackend { &self.backend }

    #[tracing::instrument(
        name = "Sending exchange rate",
        skip(self, subscribers),
        fields(rate = %rate, recipients = subscribers.len())
    )]
    pub async fn send_exchange_rate(
        &self,
        rate: Rate,
        subscribers: Vec<SubscriberEmail>,
    ) -> Result<(), SendError> {
        let message = EmailMessage::compose(
            self.sender.clone(),
            subscribers,
            &self.subject_template,
            &self.body_template,
            rate,
        )?;

        match &self.backend {
            EmailBackend::Smtp(transport) => {
                let mut session = transport.connect().await?;
                send(&mut session, &message).await?;
            }
            EmailBackend::Log => tracing::info!(
                email = %String::from_utf8_lossy(&message.serialize()),
                "log backend, email not sent"
            ),
        }
        Ok(())
    }
}
