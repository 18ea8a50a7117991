use std::fmt::Debug;
use std::time::Duration;

use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::authentication::Mechanism;
use lettre::transport::smtp::client::AsyncSmtpConnection;
use lettre::transport::smtp::client::TlsParameters;
use lettre::transport::smtp::commands::Data;
use lettre::transport::smtp::commands::Mail;
use lettre::transport::smtp::commands::Rcpt;
use lettre::transport::smtp::extension::ClientId;
use lettre::Address;
use secrecy::ExposeSecret;
use secrecy::Secret;

use super::EmailMessage;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum TransportError {
    #[error("could not connect to {address}")]
    Connect {
        address: String,
        #[source]
        source: lettre::transport::smtp::Error,
    },
    #[error("SMTP authentication failed")]
    Authenticate(#[source] lettre::transport::smtp::Error),
    #[error("MAIL FROM <{0}> failed")]
    MailFrom(String, #[source] anyhow::Error),
    #[error("RCPT TO <{0}> failed")]
    RcptTo(String, #[source] anyhow::Error),
    #[error("DATA failed")]
    Data(#[source] anyhow::Error),
}

impl Debug for TransportError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// The part of an SMTP client that `send` drives. Each call is one round
/// trip; a negative reply from the server is an `Err`.
#[allow(async_fn_in_trait)]
pub trait SmtpCommands {
    async fn mail(
        &mut self,
        from: &str,
    ) -> Result<(), anyhow::Error>;

    async fn rcpt(
        &mut self,
        to: &str,
    ) -> Result<(), anyhow::Error>;

    /// `DATA`, write `message`, then close the data stream (the terminating
    /// `.`), which is when the server accepts or rejects the transaction
    async fn data(
        &mut self,
        message: &[u8],
    ) -> Result<(), anyhow::Error>;

    async fn quit(&mut self) -> Result<(), anyhow::Error>;
}

/// An authenticated connection to the mail server, owned by a single send
pub struct SmtpSession(AsyncSmtpConnection);

impl SmtpCommands for SmtpSession {
    async fn mail(
        &mut self,
        from: &str,
    ) -> Result<(), anyhow::Error> {
        let from: Address = from.parse()?;
        self.0.command(Mail::new(Some(from), vec![])).await?;
        Ok(())
    }

    async fn rcpt(
        &mut self,
        to: &str,
    ) -> Result<(), anyhow::Error> {
        let to: Address = to.parse()?;
        self.0.command(Rcpt::new(to, vec![])).await?;
        Ok(())
    }

    async fn data(
        &mut self,
        message: &[u8],
    ) -> Result<(), anyhow::Error> {
        self.0.command(Data).await?;
        // dot-stuffs the message and writes the terminating `.`
        self.0.message(message).await?;
        Ok(())
    }

    async fn quit(&mut self) -> Result<(), anyhow::Error> {
        self.0.quit().await?;
        Ok(())
    }
}

/// Connection details for an SMTP server that speaks TLS from the first byte
/// (smtps). The certificate is always verified against `host`.
#[derive(Debug)]
pub struct SmtpTransport {
    host: String,
    port: u16,
    username: String,
    password: Secret<String>,
    timeout: Duration,
}

impl SmtpTransport {
    pub fn new(
        host: String,
        port: u16,
        username: String,
        password: Secret<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            host,
            port,
            username,
            password,
            timeout,
        }
    }

    fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

    /// Dial, wrap in TLS, greet and authenticate. Nothing is returned unless
    /// every step succeeded.
    #[tracing::instrument(name = "Connecting to SMTP server", skip(self), fields(address = %self.address()))]
    pub async fn connect(&self) -> Result<SmtpSession, TransportError> {
        let connect_error = |source| TransportError::Connect {
            address: self.address(),
            source,
        };

        let tls = TlsParameters::new(self.host.clone()).map_err(connect_error)?;
        let hello = ClientId::Domain("localhost".to_string());
        let mut conn = AsyncSmtpConnection::connect_tokio1(
            (self.host.clone(), self.port),
            Some(self.timeout),
            &hello,
            Some(tls),
            None,
        )
        .await
        .map_err(connect_error)?;

        let credentials = Credentials::new(
            self.username.clone(),
            self.password.expose_secret().clone(),
        );
        conn.auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .await
            .map_err(TransportError::Authenticate)?;

        Ok(SmtpSession(conn))
    }
}

/// Run one mail transaction: `MAIL FROM`, `RCPT TO` for each recipient in
/// order, `DATA`, `QUIT`.
///
/// The first failing step ends the transaction and its error is returned as
/// is; recipients accepted before a rejected one are not reset. With no
/// recipients, `DATA` is never issued and the send counts as a success.
/// Once `DATA` has been accepted the message is delivered, so a failing `QUIT`
/// is only logged.
#[tracing::instrument(name = "Running SMTP transaction", skip_all, fields(recipients = message.to.len()))]
pub async fn send<S: SmtpCommands>(
    session: &mut S,
    message: &EmailMessage,
) -> Result<(), TransportError> {
    session
        .mail(message.from.as_ref())
        .await
        .map_err(|e| TransportError::MailFrom(message.from.to_string(), e))?;

    for to in &message.to {
        session
            .rcpt(to.as_ref())
            .await
            .map_err(|e| TransportError::RcptTo(to.to_string(), e))?;
    }

    if message.to.is_empty() {
        tracing::info!("no recipients, skipping DATA");
    } else {
        session
            .data(&message.serialize())
            .await
            .map_err(TransportError::Data)?;
    }

    if let Err(e) = session.quit().await {
        tracing::warn!(error.cause_chain = ?e, "QUIT failed");
    }
    Ok(())
}
