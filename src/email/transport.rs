#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::types::{EmailError, OutboundMessage, SendResult};
use crate::config::SmtpConfig;

/// An authenticated outbound mail capability. The production implementation
/// speaks SMTP; tests substitute their own.
#[async_trait]
pub trait Mailer: Send + Sync {
  async fn send(&self, message: &OutboundMessage) -> Result<SendResult, EmailError>;
  async fn verify(&self) -> Result<(), EmailError>;
}

/// SMTP mailer over lettre. The underlying transport is constructed lazily,
/// exactly once per process, guarded by a `OnceCell` so concurrent first
/// sends cannot race duplicate constructions.
pub struct SmtpMailer {
  config: SmtpConfig,
  transport: OnceCell<AsyncSmtpTransport<Tokio1Executor>>,
  #[cfg(test)]
  builds: AtomicUsize,
}

impl SmtpMailer {
  pub fn new(config: SmtpConfig) -> Self {
    SmtpMailer {
      config,
      transport: OnceCell::new(),
      #[cfg(test)]
      builds: AtomicUsize::new(0),
    }
  }

  async fn transport(&self) -> Result<&AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    self.transport.get_or_try_init(|| async { self.build_transport() }).await
  }

  fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
    #[cfg(test)]
    self.builds.fetch_add(1, Ordering::SeqCst);

    let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());

    // Plaintext is only acceptable against local development relays.
    let builder = if self.config.host == "localhost" || self.config.host == "mailhog" {
      AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
    } else if self.config.secure {
      AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
        .map_err(|e| EmailError::TransportInit(self.scrub(&e.to_string())))?
    } else if self.config.require_tls {
      AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
        .map_err(|e| EmailError::TransportInit(self.scrub(&e.to_string())))?
    } else {
      let tls = TlsParameters::new(self.config.host.clone())
        .map_err(|e| EmailError::TransportInit(self.scrub(&e.to_string())))?;
      AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host).tls(Tls::Opportunistic(tls))
    };

    Ok(builder.credentials(creds).port(self.config.port).build())
  }

  /// Strips configured credentials out of transport error text before it can
  /// reach a log entry or an error value.
  fn scrub(&self, text: &str) -> String {
    let mut out = text.to_string();
    for secret in [&self.config.password, &self.config.username] {
      if !secret.is_empty() {
        out = out.replace(secret.as_str(), "[redacted]");
      }
    }
    out
  }

  #[cfg(test)]
  pub(crate) fn build_count(&self) -> usize {
    self.builds.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Mailer for SmtpMailer {
  async fn send(&self, message: &OutboundMessage) -> Result<SendResult, EmailError> {
    let from = self
      .config
      .from_email
      .parse::<Mailbox>()
      .map_err(|e| EmailError::TransportInit(format!("invalid sender address: {}", e)))?;
    let reply_to = self
      .config
      .reply_to
      .parse::<Mailbox>()
      .map_err(|e| EmailError::TransportInit(format!("invalid reply-to address: {}", e)))?;
    let to = message
      .recipient
      .parse::<Mailbox>()
      .map_err(|_| EmailError::InvalidRecipient(message.recipient.clone()))?;

    // The SMTP response carries no server-assigned id, so generate one and
    // pin it as the Message-ID header.
    let domain = self.config.from_email.split('@').next_back().unwrap_or("localhost");
    let message_id = format!("<{}@{}>", Uuid::new_v4(), domain);

    let email = Message::builder()
      .from(from)
      .reply_to(reply_to)
      .to(to)
      .subject(message.subject.clone())
      .message_id(Some(message_id.clone()))
      .multipart(MultiPart::alternative_plain_html(
        message.text.clone(),
        message.html.clone(),
      ))
      .map_err(|e| EmailError::SendFailed(self.scrub(&e.to_string())))?;

    let transport = self.transport().await?;
    let response = transport
      .send(email)
      .await
      .map_err(|e| EmailError::SendFailed(self.scrub(&e.to_string())))?;

    Ok(SendResult {
      message_id,
      accepted: vec![message.recipient.clone()],
      rejected: Vec::new(),
      response: format!("{:?}", response),
    })
  }

  async fn verify(&self) -> Result<(), EmailError> {
    let transport = self.transport().await?;
    match transport.test_connection().await {
      Ok(true) => Ok(()),
      Ok(false) => Err(EmailError::TransportVerify(
        "smtp server rejected the connection check".to_string(),
      )),
      Err(e) => Err(EmailError::TransportVerify(self.scrub(&e.to_string()))),
    }
  }
}
