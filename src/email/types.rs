use std::error::Error;

use serde::{Deserialize, Serialize};

/// One outgoing email. Sender and reply-to are fixed by configuration inside
/// the transport and are deliberately absent here.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
  pub recipient: String,
  pub subject: String,
  pub text: String,
  pub html: String,
}

#[derive(Debug, Clone)]
pub struct SendResult {
  pub message_id: String,
  pub accepted: Vec<String>,
  pub rejected: Vec<String>,
  pub response: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SendEmailRequest {
  pub to: Option<String>,
  pub code: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SendEmailResponse {
  pub ok: bool,
  #[serde(rename = "messageId")]
  pub message_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmailError {
  MissingRecipient,
  InvalidRecipient(String),
  MissingCode,
  MissingTemplate,
  TransportInit(String),
  TransportVerify(String),
  TemplateNotFound(String),
  TemplateRender(String),
  SendFailed(String),
  SendTimeout,
}

impl Error for EmailError {}

impl std::fmt::Display for EmailError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      EmailError::MissingRecipient => write!(f, "Missing recipient: provide 'to'."),
      EmailError::InvalidRecipient(addr) => write!(f, "Invalid recipient address: {}", addr),
      EmailError::MissingCode => write!(f, "Missing verification code: provide 'code'."),
      EmailError::MissingTemplate => write!(f, "Missing template name."),
      EmailError::TransportInit(msg) => write!(f, "Transport initialization failed: {}", msg),
      EmailError::TransportVerify(msg) => write!(f, "Transport verification failed: {}", msg),
      EmailError::TemplateNotFound(name) => write!(f, "Template '{}' not found", name),
      EmailError::TemplateRender(msg) => write!(f, "Template rendering failed: {}", msg),
      EmailError::SendFailed(msg) => write!(f, "Email delivery failed: {}", msg),
      EmailError::SendTimeout => write!(f, "Email delivery timed out"),
    }
  }
}

impl EmailError {
  /// Stable variant name used in structured log entries.
  pub fn name(&self) -> &'static str {
    match self {
      EmailError::MissingRecipient => "MissingRecipient",
      EmailError::InvalidRecipient(_) => "InvalidRecipient",
      EmailError::MissingCode => "MissingCode",
      EmailError::MissingTemplate => "MissingTemplate",
      EmailError::TransportInit(_) => "TransportInit",
      EmailError::TransportVerify(_) => "TransportVerify",
      EmailError::TemplateNotFound(_) => "TemplateNotFound",
      EmailError::TemplateRender(_) => "TemplateRender",
      EmailError::SendFailed(_) => "SendFailed",
      EmailError::SendTimeout => "SendTimeout",
    }
  }

  /// Precondition failures the caller can fix; these map to 400-class
  /// responses and never reach the transport or the error log.
  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      EmailError::MissingRecipient
        | EmailError::InvalidRecipient(_)
        | EmailError::MissingCode
        | EmailError::MissingTemplate
    )
  }
}
