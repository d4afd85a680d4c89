use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::transport::Mailer;
use super::types::{EmailError, OutboundMessage, SendResult};

/// Performs exactly one transmission per call, bounded by a deadline.
/// Deadline expiry surfaces as `SendTimeout`, distinct from `SendFailed`.
pub struct MailDispatcher {
  transport: Arc<dyn Mailer>,
  send_timeout: Duration,
}

impl MailDispatcher {
  pub fn new(transport: Arc<dyn Mailer>, send_timeout: Duration) -> Self {
    MailDispatcher {
      transport,
      send_timeout,
    }
  }

  pub async fn dispatch(&self, message: OutboundMessage) -> Result<SendResult, EmailError> {
    match timeout(self.send_timeout, self.transport.send(&message)).await {
      Ok(Ok(result)) => {
        tracing::info!(message_id = %result.message_id, to = %message.recipient, "email accepted by transport");
        Ok(result)
      }
      Ok(Err(err)) => {
        tracing::error!(error = %err, to = %message.recipient, "email delivery failed");
        Err(err)
      }
      Err(_) => {
        tracing::error!(
          to = %message.recipient,
          timeout_secs = self.send_timeout.as_secs(),
          "email delivery timed out"
        );
        Err(EmailError::SendTimeout)
      }
    }
  }
}
