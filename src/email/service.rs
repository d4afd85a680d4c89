use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use validator::ValidateEmail;

use super::dispatcher::MailDispatcher;
use super::template::TemplateRenderer;
use super::types::{EmailError, OutboundMessage, SendResult};
use crate::logging::{ErrorLog, ErrorLogEntry, RequestMeta};

pub const VERIFICATION_SUBJECT: &str = "Verify Your Email";

/// The sole entry point the HTTP layer calls: validates inputs, renders the
/// named template, dispatches one email, and appends a single sanitized log
/// entry for any failure past validation.
pub struct VerificationService {
  renderer: TemplateRenderer,
  dispatcher: MailDispatcher,
  error_log: Arc<dyn ErrorLog>,
}

impl VerificationService {
  pub fn new(renderer: TemplateRenderer, dispatcher: MailDispatcher, error_log: Arc<dyn ErrorLog>) -> Self {
    VerificationService {
      renderer,
      dispatcher,
      error_log,
    }
  }

  pub async fn send_verification(
    &self,
    route: &str,
    recipient: &str,
    code: &str,
    template_name: &str,
  ) -> Result<SendResult, EmailError> {
    if recipient.trim().is_empty() {
      return Err(EmailError::MissingRecipient);
    }
    if !recipient.validate_email() {
      return Err(EmailError::InvalidRecipient(recipient.to_string()));
    }
    if code.trim().is_empty() {
      return Err(EmailError::MissingCode);
    }
    if template_name.trim().is_empty() {
      return Err(EmailError::MissingTemplate);
    }

    let started = Instant::now();
    let result = self.render_and_dispatch(recipient, code, template_name).await;

    if let Err(err) = &result {
      let request = RequestMeta {
        template: template_name.to_string(),
        to_provided: true,
        code_provided: true,
      };
      self
        .error_log
        .append(ErrorLogEntry::new(route, started.elapsed(), err, request))
        .await;
    }

    result
  }

  async fn render_and_dispatch(
    &self,
    recipient: &str,
    code: &str,
    template_name: &str,
  ) -> Result<SendResult, EmailError> {
    let mut variables = HashMap::new();
    variables.insert("code".to_string(), code.to_string());
    variables.insert("recipient".to_string(), recipient.to_string());
    // Aliases the shipped templates reference.
    variables.insert("userPassword".to_string(), code.to_string());
    variables.insert("userEmail".to_string(), recipient.to_string());

    let html = self.renderer.render(template_name, &variables)?;
    let text = format!("Your verification code is: {}", code);

    let message = OutboundMessage {
      recipient: recipient.to_string(),
      subject: VERIFICATION_SUBJECT.to_string(),
      text,
      html,
    };

    self.dispatcher.dispatch(message).await
  }
}
