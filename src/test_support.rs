use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::email::dispatcher::MailDispatcher;
use crate::email::service::VerificationService;
use crate::email::template::TemplateRenderer;
use crate::email::transport::Mailer;
use crate::email::types::{EmailError, OutboundMessage, SendResult};
use crate::logging::MemoryErrorLog;

pub enum MockBehavior {
  Succeed,
  Fail,
  Hang,
}

/// Transport double: counts calls and captures the last message.
pub struct MockMailer {
  behavior: MockBehavior,
  calls: AtomicUsize,
  last_message: Mutex<Option<OutboundMessage>>,
}

impl MockMailer {
  pub const MESSAGE_ID: &'static str = "<mock-id@example.com>";

  fn with_behavior(behavior: MockBehavior) -> Arc<Self> {
    Arc::new(MockMailer {
      behavior,
      calls: AtomicUsize::new(0),
      last_message: Mutex::new(None),
    })
  }

  pub fn succeeding() -> Arc<Self> {
    Self::with_behavior(MockBehavior::Succeed)
  }

  pub fn failing() -> Arc<Self> {
    Self::with_behavior(MockBehavior::Fail)
  }

  pub fn hanging() -> Arc<Self> {
    Self::with_behavior(MockBehavior::Hang)
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn last_message(&self) -> Option<OutboundMessage> {
    self.last_message.lock().expect("lock mock state").clone()
  }
}

#[async_trait]
impl Mailer for MockMailer {
  async fn send(&self, message: &OutboundMessage) -> Result<SendResult, EmailError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    *self.last_message.lock().expect("lock mock state") = Some(message.clone());

    match self.behavior {
      MockBehavior::Succeed => Ok(SendResult {
        message_id: Self::MESSAGE_ID.to_string(),
        accepted: vec![message.recipient.clone()],
        rejected: Vec::new(),
        response: "250 2.0.0 OK".to_string(),
      }),
      MockBehavior::Fail => Err(EmailError::SendFailed("mock transport rejected the message".to_string())),
      MockBehavior::Hang => {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Err(EmailError::SendFailed("mock transport never responded".to_string()))
      }
    }
  }

  async fn verify(&self) -> Result<(), EmailError> {
    Ok(())
  }
}

/// Renderer backed by a throwaway template directory. Tera compiles templates
/// into memory, so the directory does not need to outlive the renderer.
pub fn test_renderer() -> TemplateRenderer {
  let dir = tempfile::tempdir().expect("create temp templates dir");
  let templates = [
    (
      "Confirmation.html",
      "<p>Your code is {{userPassword}} for {{userEmail}}</p>",
    ),
    ("CompanyPassword.html", "<p>Company code: {{code}}</p>"),
    ("AgentPassword.html", "<p>Agent code: {{code}}</p>"),
  ];
  for (name, body) in templates {
    std::fs::write(dir.path().join(name), body).expect("write template");
  }
  TemplateRenderer::new(dir.path()).expect("load templates")
}

pub fn service_with(
  mailer: Arc<MockMailer>,
  error_log: Arc<MemoryErrorLog>,
  send_timeout: Duration,
) -> VerificationService {
  let dispatcher = MailDispatcher::new(mailer, send_timeout);
  VerificationService::new(test_renderer(), dispatcher, error_log)
}
