use std::sync::Arc;

use crate::email::service::VerificationService;
use crate::email::types::{EmailError, SendEmailRequest, SendResult};

pub trait AppState: Clone + Send + Sync + 'static {
  fn send_verification(
    &self,
    route: &'static str,
    template: &'static str,
    req: SendEmailRequest,
  ) -> impl std::future::Future<Output = Result<SendResult, EmailError>> + Send;
}

#[derive(Clone)]
pub struct SharedAppState {
  pub verification_service: Arc<VerificationService>,
}

impl SharedAppState {
  pub fn new(verification_service: Arc<VerificationService>) -> Self {
    Self { verification_service }
  }
}

impl AppState for SharedAppState {
  async fn send_verification(
    &self,
    route: &'static str,
    template: &'static str,
    req: SendEmailRequest,
  ) -> Result<SendResult, EmailError> {
    let recipient = req.to.unwrap_or_default();
    let code = req.code.unwrap_or_default();

    self
      .verification_service
      .send_verification(route, &recipient, &code, template)
      .await
  }
}
