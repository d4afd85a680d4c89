use axum::{
  extract::{Json, State},
  response::Json as JsonResponse,
  routing::{post, Router},
};

use super::types::{SendEmailRequest, SendEmailResponse};
use crate::error::AppError;
use crate::state::{AppState, SharedAppState};

const COMPANY_PASSWORD_TEMPLATE: &str = "CompanyPassword.html";
const AGENT_PASSWORD_TEMPLATE: &str = "AgentPassword.html";
const CONFIRMATION_TEMPLATE: &str = "Confirmation.html";

pub fn email_routes() -> Router<SharedAppState> {
  Router::new()
    .route("/send-email", post(send_email_handler))
    .route("/send-email-agent", post(send_email_agent_handler))
    .route("/confirmation-mail-password", post(confirmation_mail_handler))
}

pub async fn send_email_handler(
  State(state): State<SharedAppState>,
  Json(payload): Json<SendEmailRequest>,
) -> Result<JsonResponse<SendEmailResponse>, AppError> {
  send_with_template(&state, "/api/send-email", COMPANY_PASSWORD_TEMPLATE, payload).await
}

pub async fn send_email_agent_handler(
  State(state): State<SharedAppState>,
  Json(payload): Json<SendEmailRequest>,
) -> Result<JsonResponse<SendEmailResponse>, AppError> {
  send_with_template(&state, "/api/send-email-agent", AGENT_PASSWORD_TEMPLATE, payload).await
}

pub async fn confirmation_mail_handler(
  State(state): State<SharedAppState>,
  Json(payload): Json<SendEmailRequest>,
) -> Result<JsonResponse<SendEmailResponse>, AppError> {
  send_with_template(&state, "/api/confirmation-mail-password", CONFIRMATION_TEMPLATE, payload).await
}

async fn send_with_template(
  state: &SharedAppState,
  route: &'static str,
  template: &'static str,
  payload: SendEmailRequest,
) -> Result<JsonResponse<SendEmailResponse>, AppError> {
  let result = state.send_verification(route, template, payload).await?;

  Ok(JsonResponse(SendEmailResponse {
    ok: true,
    message_id: result.message_id,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::app::create_app;
  use crate::config::RateLimitConfig;
  use crate::logging::MemoryErrorLog;
  use crate::middleware::rate_limit::RateLimiter;
  use crate::test_support::{service_with, MockMailer};
  use axum::body::Body;
  use axum::http::{Request, StatusCode};
  use std::sync::Arc;
  use std::time::Duration;
  use tower::ServiceExt;

  fn app_with(mailer: Arc<MockMailer>, log: Arc<MemoryErrorLog>) -> Router {
    let service = service_with(mailer, log, Duration::from_secs(5));
    let state = SharedAppState::new(Arc::new(service));
    let limiter = RateLimiter::new(&RateLimitConfig {
      window: Duration::from_secs(60),
      max_requests: 1000,
    });
    create_app(state, limiter)
  }

  async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
      .method("POST")
      .uri(uri)
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .expect("build request");

    let response = app.oneshot(request).await.expect("handle request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .expect("read response body");
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
  }

  #[tokio::test]
  async fn send_email_returns_message_id() {
    let mailer = MockMailer::succeeding();
    let app = app_with(mailer.clone(), Arc::new(MemoryErrorLog::new()));

    let (status, body) = post_json(
      app,
      "/api/send-email",
      serde_json::json!({ "to": "a@b.com", "code": "123456" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["messageId"], MockMailer::MESSAGE_ID);
    assert_eq!(mailer.call_count(), 1);
  }

  #[tokio::test]
  async fn each_route_binds_its_own_template() {
    let cases = [
      ("/api/send-email", "Company code:"),
      ("/api/send-email-agent", "Agent code:"),
      ("/api/confirmation-mail-password", "Your code is"),
    ];

    for (uri, marker) in cases {
      let mailer = MockMailer::succeeding();
      let app = app_with(mailer.clone(), Arc::new(MemoryErrorLog::new()));

      let (status, _) = post_json(app, uri, serde_json::json!({ "to": "a@b.com", "code": "42" })).await;

      assert_eq!(status, StatusCode::OK, "{} should accept the request", uri);
      let sent = mailer.last_message().expect("message captured");
      assert!(sent.html.contains(marker), "{} should render its template", uri);
    }
  }

  #[tokio::test]
  async fn missing_recipient_is_bad_request() {
    let mailer = MockMailer::succeeding();
    let app = app_with(mailer.clone(), Arc::new(MemoryErrorLog::new()));

    let (status, body) = post_json(app, "/api/send-email", serde_json::json!({ "code": "123456" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing recipient: provide 'to'.");
    assert_eq!(mailer.call_count(), 0);
  }

  #[tokio::test]
  async fn transport_failure_is_generic_500() {
    let log = Arc::new(MemoryErrorLog::new());
    let app = app_with(MockMailer::failing(), log.clone());

    let (status, body) = post_json(
      app,
      "/api/send-email",
      serde_json::json!({ "to": "a@b.com", "code": "123456" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to send email");

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].route, "/api/send-email");
  }
}
