use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;

use crate::email::types::EmailError;

#[derive(Debug)]
pub struct AppError {
  pub status_code: StatusCode,
  pub message: String,
}

impl AppError {
  pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
    Self {
      status_code,
      message: message.into(),
    }
  }

  pub fn bad_request(message: impl Into<String>) -> Self {
    Self::new(StatusCode::BAD_REQUEST, message)
  }

  pub fn too_many_requests(message: impl Into<String>) -> Self {
    Self::new(StatusCode::TOO_MANY_REQUESTS, message)
  }

  pub fn internal_server_error(message: impl Into<String>) -> Self {
    Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let body = Json(json!({
      "error": self.message,
      "status_code": self.status_code.as_u16(),
    }));

    (self.status_code, body).into_response()
  }
}

impl From<EmailError> for AppError {
  fn from(error: EmailError) -> Self {
    if error.is_client_error() {
      return AppError::bad_request(error.to_string());
    }

    // Anything past validation stays generic at the boundary; the real cause
    // goes to tracing and the error log sink only.
    tracing::error!(error = %error, "send email request failed");
    AppError::internal_server_error("Failed to send email")
  }
}
