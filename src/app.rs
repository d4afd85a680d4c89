use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, response::Html, routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::{
  email::rest::email_routes,
  middleware::rate_limit::{rate_limit_middleware, RateLimiter},
  state::SharedAppState,
};

const MAX_BODY_BYTES: usize = 200 * 1024;

pub fn create_app(state: SharedAppState, limiter: RateLimiter) -> Router {
  Router::new()
    .route("/", get(health_handler))
    .nest("/api", email_routes())
    .layer(from_fn_with_state(limiter, rate_limit_middleware))
    .layer(CorsLayer::permissive())
    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
    .with_state(state)
}

pub async fn health_handler() -> Html<String> {
  Html("<h1>verimail is running</h1>".to_string())
}
