use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
  extract::{ConnectInfo, Request, State},
  middleware::Next,
  response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::error::AppError;

/// Fixed-window request limiter keyed by client address.
#[derive(Clone)]
pub struct RateLimiter {
  window: Duration,
  max_requests: u32,
  hits: Arc<Mutex<HashMap<IpAddr, WindowState>>>,
}

struct WindowState {
  started: Instant,
  count: u32,
}

impl RateLimiter {
  pub fn new(config: &RateLimitConfig) -> Self {
    RateLimiter {
      window: config.window,
      max_requests: config.max_requests,
      hits: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  pub fn check(&self, client: IpAddr) -> bool {
    let now = Instant::now();
    let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());

    // Expired windows are dropped wholesale so the map never accumulates
    // clients that stopped sending.
    hits.retain(|_, state| now.duration_since(state.started) < self.window);

    let state = hits.entry(client).or_insert(WindowState { started: now, count: 0 });
    state.count += 1;
    state.count <= self.max_requests
  }

  #[cfg(test)]
  pub(crate) fn tracked_clients(&self) -> usize {
    self.hits.lock().unwrap_or_else(|e| e.into_inner()).len()
  }
}

pub async fn rate_limit_middleware(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
  let client = request
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|info| info.0.ip())
    .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

  if !limiter.check(client) {
    return AppError::too_many_requests("Too many requests").into_response();
  }

  next.run(request).await
}
