//! Per-client request ceiling.
//!
//! Fixed one-minute windows keyed by client address. Requests over the limit
//! are answered with 429 before any handler runs.

use std::{
  collections::HashMap,
  sync::Arc,
  time::{Duration, Instant},
};

use axum::{
  Json,
  extract::{Request, State},
  http::{HeaderName, HeaderValue, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tokio::sync::Mutex;

use crate::client::Client;

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Bucket shared by requests whose address cannot be determined.
const UNKNOWN_CLIENT: &str = "unknown";

/// Expired windows are purged once the table grows past this many keys.
const PURGE_THRESHOLD: usize = 4096;

#[derive(Debug)]
struct Window {
  started: Instant,
  count:   u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allowed { remaining: u32, reset: Duration },
  Limited { retry_after: Duration },
}

#[derive(Clone)]
pub struct RateLimiter {
  limit:   u32,
  window:  Duration,
  windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
  pub fn per_minute(limit: u32) -> Self { Self::new(limit, Duration::from_secs(60)) }

  pub fn new(limit: u32, window: Duration) -> Self {
    Self {
      limit,
      window,
      windows: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  pub fn limit(&self) -> u32 { self.limit }

  /// Count one request for `key`.
  pub async fn check(&self, key: &str) -> Decision { self.check_at(key, Instant::now()).await }

  async fn check_at(&self, key: &str, now: Instant) -> Decision {
    let mut windows = self.windows.lock().await;

    if windows.len() >= PURGE_THRESHOLD && !windows.contains_key(key) {
      let window = self.window;
      windows.retain(|_, w| now.duration_since(w.started) < window);
    }

    let entry = windows.entry(key.to_owned()).or_insert(Window { started: now, count: 0 });
    if now.duration_since(entry.started) >= self.window {
      *entry = Window { started: now, count: 0 };
    }

    let reset = self.window.saturating_sub(now.duration_since(entry.started));
    if entry.count >= self.limit {
      return Decision::Limited { retry_after: reset };
    }
    entry.count += 1;
    Decision::Allowed { remaining: self.limit - entry.count, reset }
  }
}

/// `axum` middleware; install with `from_fn_with_state`.
pub async fn rate_limit(
  State(limiter): State<RateLimiter>,
  Client(client): Client,
  request: Request,
  next: Next,
) -> Response {
  let key = client.address.as_deref().unwrap_or(UNKNOWN_CLIENT);

  match limiter.check(key).await {
    Decision::Allowed { remaining, reset } => {
      let mut response = next.run(request).await;
      set_headers(&mut response, limiter.limit(), remaining, reset);
      response
    }
    Decision::Limited { retry_after } => {
      tracing::warn!("rate limit exceeded");
      let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "Too many requests, please try again later." })),
      )
        .into_response();
      set_headers(&mut response, limiter.limit(), 0, retry_after);
      response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(ceil_secs(retry_after)));
      response
    }
  }
}

fn set_headers(response: &mut Response, limit: u32, remaining: u32, reset: Duration) {
  let headers = response.headers_mut();
  headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
  headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
  headers.insert(RATELIMIT_RESET, HeaderValue::from(ceil_secs(reset)));
}

fn ceil_secs(d: Duration) -> u64 {
  d.as_secs() + u64::from(d.subsec_nanos() > 0)
}
