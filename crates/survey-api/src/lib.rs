//! HTTP surface for the citizen survey.
//!
//! Exposes an axum [`Router`] that accepts survey submissions and stores them
//! through any [`SurveyStore`]. CORS, hardening headers and per-client rate
//! limiting are applied here.

pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod security;

pub use config::ServerConfig;
pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  middleware,
  routing::{get, post},
};
use survey_core::{intake::SurveyIntake, store::SurveyStore};
use tower_http::trace::TraceLayer;

use rate_limit::RateLimiter;

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 100 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
///
/// Clones share the rate-limit counters, so every router built from one
/// state enforces a single limit per client.
pub struct AppState<S> {
  pub intake:  SurveyIntake<S>,
  pub config:  Arc<ServerConfig>,
  pub limiter: RateLimiter,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      intake:  self.intake.clone(),
      config:  Arc::clone(&self.config),
      limiter: self.limiter.clone(),
    }
  }
}

impl<S: SurveyStore> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    Self {
      intake:  SurveyIntake::new(store, config.anonymizer()),
      limiter: RateLimiter::per_minute(config.rate_limit_per_minute),
      config:  Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router, middleware included.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SurveyStore + 'static,
{
  let limiter = state.limiter.clone();
  let cors = security::cors_layer(&state.config.cors_origins());

  let app = Router::new()
    .route("/v1/health", get(handlers::health::handler))
    .route("/v1/survey", post(handlers::survey::submit::<S>))
    .fallback(handlers::not_found)
    .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
    .with_state(state)
    .layer(middleware::from_fn_with_state(limiter, rate_limit::rate_limit))
    .layer(cors);

  security::with_security_headers(app).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
