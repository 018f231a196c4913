//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use survey_core::{intake::IntakeError, validate::ValidationErrors};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The payload failed validation; reported field by field.
  #[error("invalid submission: {0}")]
  Validation(ValidationErrors),

  #[error("request body too large")]
  PayloadTooLarge,

  #[error("not found")]
  NotFound,

  /// Storage failed. Details are logged, never returned.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl<E> From<IntakeError<E>> for ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn from(e: IntakeError<E>) -> Self {
    match e {
      IntakeError::Validation(errors) => ApiError::Validation(errors),
      IntakeError::Store(e) => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(errors) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
      }
      ApiError::PayloadTooLarge => (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(json!({ "error": "request body too large" })),
      )
        .into_response(),
      ApiError::NotFound => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "failed to store survey response");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "ok": false }))).into_response()
      }
    }
  }
}
