//! Handler for `POST /v1/survey`.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use serde_json::{Value, json};
use survey_core::{
  store::SurveyStore,
  validate::{BODY_PATH, ValidationErrors},
};

use crate::{AppState, client::Client, error::ApiError};

/// `POST /v1/survey`: returns 201 `{"ok":true}` once the row is written.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Client(client): Client,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SurveyStore + 'static,
{
  let Json(raw) = payload.map_err(rejection_to_error)?;
  state.intake.submit(&raw, client).await?;
  Ok((StatusCode::CREATED, Json(json!({ "ok": true }))))
}

/// Map body extraction failures onto the validation error shape.
fn rejection_to_error(rejection: JsonRejection) -> ApiError {
  if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
    return ApiError::PayloadTooLarge;
  }
  let message = match &rejection {
    JsonRejection::MissingJsonContentType(_) => {
      "Expected request with `Content-Type: application/json`".to_owned()
    }
    _ => rejection.body_text(),
  };
  ApiError::Validation(ValidationErrors::single(BODY_PATH, message))
}
