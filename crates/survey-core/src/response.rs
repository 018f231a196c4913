//! The record persisted for every accepted submission.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::validate::SurveySubmission;

/// Input to [`SurveyStore::insert_response`](crate::store::SurveyStore::insert_response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSurveyResponse {
  pub submission: SurveySubmission,
  /// Raw `User-Agent` header, stored as received.
  pub user_agent: Option<String>,
  /// Salted address hash; see [`crate::anonymize`].
  pub ip_hash:    Option<String>,
}

/// A response row as stored. Rows are append-only and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSurveyResponse {
  pub response_id: Uuid,
  pub created_at:  DateTime<Utc>,
  #[serde(flatten)]
  pub submission:  SurveySubmission,
  pub user_agent:  Option<String>,
  pub ip_hash:     Option<String>,
}

impl StoredSurveyResponse {
  /// Assign identity and timestamp to a new response.
  pub fn new(input: NewSurveyResponse) -> Self {
    Self {
      response_id: Uuid::new_v4(),
      created_at:  Utc::now(),
      submission:  input.submission,
      user_agent:  input.user_agent,
      ip_hash:     input.ip_hash,
    }
  }
}
