//! The intake pipeline: validate → normalise → anonymise → persist.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::{
  anonymize::AddressAnonymizer,
  response::{NewSurveyResponse, StoredSurveyResponse},
  store::SurveyStore,
  validate::{SurveySubmission, ValidationErrors, validate},
};

/// What the transport layer knows about the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
  /// Best-effort client address; `None` when it cannot be determined.
  pub address:    Option<String>,
  pub user_agent: Option<String>,
}

#[derive(Debug, Error)]
pub enum IntakeError<E> {
  /// The payload was rejected. Nothing was written.
  #[error("invalid submission: {0}")]
  Validation(ValidationErrors),

  /// The store failed. Nothing was written.
  #[error("store error: {0}")]
  Store(#[source] E),
}

/// One intake per process; cheap to clone.
pub struct SurveyIntake<S> {
  store:      Arc<S>,
  anonymizer: AddressAnonymizer,
}

impl<S> Clone for SurveyIntake<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      anonymizer: self.anonymizer.clone(),
    }
  }
}

impl<S: SurveyStore> SurveyIntake<S> {
  pub fn new(store: Arc<S>, anonymizer: AddressAnonymizer) -> Self {
    Self { store, anonymizer }
  }

  pub fn anonymizer(&self) -> &AddressAnonymizer { &self.anonymizer }

  /// Salted hash of `ip`; `None` when the address is unknown.
  pub fn anonymize_address(&self, ip: Option<&str>) -> Option<String> {
    self.anonymizer.anonymize(ip)
  }

  /// Write one row. No retries.
  pub async fn persist(
    &self,
    submission: SurveySubmission,
    ip_hash:    Option<String>,
    user_agent: Option<String>,
  ) -> Result<StoredSurveyResponse, S::Error> {
    self
      .store
      .insert_response(NewSurveyResponse { submission, user_agent, ip_hash })
      .await
  }

  /// Run the whole pipeline for one request.
  pub async fn submit(
    &self,
    raw:    &Value,
    client: ClientInfo,
  ) -> Result<StoredSurveyResponse, IntakeError<S::Error>> {
    let submission = validate(raw).map_err(|errors| {
      let fields: Vec<&str> = errors.paths().collect();
      tracing::debug!(?fields, "survey submission rejected");
      IntakeError::Validation(errors)
    })?;

    let ip_hash = self.anonymize_address(client.address.as_deref());
    let stored = self
      .persist(submission, ip_hash, client.user_agent)
      .await
      .map_err(IntakeError::Store)?;

    tracing::debug!(response_id = %stored.response_id, "survey response stored");
    Ok(stored)
  }
}
