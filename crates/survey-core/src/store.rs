//! The `SurveyStore` trait.
//!
//! Implemented by storage backends (e.g. `survey-store-sqlite`). The intake
//! pipeline and the HTTP layer depend on this abstraction only.

use std::future::Future;

use crate::response::{NewSurveyResponse, StoredSurveyResponse};

/// Append-only sink for survey responses.
///
/// There is no update, delete or upsert: every call to
/// [`insert_response`](Self::insert_response) creates exactly one new row.
pub trait SurveyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert one response in a single atomic write and return the stored row.
  ///
  /// On error nothing is written.
  fn insert_response(
    &self,
    input: NewSurveyResponse,
  ) -> impl Future<Output = Result<StoredSurveyResponse, Self::Error>> + Send + '_;
}
