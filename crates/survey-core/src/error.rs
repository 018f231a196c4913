//! Error types for `survey-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored or submitted code that is not part of its enumerated set.
  #[error("unknown {kind} code: {value:?}")]
  UnknownCode { kind: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
