//! Route handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/v1/health` | Liveness; always `{"ok":true}` |
//! | `POST` | `/v1/survey` | Body: survey submission; 201 / 400 / 500 |

pub mod health;
pub mod survey;

use crate::error::ApiError;

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError { ApiError::NotFound }
