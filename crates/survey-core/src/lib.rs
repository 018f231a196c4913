//! Core types and the intake pipeline for the citizen survey service.
//!
//! This crate is free of HTTP and database dependencies. The storage backend
//! plugs in through [`store::SurveyStore`]; the HTTP layer calls
//! [`intake::SurveyIntake`].

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod anonymize;
pub mod error;
pub mod intake;
pub mod response;
pub mod schema;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
