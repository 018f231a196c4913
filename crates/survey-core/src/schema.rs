//! The fixed survey schema: every enumerated answer set.
//!
//! The wire codes are stable identifiers shared with the survey frontend and
//! the `survey_response` table. They must never be renamed.

use std::str::FromStr;

use serde::Serialize;
use strum::{EnumString, IntoStaticStr, VariantNames};

use crate::{Error, Result};

/// Maximum length of the free-text comment, in UTF-16 code units as counted
/// by the survey frontend.
pub const COMMENT_MAX_CHARS: usize = 1200;

// ─── Codes ───────────────────────────────────────────────────────────────────

/// An answer set whose members are identified by a fixed string code.
pub trait Code:
  Copy + FromStr + VariantNames + Into<&'static str>
{
  /// Human-readable name of the answer set, used in error messages.
  const KIND: &'static str;

  fn code(self) -> &'static str { self.into() }

  fn from_code(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownCode {
      kind:  Self::KIND,
      value: s.to_owned(),
    })
  }
}

// ─── Age group ───────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,
  EnumString, IntoStaticStr, VariantNames,
)]
pub enum AgeGroup {
  #[serde(rename = "u18")]
  #[strum(serialize = "u18")]
  Under18,
  #[serde(rename = "18_24")]
  #[strum(serialize = "18_24")]
  From18To24,
  #[serde(rename = "25_34")]
  #[strum(serialize = "25_34")]
  From25To34,
  #[serde(rename = "35_49")]
  #[strum(serialize = "35_49")]
  From35To49,
  #[serde(rename = "50_64")]
  #[strum(serialize = "50_64")]
  From50To64,
  #[serde(rename = "65_plus")]
  #[strum(serialize = "65_plus")]
  Over65,
}

impl Code for AgeGroup {
  const KIND: &'static str = "age group";
}

// ─── District ────────────────────────────────────────────────────────────────

/// The districts of Flörsheim am Main.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,
  EnumString, IntoStaticStr, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum District {
  FloersheimMitte,
  Wicker,
  Weilbach,
  KeramagFalkenberg,
}

impl Code for District {
  const KIND: &'static str = "district";
}

// ─── Topic ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,
  EnumString, IntoStaticStr, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
  VerkehrInfrastruktur,
  OeffentlicherNahverkehr,
  WohnenBau,
  UmweltGruen,
  SportFreizeit,
  KulturVeranstaltungen,
  DigitalisierungInternet,
  SicherheitOrdnung,
  WirtschaftEinzelhandel,
  /// "Other": requires a free-text `other_topic`.
  Sonstiges,
}

impl Code for Topic {
  const KIND: &'static str = "topic";
}
