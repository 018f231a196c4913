//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings,
//! answer codes their wire codes, and the topic list a compact JSON array.

use chrono::{DateTime, Utc};
use survey_core::{
  response::StoredSurveyResponse,
  schema::{AgeGroup, Code, District, Topic},
  validate::SurveySubmission,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Topics ───────────────────────────────────────────────────────────────────

pub fn encode_topics(topics: &[Topic]) -> Result<String> {
  let codes: Vec<&str> = topics.iter().map(|t| t.code()).collect();
  Ok(serde_json::to_string(&codes)?)
}

pub fn decode_topics(s: &str) -> Result<Vec<Topic>> {
  let codes: Vec<String> = serde_json::from_str(s)?;
  codes
    .iter()
    .map(|c| Topic::from_code(c).map_err(Error::from))
    .collect()
}

// ─── Raw row ──────────────────────────────────────────────────────────────────

/// A `survey_response` row exactly as read from SQLite.
pub struct RawResponse {
  pub response_id:   String,
  pub created_at:    String,
  pub age_group:     String,
  pub district:      String,
  pub topics:        String,
  pub other_topic:   Option<String>,
  pub comment:       Option<String>,
  pub wants_updates: bool,
  pub email:         Option<String>,
  pub user_agent:    Option<String>,
  pub ip_hash:       Option<String>,
}

/// Column list matching [`RawResponse::from_row`].
pub const RESPONSE_COLUMNS: &str = "response_id, created_at, age_group, district, topics, \
   other_topic, comment, wants_updates, email, user_agent, ip_hash";

impl RawResponse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      response_id:   row.get(0)?,
      created_at:    row.get(1)?,
      age_group:     row.get(2)?,
      district:      row.get(3)?,
      topics:        row.get(4)?,
      other_topic:   row.get(5)?,
      comment:       row.get(6)?,
      wants_updates: row.get(7)?,
      email:         row.get(8)?,
      user_agent:    row.get(9)?,
      ip_hash:       row.get(10)?,
    })
  }

  pub fn into_response(self) -> Result<StoredSurveyResponse> {
    Ok(StoredSurveyResponse {
      response_id: decode_uuid(&self.response_id)?,
      created_at:  decode_dt(&self.created_at)?,
      submission:  SurveySubmission {
        age_group:     AgeGroup::from_code(&self.age_group)?,
        district:      District::from_code(&self.district)?,
        topics:        decode_topics(&self.topics)?,
        other_topic:   self.other_topic,
        comment:       self.comment,
        wants_updates: self.wants_updates,
        email:         self.email,
      },
      user_agent:  self.user_agent,
      ip_hash:     self.ip_hash,
    })
  }
}
