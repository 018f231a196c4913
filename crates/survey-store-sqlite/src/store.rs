//! [`SqliteStore`]: the SQLite implementation of [`SurveyStore`].

use std::path::Path;

use survey_core::{
  response::{NewSurveyResponse, StoredSurveyResponse},
  schema::Code,
  store::SurveyStore,
};

use crate::{
  encode::{RESPONSE_COLUMNS, RawResponse, encode_dt, encode_topics, encode_uuid},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A survey response store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open the store named by a connection string.
  ///
  /// Accepts `sqlite://<path>`, `sqlite:<path>`, a bare path, or `:memory:`
  /// in any of those forms.
  pub async fn connect(url: &str) -> Result<Self> {
    let path = url
      .strip_prefix("sqlite://")
      .or_else(|| url.strip_prefix("sqlite:"))
      .unwrap_or(url);

    if path.is_empty() || path.contains("://") {
      return Err(Error::UnsupportedUrl(redact_url(url)));
    }
    if path == ":memory:" {
      return Self::open_in_memory().await;
    }
    Self::open(path).await
  }

  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored responses carrying `ip_hash`.
  ///
  /// Operator-side abuse correlation; the HTTP API never reads responses.
  pub async fn count_by_ip_hash(&self, ip_hash: &str) -> Result<u64> {
    let ip_hash = ip_hash.to_owned();
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM survey_response WHERE ip_hash = ?1",
          rusqlite::params![ip_hash],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(count.unsigned_abs())
  }

  /// All stored responses, oldest first.
  ///
  /// For operator tooling and audits, not exposed over HTTP.
  pub async fn list_responses(&self) -> Result<Vec<StoredSurveyResponse>> {
    let raws: Vec<RawResponse> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RESPONSE_COLUMNS} FROM survey_response ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawResponse::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResponse::into_response).collect()
  }
}

// ─── SurveyStore impl ────────────────────────────────────────────────────────

impl SurveyStore for SqliteStore {
  type Error = Error;

  async fn insert_response(
    &self,
    input: NewSurveyResponse,
  ) -> Result<StoredSurveyResponse> {
    let response = StoredSurveyResponse::new(input);

    let id_str        = encode_uuid(response.response_id);
    let at_str        = encode_dt(response.created_at);
    let age_group     = response.submission.age_group.code();
    let district      = response.submission.district.code();
    let topics_str    = encode_topics(&response.submission.topics)?;
    let other_topic   = response.submission.other_topic.clone();
    let comment       = response.submission.comment.clone();
    let wants_updates = response.submission.wants_updates;
    let email         = response.submission.email.clone();
    let user_agent    = response.user_agent.clone();
    let ip_hash       = response.ip_hash.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO survey_response (
             response_id, created_at, age_group, district, topics,
             other_topic, comment, wants_updates, email, user_agent, ip_hash
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str,
            at_str,
            age_group,
            district,
            topics_str,
            other_topic,
            comment,
            wants_updates,
            email,
            user_agent,
            ip_hash,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(response)
  }
}

/// Strip credentials from a connection string before it reaches an error.
fn redact_url(url: &str) -> String {
  match (url.find("://"), url.rfind('@')) {
    (Some(scheme_end), Some(at)) if at > scheme_end => {
      format!("{}://***{}", &url[..scheme_end], &url[at..])
    }
    _ => url.to_owned(),
  }
}
