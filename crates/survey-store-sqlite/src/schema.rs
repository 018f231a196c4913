//! SQL schema for the survey store.
//!
//! Executed at every open; idempotent thanks to `IF NOT EXISTS`.

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per accepted submission.
-- Append-only: no UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS survey_response (
    response_id   TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,     -- ISO 8601 UTC; server-assigned
    age_group     TEXT NOT NULL,
    district      TEXT NOT NULL,
    topics        TEXT NOT NULL DEFAULT '[]',   -- JSON array of topic codes
    other_topic   TEXT,
    comment       TEXT,
    wants_updates INTEGER NOT NULL DEFAULT 0 CHECK (wants_updates IN (0, 1)),
    email         TEXT,
    user_agent    TEXT,
    ip_hash       TEXT               -- hex sha256 of address + salt
);

CREATE INDEX IF NOT EXISTS survey_response_ip_hash_idx ON survey_response(ip_hash);
CREATE INDEX IF NOT EXISTS survey_response_created_idx ON survey_response(created_at);

PRAGMA user_version = 1;
";
