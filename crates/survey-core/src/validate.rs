//! Validation of untrusted survey payloads.
//!
//! [`validate`] runs every check in a single pass and collects at most one
//! message per field path, so the caller sees all problems at once. The pass
//! is composed of:
//!
//! - presence and type checks for each field,
//! - enum-membership checks against [`crate::schema`],
//! - the comment length and email format checks,
//! - two cross-field rules, [`other_topic_specified`] and
//!   [`update_email_present`].

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{AgeGroup, COMMENT_MAX_CHARS, Code, District, Topic};

/// Message reported on `other_topic` when "sonstiges" is not specified.
pub const OTHER_TOPIC_MESSAGE: &str = "Bitte 'Sonstiges' konkretisieren.";

/// Message reported on `email` when updates are requested without an address.
pub const UPDATE_EMAIL_MESSAGE: &str =
  "Bitte E-Mail angeben oder Updates abwählen.";

/// Path used for problems with the payload as a whole.
pub const BODY_PATH: &str = "body";

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Field path → message. Serialises as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} invalid field(s)", .0.len())]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
  /// Record `message` for `path`. The first message for a path wins.
  pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
    self.0.entry(path.into()).or_insert_with(|| message.into());
  }

  pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
    let mut errors = Self::default();
    errors.add(path, message);
    errors
  }

  pub fn get(&self, path: &str) -> Option<&str> {
    self.0.get(path).map(String::as_str)
  }

  pub fn contains(&self, path: &str) -> bool { self.0.contains_key(path) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  /// Failing paths in lexical order.
  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }
}

// ─── Normalised output ───────────────────────────────────────────────────────

/// A submission that passed validation.
///
/// Optional text fields are `None` rather than empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveySubmission {
  pub age_group:     AgeGroup,
  pub district:      District,
  /// Distinct topics in submission order.
  pub topics:        Vec<Topic>,
  pub other_topic:   Option<String>,
  pub comment:       Option<String>,
  pub wants_updates: bool,
  pub email:         Option<String>,
}

// ─── Cross-field rules ───────────────────────────────────────────────────────

/// Choosing "sonstiges" requires a non-empty `other_topic`.
pub fn other_topic_specified(topics: &[Topic], other_topic: Option<&str>) -> bool {
  !topics.contains(&Topic::Sonstiges)
    || other_topic.is_some_and(|t| !t.is_empty())
}

/// Requesting updates requires an email longer than three characters.
pub fn update_email_present(wants_updates: bool, email: Option<&str>) -> bool {
  !wants_updates || email.is_some_and(|e| e.chars().count() > 3)
}

// ─── Email format ────────────────────────────────────────────────────────────

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@([a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$")
    .expect("email regex is valid")
});

/// Syntactic email check. Leading dots and consecutive dots are rejected.
pub fn is_valid_email(s: &str) -> bool {
  !s.starts_with('.') && !s.contains("..") && EMAIL_PATTERN.is_match(s)
}

// ─── Validator ───────────────────────────────────────────────────────────────

/// Validate and normalise an untrusted JSON payload.
///
/// Unknown keys are ignored. Optional fields may be left out, but `null` is
/// a type error like any other non-string value.
pub fn validate(raw: &Value) -> Result<SurveySubmission, ValidationErrors> {
  let mut errors = ValidationErrors::default();

  let Some(obj) = raw.as_object() else {
    errors.add(BODY_PATH, format!("Expected object, received {}", type_name(raw)));
    return Err(errors);
  };

  let age_group = code_field::<AgeGroup>(obj, "age_group", &mut errors);
  let district = code_field::<District>(obj, "district", &mut errors);
  let topics = topics_field(obj, &mut errors);
  let other_topic = optional_string(obj, "other_topic", &mut errors);
  let comment = optional_string(obj, "comment", &mut errors);
  let wants_updates = optional_bool(obj, "wants_updates", &mut errors);
  let email = email_field(obj, &mut errors);

  if let Some(Some(text)) = comment
    && text.encode_utf16().count() > COMMENT_MAX_CHARS
  {
    errors.add(
      "comment",
      format!("String must contain at most {COMMENT_MAX_CHARS} character(s)"),
    );
  }

  if let (Some(topics), Some(other_topic)) = (&topics, other_topic)
    && !other_topic_specified(topics, other_topic)
  {
    errors.add("other_topic", OTHER_TOPIC_MESSAGE);
  }

  if let (Some(wants_updates), Some(email)) = (wants_updates, email)
    && !update_email_present(wants_updates, email)
  {
    errors.add("email", UPDATE_EMAIL_MESSAGE);
  }

  match (age_group, district, topics, other_topic, comment, wants_updates, email) {
    (
      Some(age_group),
      Some(district),
      Some(topics),
      Some(other_topic),
      Some(comment),
      Some(wants_updates),
      Some(email),
    ) if errors.is_empty() => Ok(SurveySubmission {
      age_group,
      district,
      topics,
      other_topic: non_empty(other_topic),
      comment: non_empty(comment),
      wants_updates,
      email: non_empty(email),
    }),
    _ => Err(errors),
  }
}

// ─── Field checks ────────────────────────────────────────────────────────────
//
// Each check returns `None` after recording an error for its path. Optional
// fields return `Some(None)` when absent.

fn code_field<C: Code>(
  obj:    &Map<String, Value>,
  path:   &str,
  errors: &mut ValidationErrors,
) -> Option<C> {
  match obj.get(path) {
    None => {
      errors.add(path, "Required");
      None
    }
    Some(value) => parse_code(value, path, errors),
  }
}

fn parse_code<C: Code>(
  value:  &Value,
  path:   &str,
  errors: &mut ValidationErrors,
) -> Option<C> {
  let Value::String(s) = value else {
    errors.add(path, format!("Expected string, received {}", type_name(value)));
    return None;
  };
  match C::from_code(s) {
    Ok(code) => Some(code),
    Err(_) => {
      errors.add(path, invalid_enum_message(C::VARIANTS, s));
      None
    }
  }
}

fn topics_field(
  obj:    &Map<String, Value>,
  errors: &mut ValidationErrors,
) -> Option<Vec<Topic>> {
  const PATH: &str = "topics";

  let items = match obj.get(PATH) {
    None => {
      errors.add(PATH, "Required");
      return None;
    }
    Some(Value::Array(items)) => items,
    Some(other) => {
      errors.add(PATH, format!("Expected array, received {}", type_name(other)));
      return None;
    }
  };

  let mut topics = Vec::with_capacity(items.len());
  let mut valid = true;
  for item in items {
    match parse_code::<Topic>(item, PATH, errors) {
      Some(topic) if !topics.contains(&topic) => topics.push(topic),
      Some(_) => {}
      None => valid = false,
    }
  }
  valid.then_some(topics)
}

fn optional_string<'a>(
  obj:    &'a Map<String, Value>,
  path:   &str,
  errors: &mut ValidationErrors,
) -> Option<Option<&'a str>> {
  match obj.get(path) {
    None => Some(None),
    Some(Value::String(s)) => Some(Some(s.as_str())),
    Some(other) => {
      errors.add(path, format!("Expected string, received {}", type_name(other)));
      None
    }
  }
}

fn optional_bool(
  obj:    &Map<String, Value>,
  path:   &str,
  errors: &mut ValidationErrors,
) -> Option<bool> {
  match obj.get(path) {
    None => Some(false),
    Some(Value::Bool(b)) => Some(*b),
    Some(other) => {
      errors.add(path, format!("Expected boolean, received {}", type_name(other)));
      None
    }
  }
}

fn email_field<'a>(
  obj:    &'a Map<String, Value>,
  errors: &mut ValidationErrors,
) -> Option<Option<&'a str>> {
  const PATH: &str = "email";

  let email = optional_string(obj, PATH, errors)?;
  match email {
    Some(e) if !e.is_empty() && !is_valid_email(e) => {
      errors.add(PATH, "Invalid email");
      None
    }
    _ => Some(email),
  }
}

fn non_empty(s: Option<&str>) -> Option<String> {
  s.filter(|s| !s.is_empty()).map(str::to_owned)
}

fn invalid_enum_message(variants: &[&str], received: &str) -> String {
  let expected = variants
    .iter()
    .map(|v| format!("'{v}'"))
    .collect::<Vec<_>>()
    .join(" | ");
  format!("Invalid enum value. Expected {expected}, received '{received}'")
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}
