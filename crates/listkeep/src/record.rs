//! The record abstraction every list is built from.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::form::Draft;
use crate::validation::RuleSet;

/// A flat, serializable record with a stable identifier.
///
/// Records are replaced wholesale on edit; the id assigned at creation never
/// changes. The serialized form is what lands in the snapshot and what a form
/// draft is staged from, so field names used for sorting, filtering and
/// validation are the serialized (JSON) names.
pub trait Record: Serialize + DeserializeOwned + Clone {
  /// Storage key the collection's snapshot is written under.
  const COLLECTION: &'static str;

  fn id(&self) -> &str;

  fn set_id(&mut self, id: String);

  /// Text fields the search box matches against.
  fn search_text(&self) -> Vec<&str>;

  /// Value of a named field, used for equality filters and, by default, sorting.
  fn field(&self, key: &str) -> FieldValue;

  /// Value a sort on `key` orders by. Override when display text and order
  /// differ (e.g. priority labels ranked low < medium < high).
  fn sort_value(&self, key: &str) -> FieldValue {
    self.field(key)
  }

  /// Keys the list can be sorted by.
  fn sort_keys() -> &'static [&'static str] {
    &[]
  }

  fn rules() -> RuleSet {
    RuleSet::new()
  }

  /// Built-in records used when no snapshot exists yet.
  fn seed() -> Vec<Self> {
    Vec::new()
  }

  /// Starting values for the "add" form.
  fn draft_defaults() -> Draft {
    Draft::new()
  }

  /// Bring the record into its stored shape. Runs on every record entering
  /// the store, so the in-memory form always matches what a reload yields.
  fn normalize(&mut self) {}
}

/// Trim an optional text value, treating blank as unset.
pub fn normalize_optional(value: &mut Option<String>) {
  *value = value.take().map(|text| text.trim().to_string()).filter(|text| !text.is_empty());
}

/// Generate a collision-resistant record id.
pub fn new_id() -> String {
  Uuid::new_v4().to_string()
}

/// A field value extracted from a record for comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
  Text(String),
  Number(f64),
  Date(DateTime<Utc>),
  Bool(bool),
  Missing,
}

impl FieldValue {
  pub fn text(value: impl Into<String>) -> Self {
    FieldValue::Text(value.into())
  }

  /// Parse a date-like string; anything unparseable becomes `Missing`.
  pub fn date(raw: &str) -> Self {
    parse_date(raw).map(FieldValue::Date).unwrap_or(FieldValue::Missing)
  }

  pub fn optional_date(raw: Option<&str>) -> Self {
    raw.map(FieldValue::date).unwrap_or(FieldValue::Missing)
  }

  fn rank(&self) -> u8 {
    match self {
      FieldValue::Number(_) => 0,
      FieldValue::Date(_) => 1,
      FieldValue::Text(_) => 2,
      FieldValue::Bool(_) => 3,
      FieldValue::Missing => 4,
    }
  }

  /// Total order over field values. Text compares case-insensitively with a
  /// case-sensitive tiebreak; `Missing` sorts after every present value.
  pub fn compare(&self, other: &Self) -> Ordering {
    match (self, other) {
      (FieldValue::Text(a), FieldValue::Text(b)) => {
        a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
      }
      (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
      (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
      (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
      _ => self.rank().cmp(&other.rank()),
    }
  }

  /// Text form used by equality filters and summaries.
  pub fn as_filter_text(&self) -> Option<String> {
    match self {
      FieldValue::Text(text) => Some(text.clone()),
      FieldValue::Number(number) => Some(format_number(*number)),
      FieldValue::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
      FieldValue::Bool(flag) => Some(flag.to_string()),
      FieldValue::Missing => None,
    }
  }
}

impl From<&str> for FieldValue {
  fn from(value: &str) -> Self {
    FieldValue::Text(value.to_string())
  }
}

impl From<f64> for FieldValue {
  fn from(value: f64) -> Self {
    FieldValue::Number(value)
  }
}

impl From<u32> for FieldValue {
  fn from(value: u32) -> Self {
    FieldValue::Number(f64::from(value))
  }
}

fn format_number(number: f64) -> String {
  if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e15 {
    format!("{}", number as i64)
  } else {
    number.to_string()
  }
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM` and plain `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
    return Some(parsed.with_timezone(&Utc));
  }

  if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
    return Some(parsed.and_utc());
  }

  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(|midnight| midnight.and_utc())
}
