//! Declarative per-field validation for form drafts.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde_json::Value;

use crate::form::Draft;
use crate::record::parse_date;

/// A single constraint on a draft field.
///
/// Only `Required` and `MinItems` look at empty values; every other rule
/// passes when the field is left blank, so optional fields stay optional.
#[derive(Debug, Clone)]
pub enum Rule {
  Required,
  MinLength(usize),
  MaxLength(usize),
  Min(f64),
  Max(f64),
  Positive,
  Integer,
  Date,
  Pattern { pattern: String, message: String },
  OneOf(Vec<String>),
  MinItems(usize),
}

impl Rule {
  pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
    Rule::Pattern { pattern: pattern.into(), message: message.into() }
  }

  pub fn one_of<I, T>(options: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    Rule::OneOf(options.into_iter().map(Into::into).collect())
  }

  /// Returns the failure message, if any.
  fn check(&self, value: Option<&Value>) -> Option<String> {
    match self {
      Rule::Required => is_blank(value).then(|| "is required".to_string()),
      Rule::MinItems(min) => {
        let count = match value {
          Some(Value::Array(items)) => items.len(),
          _ => 0,
        };
        (count < *min).then(|| format!("needs at least {min} item(s)"))
      }
      _ if is_blank(value) => None,
      Rule::MinLength(min) => {
        let length = as_text(value)?.chars().count();
        (length < *min).then(|| format!("must be at least {min} characters"))
      }
      Rule::MaxLength(max) => {
        let length = as_text(value)?.chars().count();
        (length > *max).then(|| format!("must be at most {max} characters"))
      }
      Rule::Min(min) => match as_number(value) {
        Some(number) => (number < *min).then(|| format!("must be at least {min}")),
        None => Some("must be a number".to_string()),
      },
      Rule::Max(max) => match as_number(value) {
        Some(number) => (number > *max).then(|| format!("must be at most {max}")),
        None => Some("must be a number".to_string()),
      },
      Rule::Positive => match as_number(value) {
        Some(number) => (number <= 0.0).then(|| "must be a positive number".to_string()),
        None => Some("must be a number".to_string()),
      },
      Rule::Integer => match as_number(value) {
        Some(number) => (number.fract() != 0.0).then(|| "must be a whole number".to_string()),
        None => Some("must be a number".to_string()),
      },
      Rule::Date => {
        let text = as_text(value)?;
        parse_date(&text).is_none().then(|| "must be a valid date (YYYY-MM-DD)".to_string())
      }
      Rule::Pattern { pattern, message } => {
        let text = as_text(value)?;
        match Regex::new(pattern) {
          Ok(regex) => (!regex.is_match(&text)).then(|| message.clone()),
          Err(_) => Some(format!("has an unusable validation pattern '{pattern}'")),
        }
      }
      Rule::OneOf(options) => {
        let text = as_text(value)?;
        (!options.iter().any(|option| option == &text))
          .then(|| format!("must be one of: {}", options.join(", ")))
      }
    }
  }
}

fn is_blank(value: Option<&Value>) -> bool {
  match value {
    None | Some(Value::Null) => true,
    Some(Value::String(text)) => text.trim().is_empty(),
    Some(_) => false,
  }
}

fn as_text(value: Option<&Value>) -> Option<String> {
  match value? {
    Value::String(text) => Some(text.trim().to_string()),
    Value::Number(number) => Some(number.to_string()),
    Value::Bool(flag) => Some(flag.to_string()),
    _ => None,
  }
}

fn as_number(value: Option<&Value>) -> Option<f64> {
  match value? {
    Value::Number(number) => number.as_f64(),
    Value::String(text) => text.trim().parse::<f64>().ok().filter(|number| number.is_finite()),
    _ => None,
  }
}

/// Rules for every validated field of a record type, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
  fields: Vec<(String, Vec<Rule>)>,
}

impl RuleSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn field(mut self, name: &str, rules: impl IntoIterator<Item = Rule>) -> Self {
    self.fields.push((name.to_string(), rules.into_iter().collect()));
    self
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  /// Check every rule and collect all failures, not just the first.
  pub fn validate(&self, draft: &Draft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    for (field, rules) in &self.fields {
      let value = draft.get(field);
      for rule in rules {
        if let Some(message) = rule.check(value) {
          errors.add(field, message);
        }
      }
    }

    errors.into_result()
  }
}

/// Failure messages keyed by field, for inline display next to each input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
  fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.fields.entry(field.to_string()).or_default().push(message.into());
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  pub fn len(&self) -> usize {
    self.fields.values().map(Vec::len).sum()
  }

  pub fn get(&self, field: &str) -> &[String] {
    self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn contains(&self, field: &str) -> bool {
    self.fields.contains_key(field)
  }

  pub fn clear_field(&mut self, field: &str) {
    self.fields.remove(field);
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
    self.fields.iter().map(|(field, messages)| (field.as_str(), messages.as_slice()))
  }

  pub fn into_result(self) -> Result<(), ValidationErrors> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.fields {
      for message in messages {
        if !first {
          write!(f, "; ")?;
        }
        write!(f, "{field} {message}")?;
        first = false;
      }
    }
    Ok(())
  }
}

impl std::error::Error for ValidationErrors {}
