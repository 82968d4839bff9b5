//! Display formatting utilities for CLI output

use colored::*;

use crate::record::Record;
use crate::store::LoadStatus;
use crate::validation::ValidationErrors;

/// Highlight every case-insensitive occurrence of `term` in `text`.
pub fn highlight_keywords(text: &str, term: &str) -> String {
  let term = term.trim();
  if term.is_empty() {
    return text.to_string();
  }

  let needle: Vec<char> = term.chars().flat_map(char::to_lowercase).collect();
  let chars: Vec<char> = text.chars().collect();
  let mut result = String::new();
  let mut i = 0;

  while i < chars.len() {
    match match_len(&chars[i..], &needle) {
      Some(len) => {
        let matched: String = chars[i..i + len].iter().collect();
        result.push_str(&matched.yellow().bold().to_string());
        i += len;
      }
      None => {
        result.push(chars[i]);
        i += 1;
      }
    }
  }

  result
}

// Number of chars in `haystack` covering `needle`, compared lowercased
fn match_len(haystack: &[char], needle: &[char]) -> Option<usize> {
  let mut lowered = Vec::new();
  for (consumed, c) in haystack.iter().enumerate() {
    lowered.extend(c.to_lowercase());
    if lowered.len() >= needle.len() {
      return lowered.starts_with(needle).then_some(consumed + 1);
    }
  }
  None
}

/// One line per record: the id, then each sortable field.
pub fn record_line<R: Record>(record: &R, search: Option<&str>) -> String {
  let fields: Vec<String> = R::sort_keys()
    .iter()
    .filter_map(|key| {
      let value = record.field(key).as_filter_text()?;
      let value = match search {
        Some(term) => highlight_keywords(&value, term),
        None => value,
      };
      Some(format!("{}={}", key.dimmed(), value))
    })
    .collect();

  format!("{} {}", record.id().cyan(), fields.join("  "))
}

/// Every stored field, indented under the record line.
pub fn record_details<R: Record>(record: &R) -> Vec<String> {
  match serde_json::to_value(record) {
    Ok(serde_json::Value::Object(fields)) => fields
      .iter()
      .filter(|(key, _)| key.as_str() != "id")
      .map(|(key, value)| format!("    {}: {}", key.dimmed(), plain(value)))
      .collect(),
    _ => Vec::new(),
  }
}

fn plain(value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::String(text) => text.clone(),
    other => other.to_string(),
  }
}

pub fn validation_errors(errors: &ValidationErrors) {
  eprintln!("{} Record not saved:", "✗".red());
  for (field, messages) in errors.iter() {
    for message in messages {
      eprintln!("  {} {}", field.yellow(), message);
    }
  }
}

pub fn persist_warning(message: &str) {
  eprintln!("{} Change kept for this run but not saved: {}", "⚠".yellow(), message);
}

/// Tell the user when stored data had to be set aside.
pub fn load_banner(collection: &str, status: &LoadStatus) {
  if let LoadStatus::Corrupt(reason) = status {
    eprintln!("{} Stored {} could not be read ({}); starting over", "⚠".yellow(), collection.cyan(), reason);
  }
}
