use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lenient;
use crate::form::Draft;
use crate::record::{normalize_optional, FieldValue, Record};
use crate::validation::{Rule, RuleSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
  #[default]
  Todo,
  InProgress,
  Done,
}

impl TaskStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      TaskStatus::Todo => "todo",
      TaskStatus::InProgress => "in-progress",
      TaskStatus::Done => "done",
    }
  }

  fn rank(self) -> u32 {
    self as u32
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

impl Priority {
  pub fn as_str(self) -> &'static str {
    match self {
      Priority::Low => "low",
      Priority::Medium => "medium",
      Priority::High => "high",
    }
  }

  fn rank(self) -> u32 {
    self as u32
  }
}

/// An entry in a to-do list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  #[serde(default)]
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub status: TaskStatus,
  #[serde(default)]
  pub priority: Priority,
  #[serde(default, deserialize_with = "lenient::optional_text", skip_serializing_if = "Option::is_none")]
  pub due_date: Option<String>,
  #[serde(default = "Utc::now")]
  pub created_at: DateTime<Utc>,
}

impl Task {
  pub fn new(title: &str) -> Self {
    Self {
      id: String::new(),
      title: title.to_string(),
      description: String::new(),
      status: TaskStatus::default(),
      priority: Priority::default(),
      due_date: None,
      created_at: Utc::now(),
    }
  }

  pub fn is_done(&self) -> bool {
    self.status == TaskStatus::Done
  }
}

impl Record for Task {
  const COLLECTION: &'static str = "tasks";

  fn id(&self) -> &str {
    &self.id
  }

  fn set_id(&mut self, id: String) {
    self.id = id;
  }

  fn search_text(&self) -> Vec<&str> {
    vec![&self.title, &self.description]
  }

  fn field(&self, key: &str) -> FieldValue {
    match key {
      "id" => FieldValue::text(&self.id),
      "title" => FieldValue::text(&self.title),
      "description" => FieldValue::text(&self.description),
      "status" => FieldValue::from(self.status.as_str()),
      "priority" => FieldValue::from(self.priority.as_str()),
      "dueDate" => FieldValue::optional_date(self.due_date.as_deref()),
      "createdAt" => FieldValue::Date(self.created_at),
      "done" => FieldValue::Bool(self.is_done()),
      _ => FieldValue::Missing,
    }
  }

  // Workflow order rather than alphabetical for the enum-valued columns
  fn sort_value(&self, key: &str) -> FieldValue {
    match key {
      "status" => FieldValue::from(self.status.rank()),
      "priority" => FieldValue::from(self.priority.rank()),
      _ => self.field(key),
    }
  }

  fn sort_keys() -> &'static [&'static str] {
    &["title", "status", "priority", "dueDate", "createdAt"]
  }

  fn rules() -> RuleSet {
    RuleSet::new()
      .field("title", [Rule::Required, Rule::MaxLength(200)])
      .field("status", [Rule::one_of(["todo", "in-progress", "done"])])
      .field("priority", [Rule::one_of(["low", "medium", "high"])])
      .field("dueDate", [Rule::Date])
  }

  fn normalize(&mut self) {
    normalize_optional(&mut self.due_date);
  }

  fn draft_defaults() -> Draft {
    Draft::new()
      .with("title", "")
      .with("description", "")
      .with("status", TaskStatus::default().as_str())
      .with("priority", Priority::default().as_str())
  }
}
