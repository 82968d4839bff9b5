//! Add/edit form controller.
//!
//! ```text
//!            open_add            submit ok / cancel
//!   Closed ───────────▶ Adding ─────────────────────▶ Closed
//!     │                                                 ▲
//!     │  open_edit(id)                                  │
//!     └──────────────▶ Editing(id) ─────────────────────┘
//! ```
//!
//! A failed validation keeps the form open with its draft intact.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FormError, StoreError};
use crate::record::Record;
use crate::storage::Storage;
use crate::store::RecordStore;
use crate::validation::{RuleSet, ValidationErrors};

/// Error key used when a draft passes the rules but still can't become a record.
pub const RECORD_FIELD: &str = "_record";

/// A partially-filled record, keyed by serialized field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Draft {
  fields: Map<String, Value>,
}

impl Draft {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
    self.set(field, value);
    self
  }

  pub fn set(&mut self, field: &str, value: impl Into<Value>) {
    self.fields.insert(field.to_string(), value.into());
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self.fields.get(field)
  }

  pub fn remove(&mut self, field: &str) -> Option<Value> {
    self.fields.remove(field)
  }

  pub fn is_empty(&self) -> bool {
    self.fields.is_empty()
  }

  pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.fields.iter().map(|(field, value)| (field.as_str(), value))
  }

  pub fn from_record<R: Record>(record: &R) -> Result<Self, serde_json::Error> {
    match serde_json::to_value(record)? {
      Value::Object(fields) => Ok(Self { fields }),
      _ => Err(serde::ser::Error::custom("record does not serialize to an object")),
    }
  }

  pub fn into_record<R: Record>(self) -> Result<R, serde_json::Error> {
    serde_json::from_value(Value::Object(self.fields))
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormState {
  #[default]
  Closed,
  Adding,
  Editing(String),
}

/// UI gestures that dismiss an open form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
  Cancel,
  Escape,
  BackdropClick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
  Added(String),
  Updated(String),
}

impl Submitted {
  pub fn id(&self) -> &str {
    match self {
      Submitted::Added(id) | Submitted::Updated(id) => id,
    }
  }
}

pub struct FormController<R: Record> {
  state: FormState,
  draft: Draft,
  errors: ValidationErrors,
  rules: RuleSet,
  _record: PhantomData<fn() -> R>,
}

impl<R: Record> Default for FormController<R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: Record> FormController<R> {
  pub fn new() -> Self {
    Self::with_rules(R::rules())
  }

  pub fn with_rules(rules: RuleSet) -> Self {
    Self {
      state: FormState::Closed,
      draft: Draft::new(),
      errors: ValidationErrors::default(),
      rules,
      _record: PhantomData,
    }
  }

  pub fn state(&self) -> &FormState {
    &self.state
  }

  pub fn is_open(&self) -> bool {
    self.state != FormState::Closed
  }

  pub fn draft(&self) -> &Draft {
    &self.draft
  }

  /// Messages from the last rejected submit, cleared field by field as edited.
  pub fn errors(&self) -> &ValidationErrors {
    &self.errors
  }

  pub fn open_add(&mut self) -> Result<(), FormError> {
    if self.is_open() {
      return Err(FormError::AlreadyOpen);
    }

    self.draft = R::draft_defaults();
    self.errors = ValidationErrors::default();
    self.state = FormState::Adding;
    Ok(())
  }

  pub fn open_edit<S: Storage>(&mut self, store: &RecordStore<R, S>, id: &str) -> Result<(), FormError> {
    if self.is_open() {
      return Err(FormError::AlreadyOpen);
    }

    let record = store
      .get(id)
      .ok_or_else(|| StoreError::NotFound { collection: R::COLLECTION, id: id.to_string() })?;

    self.draft = Draft::from_record(record).map_err(FormError::Draft)?;
    self.errors = ValidationErrors::default();
    self.state = FormState::Editing(id.to_string());
    Ok(())
  }

  pub fn set_field(&mut self, field: &str, value: impl Into<Value>) -> Result<(), FormError> {
    if !self.is_open() {
      return Err(FormError::NotOpen);
    }

    self.draft.set(field, value);
    self.errors.clear_field(field);
    self.errors.clear_field(RECORD_FIELD);
    Ok(())
  }

  /// Discard the draft and close. Closing an already closed form is a no-op.
  pub fn cancel(&mut self) {
    self.close();
  }

  pub fn handle(&mut self, event: FormEvent) {
    match event {
      FormEvent::Cancel | FormEvent::Escape | FormEvent::BackdropClick => self.cancel(),
    }
  }

  fn close(&mut self) {
    self.state = FormState::Closed;
    self.draft = Draft::new();
    self.errors = ValidationErrors::default();
  }

  fn reject(&mut self, errors: ValidationErrors) -> FormError {
    self.errors = errors.clone();
    FormError::Invalid(errors)
  }

  /// Validate the draft and hand it to the store.
  ///
  /// On a validation failure the form stays open. If the record being edited
  /// has disappeared the form closes, since retrying can't succeed.
  pub fn submit<S: Storage>(&mut self, store: &mut RecordStore<R, S>) -> Result<Submitted, FormError> {
    let target = match &self.state {
      FormState::Closed => return Err(FormError::NotOpen),
      FormState::Adding => None,
      FormState::Editing(id) => Some(id.clone()),
    };

    if let Err(errors) = self.rules.validate(&self.draft) {
      return Err(self.reject(errors));
    }

    let mut record: R = match self.draft.clone().into_record() {
      Ok(record) => record,
      Err(err) => {
        let mut errors = ValidationErrors::default();
        errors.add(RECORD_FIELD, err.to_string());
        return Err(self.reject(errors));
      }
    };

    let outcome = match target {
      None => store.add(record).map(Submitted::Added),
      Some(id) => {
        record.set_id(id.clone());
        store.replace(record).map(|()| Submitted::Updated(id))
      }
    };

    match outcome {
      Ok(submitted) => {
        self.close();
        Ok(submitted)
      }
      Err(err) if err.is_not_found() => {
        self.close();
        Err(err.into())
      }
      Err(err) => Err(err.into()),
    }
  }
}
