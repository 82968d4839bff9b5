use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Failures of the key-value backend holding snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("I/O error on '{key}': {source}")]
  Io {
    key: String,
    #[source]
    source: std::io::Error,
  },

  #[error("storage lock poisoned")]
  LockPoisoned,

  #[error("write to '{key}' rejected: {reason}")]
  Rejected { key: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("{collection}/{id} not found")]
  NotFound { collection: &'static str, id: String },

  #[error("{collection}/{id} already exists")]
  DuplicateId { collection: &'static str, id: String },

  #[error("invalid patch for {collection}/{id}: {reason}")]
  InvalidPatch { collection: &'static str, id: String, reason: String },

  #[error("failed to serialize {collection}: {source}")]
  Serialize {
    collection: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error(transparent)]
  Storage(#[from] StorageError),
}

impl StoreError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound { .. })
  }
}

#[derive(Debug, Error)]
pub enum FormError {
  #[error("a form is already open")]
  AlreadyOpen,

  #[error("no form is open")]
  NotOpen,

  #[error("validation failed: {0}")]
  Invalid(ValidationErrors),

  #[error("could not stage record for editing: {0}")]
  Draft(#[source] serde_json::Error),

  #[error(transparent)]
  Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("could not find home directory")]
  NoHome,

  #[error("failed to read config {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("failed to render config: {0}")]
  Render(#[source] serde_yaml::Error),
}
