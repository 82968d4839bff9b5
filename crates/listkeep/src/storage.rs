//! Key-value backends for snapshots and display preferences.
//!
//! Every write replaces the whole value under a key. There is no incremental
//! format: a collection snapshot is rewritten in full after each change.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::error::StorageError;

#[cfg_attr(test, mockall::automock)]
pub trait Storage {
  /// Returns `None` when nothing is stored under `key`.
  fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

  fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

  /// Removing an absent key succeeds.
  fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{key}.json"))
  }

  fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io { key: key.to_string(), source }
  }
}

impl Storage for FileStorage {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
    match fs::read_to_string(self.path_for(key)) {
      Ok(content) => Ok(Some(content)),
      Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
      Err(err) => Err(Self::io_error(key, err)),
    }
  }

  fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
    fs::create_dir_all(&self.dir).map_err(|err| Self::io_error(key, err))?;

    // Write to a sibling first so a snapshot lands whole or not at all
    let staging = self.dir.join(format!(".{key}.json.tmp"));
    fs::write(&staging, value).map_err(|err| Self::io_error(key, err))?;
    fs::rename(&staging, self.path_for(key)).map_err(|err| Self::io_error(key, err))
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    match fs::remove_file(self.path_for(key)) {
      Ok(()) => Ok(()),
      Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
      Err(err) => Err(Self::io_error(key, err)),
    }
  }
}

/// HashMap-backed storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
  entries: Arc<RwLock<HashMap<String, String>>>,
  reject_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make subsequent writes fail, as a full disk would.
  pub fn fail_writes(&self, fail: bool) {
    self.reject_writes.store(fail, Ordering::SeqCst);
  }

  /// Raw value under `key`, bypassing error handling.
  pub fn get(&self, key: &str) -> Option<String> {
    self.entries.read().ok().and_then(|entries| entries.get(key).cloned())
  }
}

impl Storage for MemoryStorage {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
    let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
    Ok(entries.get(key).cloned())
  }

  fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
    if self.reject_writes.load(Ordering::SeqCst) {
      return Err(StorageError::Rejected {
        key: key.to_string(),
        reason: "quota exceeded".to_string(),
      });
    }

    let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
    entries.remove(key);
    Ok(())
  }
}

/// Read a boolean-like display preference. Anything but "true"/"1" is off.
pub fn read_flag<S: Storage + ?Sized>(storage: &S, key: &str) -> bool {
  match storage.read(key) {
    Ok(Some(value)) => matches!(value.trim(), "true" | "1"),
    Ok(None) => false,
    Err(err) => {
      warn!(key, error = %err, "could not read preference, treating as off");
      false
    }
  }
}

pub fn write_flag<S: Storage + ?Sized>(storage: &S, key: &str, value: bool) -> Result<(), StorageError> {
  storage.write(key, if value { "true" } else { "false" })
}
