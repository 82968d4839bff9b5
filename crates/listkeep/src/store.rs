//! The persistent record store.
//!
//! The in-memory collection is the source of truth. Each successful mutation
//! rewrites the full snapshot exactly once, after the in-memory change has
//! completed. A failed write is reported (log, `last_persist_error`, and a
//! `StoreEvent::PersistFailed` to listeners) but never rolled back.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::record::{new_id, Record};
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
  /// Fall back to `Record::seed()` when there is no usable snapshot.
  pub seed_on_empty: bool,
  /// Indent snapshots for human readers.
  pub pretty: bool,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self { seed_on_empty: true, pretty: false }
  }
}

/// What the last `load()` found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
  Loaded(usize),
  Missing,
  Corrupt(String),
}

/// Change notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
  Loaded { count: usize },
  Added(String),
  Updated(String),
  Removed(String),
  Cleared,
  PersistFailed(String),
}

pub type SubscriptionId = usize;

type Listener = Box<dyn Fn(&StoreEvent)>;

pub struct RecordStore<R: Record, S: Storage> {
  storage: S,
  options: StoreOptions,
  records: Vec<R>,
  status: LoadStatus,
  last_persist_error: Option<String>,
  listeners: Vec<(SubscriptionId, Listener)>,
  next_subscription: SubscriptionId,
}

impl<R: Record, S: Storage> RecordStore<R, S> {
  /// Open a store and load its snapshot. Never fails: unreadable data falls
  /// back to the seed list (or nothing).
  pub fn open(storage: S, options: StoreOptions) -> Self {
    let mut store = Self {
      storage,
      options,
      records: Vec::new(),
      status: LoadStatus::Missing,
      last_persist_error: None,
      listeners: Vec::new(),
      next_subscription: 0,
    };
    store.load();
    store
  }

  /// Replace the in-memory collection with the stored snapshot.
  pub fn load(&mut self) -> LoadStatus {
    let (records, status) = match self.storage.read(R::COLLECTION) {
      Ok(Some(raw)) => match serde_json::from_str::<Vec<R>>(&raw) {
        Ok(records) => {
          let records = normalize(records);
          let count = records.len();
          (records, LoadStatus::Loaded(count))
        }
        Err(err) => {
          warn!(collection = R::COLLECTION, error = %err, "snapshot unparseable, using fallback data");
          (self.fallback(), LoadStatus::Corrupt(err.to_string()))
        }
      },
      Ok(None) => {
        debug!(collection = R::COLLECTION, "no snapshot stored");
        (self.fallback(), LoadStatus::Missing)
      }
      Err(err) => {
        warn!(collection = R::COLLECTION, error = %err, "snapshot unreadable, using fallback data");
        (self.fallback(), LoadStatus::Corrupt(err.to_string()))
      }
    };

    info!(collection = R::COLLECTION, count = records.len(), "collection loaded");
    self.records = records;
    self.status = status.clone();
    self.notify(&StoreEvent::Loaded { count: self.records.len() });
    status
  }

  fn fallback(&self) -> Vec<R> {
    if self.options.seed_on_empty {
      normalize(R::seed())
    } else {
      Vec::new()
    }
  }

  pub fn records(&self) -> &[R] {
    &self.records
  }

  pub fn get(&self, id: &str) -> Option<&R> {
    self.records.iter().find(|record| record.id() == id)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.position(id).is_some()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn load_status(&self) -> &LoadStatus {
    &self.status
  }

  pub fn last_persist_error(&self) -> Option<&str> {
    self.last_persist_error.as_deref()
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  fn position(&self, id: &str) -> Option<usize> {
    self.records.iter().position(|record| record.id() == id)
  }

  fn fresh_id(&self) -> String {
    loop {
      let id = new_id();
      if !self.contains(&id) {
        return id;
      }
    }
  }

  /// Append a record, assigning an id when it has none. Returns the id.
  pub fn add(&mut self, mut record: R) -> Result<String, StoreError> {
    if record.id().trim().is_empty() {
      record.set_id(self.fresh_id());
    } else if self.contains(record.id()) {
      return Err(StoreError::DuplicateId {
        collection: R::COLLECTION,
        id: record.id().to_string(),
      });
    }

    record.normalize();
    let id = record.id().to_string();
    self.records.push(record);
    self.commit(StoreEvent::Added(id.clone()));
    Ok(id)
  }

  /// Merge the top-level keys of a JSON object into the record with `id`.
  pub fn update(&mut self, id: &str, patch: Value) -> Result<&R, StoreError> {
    let index = self.position(id).ok_or_else(|| not_found::<R>(id))?;

    let Value::Object(patch) = patch else {
      return Err(invalid_patch::<R>(id, "patch must be a JSON object"));
    };

    let mut merged = serde_json::to_value(&self.records[index])
      .map_err(|err| invalid_patch::<R>(id, &err.to_string()))?;
    let Value::Object(fields) = &mut merged else {
      return Err(invalid_patch::<R>(id, "record does not serialize to an object"));
    };
    fields.extend(patch);

    let mut updated: R =
      serde_json::from_value(merged).map_err(|err| invalid_patch::<R>(id, &err.to_string()))?;
    updated.set_id(id.to_string());
    updated.normalize();

    self.records[index] = updated;
    self.commit(StoreEvent::Updated(id.to_string()));
    Ok(&self.records[index])
  }

  /// Swap in a full replacement for the record with the same id.
  pub fn replace(&mut self, mut record: R) -> Result<(), StoreError> {
    let index = self.position(record.id()).ok_or_else(|| not_found::<R>(record.id()))?;
    let id = record.id().to_string();

    record.normalize();
    self.records[index] = record;
    self.commit(StoreEvent::Updated(id));
    Ok(())
  }

  /// Remove the record with `id`. Removing an unknown id does nothing.
  pub fn remove(&mut self, id: &str) -> Option<R> {
    let Some(index) = self.position(id) else {
      debug!(collection = R::COLLECTION, id, "remove of unknown id ignored");
      return None;
    };

    let removed = self.records.remove(index);
    self.commit(StoreEvent::Removed(id.to_string()));
    Some(removed)
  }

  /// Drop every record and the stored snapshot.
  pub fn clear(&mut self) -> Result<(), StoreError> {
    self.records.clear();
    let removed = self.storage.remove(R::COLLECTION);
    self.notify(&StoreEvent::Cleared);

    if let Err(err) = removed {
      let err = StoreError::from(err);
      self.report_persist_failure(&err);
      return Err(err);
    }
    self.last_persist_error = None;
    Ok(())
  }

  /// Write the full collection to storage.
  pub fn persist(&mut self) -> Result<(), StoreError> {
    match self.write_snapshot() {
      Ok(()) => {
        debug!(collection = R::COLLECTION, count = self.records.len(), "snapshot written");
        self.last_persist_error = None;
        Ok(())
      }
      Err(err) => {
        self.report_persist_failure(&err);
        Err(err)
      }
    }
  }

  fn write_snapshot(&self) -> Result<(), StoreError> {
    let body = if self.options.pretty {
      serde_json::to_string_pretty(&self.records)
    } else {
      serde_json::to_string(&self.records)
    }
    .map_err(|source| StoreError::Serialize { collection: R::COLLECTION, source })?;

    self.storage.write(R::COLLECTION, &body)?;
    Ok(())
  }

  fn report_persist_failure(&mut self, err: &StoreError) {
    warn!(collection = R::COLLECTION, error = %err, "snapshot write failed, keeping in-memory changes");
    let message = err.to_string();
    self.last_persist_error = Some(message.clone());
    self.notify(&StoreEvent::PersistFailed(message));
  }

  fn commit(&mut self, event: StoreEvent) {
    // Failures already reach listeners as PersistFailed
    let _ = self.persist();
    self.notify(&event);
  }

  pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
  where
    F: Fn(&StoreEvent) + 'static,
  {
    let id = self.next_subscription;
    self.next_subscription += 1;
    self.listeners.push((id, Box::new(listener)));
    id
  }

  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    let before = self.listeners.len();
    self.listeners.retain(|(subscription, _)| *subscription != id);
    self.listeners.len() != before
  }

  fn notify(&self, event: &StoreEvent) {
    for (_, listener) in &self.listeners {
      listener(event);
    }
  }
}

/// Give id-less records an id and drop repeated ids, keeping the first.
fn normalize<R: Record>(records: Vec<R>) -> Vec<R> {
  let mut seen = HashSet::new();
  let mut unique = Vec::with_capacity(records.len());

  for mut record in records {
    record.normalize();
    if record.id().trim().is_empty() {
      record.set_id(new_id());
    }
    if seen.insert(record.id().to_string()) {
      unique.push(record);
    } else {
      warn!(collection = R::COLLECTION, id = record.id(), "dropping duplicate id from snapshot");
    }
  }

  unique
}

fn not_found<R: Record>(id: &str) -> StoreError {
  StoreError::NotFound { collection: R::COLLECTION, id: id.to_string() }
}

fn invalid_patch<R: Record>(id: &str, reason: &str) -> StoreError {
  StoreError::InvalidPatch {
    collection: R::COLLECTION,
    id: id.to_string(),
    reason: reason.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::StorageError;
  use crate::record::FieldValue;
  use crate::storage::{MemoryStorage, MockStorage};
  use serde::{Deserialize, Serialize};
  use serde_json::json;
  use std::cell::RefCell;
  use std::rc::Rc;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Part {
    #[serde(default)]
    id: String,
    name: String,
    qty: u32,
  }

  impl Part {
    fn new(id: &str, name: &str, qty: u32) -> Self {
      Self { id: id.to_string(), name: name.to_string(), qty }
    }
  }

  impl Record for Part {
    const COLLECTION: &'static str = "parts";

    fn id(&self) -> &str {
      &self.id
    }

    fn set_id(&mut self, id: String) {
      self.id = id;
    }

    fn search_text(&self) -> Vec<&str> {
      vec![&self.name]
    }

    fn field(&self, key: &str) -> FieldValue {
      match key {
        "name" => FieldValue::text(&self.name),
        "qty" => FieldValue::from(self.qty),
        _ => FieldValue::Missing,
      }
    }

    fn seed() -> Vec<Self> {
      vec![Part::new("1", "Cement", 50), Part::new("2", "Bricks", 1000)]
    }
  }

  fn recorded_events<S: Storage>(store: &mut RecordStore<Part, S>) -> Rc<RefCell<Vec<StoreEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    store.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
  }

  #[test]
  fn missing_snapshot_falls_back_to_seed() {
    let store: RecordStore<Part, _> = RecordStore::open(MemoryStorage::new(), StoreOptions::default());
    assert_eq!(store.load_status(), &LoadStatus::Missing);
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("2").map(|p| p.name.as_str()), Some("Bricks"));
  }

  #[test]
  fn missing_snapshot_without_seed_is_empty() {
    let options = StoreOptions { seed_on_empty: false, ..StoreOptions::default() };
    let store: RecordStore<Part, _> = RecordStore::open(MemoryStorage::new(), options);
    assert!(store.is_empty());
  }

  #[test]
  fn corrupt_snapshot_falls_back_without_failing() {
    let storage = MemoryStorage::new();
    storage.write("parts", "{not json").unwrap();

    let store: RecordStore<Part, _> = RecordStore::open(storage, StoreOptions::default());
    assert!(matches!(store.load_status(), LoadStatus::Corrupt(_)));
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn unreadable_storage_falls_back_without_failing() {
    let mut storage = MockStorage::new();
    storage.expect_read().returning(|_| Err(StorageError::LockPoisoned));

    let store: RecordStore<Part, _> = RecordStore::open(storage, StoreOptions::default());
    assert!(matches!(store.load_status(), LoadStatus::Corrupt(_)));
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn load_drops_duplicate_ids_and_fills_missing_ones() {
    let storage = MemoryStorage::new();
    storage
      .write(
        "parts",
        r#"[{"id":"a","name":"Sand","qty":1},{"id":"a","name":"Gravel","qty":2},{"name":"Lime","qty":3}]"#,
      )
      .unwrap();

    let store: RecordStore<Part, _> = RecordStore::open(storage, StoreOptions::default());
    assert_eq!(store.load_status(), &LoadStatus::Loaded(2));
    assert_eq!(store.get("a").map(|p| p.name.as_str()), Some("Sand"));
    assert!(!store.records()[1].id.is_empty());
  }

  #[test]
  fn add_assigns_id_and_persists_once() {
    let mut storage = MockStorage::new();
    storage.expect_read().returning(|_| Ok(Some("[]".to_string())));
    storage
      .expect_write()
      .withf(|key, body| key == "parts" && body.contains("Sand"))
      .times(1)
      .returning(|_, _| Ok(()));

    let mut store: RecordStore<Part, _> = RecordStore::open(storage, StoreOptions::default());
    let id = store.add(Part::new("", "Sand", 60)).unwrap();

    assert!(!id.is_empty());
    assert_eq!(store.get(&id).map(|p| p.qty), Some(60));
  }

  #[test]
  fn add_rejects_explicit_duplicate_id() {
    let mut store: RecordStore<Part, _> = RecordStore::open(MemoryStorage::new(), StoreOptions::default());
    let err = store.add(Part::new("1", "Another", 5)).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId { .. }));
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn update_merges_patch_and_keeps_id() {
    let storage = MemoryStorage::new();
    let mut store: RecordStore<Part, _> = RecordStore::open(storage.clone(), StoreOptions::default());

    let updated = store.update("1", json!({ "qty": 75, "id": "hijacked" })).unwrap();
    assert_eq!(updated, &Part::new("1", "Cement", 75));
    assert!(storage.get("parts").unwrap().contains("75"));
  }

  #[test]
  fn update_unknown_id_is_not_found_and_writes_nothing() {
    let storage = MemoryStorage::new();
    let mut store: RecordStore<Part, _> = RecordStore::open(storage.clone(), StoreOptions::default());

    let err = store.update("missing", json!({ "qty": 1 })).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(storage.get("parts"), None);
  }

  #[test]
  fn update_rejects_patches_that_do_not_fit_the_record() {
    let mut store: RecordStore<Part, _> = RecordStore::open(MemoryStorage::new(), StoreOptions::default());

    let err = store.update("1", json!({ "qty": "lots" })).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPatch { .. }));

    let err = store.update("1", json!(["not", "an", "object"])).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPatch { .. }));

    assert_eq!(store.get("1").map(|p| p.qty), Some(50));
  }

  #[test]
  fn replace_swaps_record_in_place() {
    let mut store: RecordStore<Part, _> = RecordStore::open(MemoryStorage::new(), StoreOptions::default());
    store.replace(Part::new("1", "Portland Cement", 40)).unwrap();

    assert_eq!(store.records()[0], Part::new("1", "Portland Cement", 40));
    assert!(store.replace(Part::new("9", "Ghost", 1)).unwrap_err().is_not_found());
  }

  #[test]
  fn remove_is_idempotent() {
    let storage = MemoryStorage::new();
    let mut store: RecordStore<Part, _> = RecordStore::open(storage.clone(), StoreOptions::default());

    assert_eq!(store.remove("2").map(|p| p.name), Some("Bricks".to_string()));
    let snapshot = storage.get("parts");

    assert_eq!(store.remove("2"), None);
    assert_eq!(store.len(), 1);
    assert_eq!(storage.get("parts"), snapshot);
  }

  #[test]
  fn persist_failure_keeps_in_memory_change() {
    let storage = MemoryStorage::new();
    let mut store: RecordStore<Part, _> = RecordStore::open(storage.clone(), StoreOptions::default());
    let events = recorded_events(&mut store);

    storage.fail_writes(true);
    let id = store.add(Part::new("", "Sand", 60)).unwrap();

    assert!(store.contains(&id));
    assert!(store.last_persist_error().unwrap().contains("quota exceeded"));
    assert_eq!(storage.get("parts"), None);
    assert!(matches!(events.borrow()[0], StoreEvent::PersistFailed(_)));
    assert_eq!(events.borrow()[1], StoreEvent::Added(id.clone()));

    storage.fail_writes(false);
    store.persist().unwrap();
    assert_eq!(store.last_persist_error(), None);
    assert!(storage.get("parts").unwrap().contains(&id));
  }

  #[test]
  fn persist_failure_from_backend_is_reported() {
    let mut storage = MockStorage::new();
    storage.expect_read().returning(|_| Ok(None));
    storage.expect_write().returning(|key, _| {
      Err(StorageError::Rejected { key: key.to_string(), reason: "disk full".to_string() })
    });

    let mut store: RecordStore<Part, _> = RecordStore::open(storage, StoreOptions::default());
    let err = store.persist().unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn clear_empties_collection_and_storage() {
    let storage = MemoryStorage::new();
    let mut store: RecordStore<Part, _> = RecordStore::open(storage.clone(), StoreOptions::default());
    store.persist().unwrap();

    store.clear().unwrap();
    assert!(store.is_empty());
    assert_eq!(storage.get("parts"), None);
  }

  #[test]
  fn listeners_see_each_change_until_unsubscribed() {
    let mut store: RecordStore<Part, _> = RecordStore::open(MemoryStorage::new(), StoreOptions::default());
    let events = recorded_events(&mut store);

    let id = store.add(Part::new("", "Sand", 60)).unwrap();
    store.update(&id, json!({ "qty": 61 })).unwrap();
    store.remove(&id);

    assert_eq!(
      *events.borrow(),
      vec![StoreEvent::Added(id.clone()), StoreEvent::Updated(id.clone()), StoreEvent::Removed(id)]
    );

    assert!(store.unsubscribe(0));
    assert!(!store.unsubscribe(0));
    store.add(Part::new("", "Lime", 1)).unwrap();
    assert_eq!(events.borrow().len(), 3);
  }

  #[test]
  fn pretty_option_indents_snapshot() {
    let storage = MemoryStorage::new();
    let options = StoreOptions { pretty: true, ..StoreOptions::default() };
    let mut store: RecordStore<Part, _> = RecordStore::open(storage.clone(), options);
    store.persist().unwrap();

    assert!(storage.get("parts").unwrap().contains("\n  {"));
  }
}
