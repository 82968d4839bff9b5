//! The surface a front end drives: one store, its view state, and its form.
//!
//! Front ends render `visible()` and call these entry points; they never
//! reach into the collection directly.

use serde_json::Value;

use crate::error::{FormError, StoreError};
use crate::form::{FormController, FormEvent, Submitted};
use crate::record::Record;
use crate::storage::Storage;
use crate::store::{RecordStore, StoreEvent, StoreOptions, SubscriptionId};
use crate::view::{self, Direction, FilterValue, ViewState};

pub struct ListApp<R: Record, S: Storage> {
  store: RecordStore<R, S>,
  view: ViewState,
  form: FormController<R>,
}

impl<R: Record, S: Storage> ListApp<R, S> {
  pub fn open(storage: S, options: StoreOptions) -> Self {
    Self::from_store(RecordStore::open(storage, options))
  }

  pub fn from_store(store: RecordStore<R, S>) -> Self {
    Self { store, view: ViewState::new(), form: FormController::new() }
  }

  pub fn store(&self) -> &RecordStore<R, S> {
    &self.store
  }

  pub fn store_mut(&mut self) -> &mut RecordStore<R, S> {
    &mut self.store
  }

  pub fn view_state(&self) -> &ViewState {
    &self.view
  }

  pub fn form(&self) -> &FormController<R> {
    &self.form
  }

  /// The current derived view.
  pub fn visible(&self) -> Vec<&R> {
    view::derive(self.store.records(), &self.view)
  }

  pub fn add(&mut self, record: R) -> Result<String, StoreError> {
    self.store.add(record)
  }

  pub fn update(&mut self, id: &str, patch: Value) -> Result<&R, StoreError> {
    self.store.update(id, patch)
  }

  pub fn remove(&mut self, id: &str) -> Option<R> {
    self.store.remove(id)
  }

  pub fn set_search(&mut self, search: &str) {
    self.view.set_search(search);
  }

  pub fn set_filter(&mut self, field: &str, value: FilterValue) {
    self.view.set_filter(field, value);
  }

  pub fn set_sort(&mut self, key: &str, direction: Direction) {
    self.view.set_sort(key, direction);
  }

  pub fn toggle_sort(&mut self, key: &str) {
    self.view.toggle_sort(key);
  }

  pub fn open_add(&mut self) -> Result<(), FormError> {
    self.form.open_add()
  }

  pub fn open_edit(&mut self, id: &str) -> Result<(), FormError> {
    self.form.open_edit(&self.store, id)
  }

  pub fn set_field(&mut self, field: &str, value: impl Into<Value>) -> Result<(), FormError> {
    self.form.set_field(field, value)
  }

  pub fn cancel(&mut self) {
    self.form.cancel();
  }

  pub fn handle(&mut self, event: FormEvent) {
    self.form.handle(event);
  }

  pub fn submit(&mut self) -> Result<Submitted, FormError> {
    self.form.submit(&mut self.store)
  }

  pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
  where
    F: Fn(&StoreEvent) + 'static,
  {
    self.store.subscribe(listener)
  }
}
