//! Listkeep - Local-first Record Lists
//!
//! Keeps a collection of records in memory, mirrors every change to a JSON
//! snapshot on disk, and derives filtered, sorted views for display. Edits go
//! through a small add/edit form controller that validates drafts against
//! declarative per-field rules before they reach the store.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod record;
pub mod records;
pub mod storage;
pub mod store;
pub mod validation;
pub mod view;

pub use app::ListApp;
pub use config::Config;
pub use error::{ConfigError, FormError, StorageError, StoreError};
pub use form::{Draft, FormController, FormEvent, FormState, Submitted};
pub use record::{new_id, FieldValue, Record};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{LoadStatus, RecordStore, StoreEvent, StoreOptions, SubscriptionId};
pub use validation::{Rule, RuleSet, ValidationErrors};
pub use view::{Direction, FilterValue, SortSpec, ViewState};
