//! Command-line front end shared by every record kind.

pub mod commands;
pub mod display;

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::app::ListApp;
use crate::config::{self, Config, CONFIG_FILE};
use crate::error::ConfigError;
use crate::record::Record;
use crate::storage::FileStorage;

/// Subdirectory of the root holding one snapshot per collection.
pub const DATA_DIR: &str = "data";

#[derive(Subcommand, Debug, Clone)]
pub enum Action {
  /// Add a record through the validating form
  Add {
    /// Field assignments, e.g. --set name=Sand --set quantity=60
    #[arg(short, long = "set", value_name = "FIELD=VALUE")]
    set: Vec<String>,
  },
  /// List records, optionally searched, filtered and sorted
  List(ListArgs),
  /// Show a single record as JSON
  Get {
    /// Record id
    id: String,
  },
  /// Edit an existing record through the validating form
  Update {
    /// Record id
    id: String,
    /// Field assignments to apply on top of the stored record
    #[arg(short, long = "set", value_name = "FIELD=VALUE", required = true)]
    set: Vec<String>,
  },
  /// Delete a record
  Delete {
    /// Record id
    id: String,
    /// Skip confirmation prompt
    #[arg(short, long)]
    force: bool,
  },
  /// Remove every record in the collection
  Clear {
    /// Skip confirmation prompt
    #[arg(short, long)]
    force: bool,
  },
  /// Count records per value of a field
  Summary {
    /// Field to group by
    #[arg(short, long)]
    by: String,
    /// Numeric field to total within each group
    #[arg(short, long)]
    sum: Option<String>,
  },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
  /// Case-insensitive substring to look for
  #[arg(short, long)]
  pub search: Option<String>,
  /// Equality filter, e.g. --filter category=Tools ("all" clears it)
  #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
  pub filters: Vec<String>,
  /// Field to sort by
  #[arg(long)]
  pub sort: Option<String>,
  /// Sort descending
  #[arg(long, requires = "sort")]
  pub desc: bool,
  /// Print the visible records as a JSON array
  #[arg(long)]
  pub json: bool,
  /// Print every field under each record
  #[arg(short, long)]
  pub details: bool,
}

/// Where this invocation reads its config and keeps its data.
#[derive(Debug, Clone)]
pub struct Context {
  pub root: PathBuf,
  pub config: Config,
}

impl Context {
  pub fn load() -> Result<Self, ConfigError> {
    let root = config::root()?;
    let config = Config::load_from(root.join(CONFIG_FILE))?;
    Ok(Self { root, config })
  }

  pub fn storage(&self) -> FileStorage {
    FileStorage::new(self.root.join(DATA_DIR))
  }

  pub fn app<R: Record>(&self) -> ListApp<R, FileStorage> {
    ListApp::open(self.storage(), self.config.store_options())
  }
}
