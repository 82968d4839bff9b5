//! User configuration, read from `config.yaml` under the data root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::store::StoreOptions;

/// Overrides the data root (defaults to `~/.listkeep`).
pub const ROOT_ENV: &str = "LISTKEEP_ROOT";
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  /// Ask before deleting a record unless `--force` is given
  #[serde(default = "enabled")]
  pub confirm_delete: bool,
  /// Start a collection from its sample records when nothing is stored
  #[serde(default = "enabled")]
  pub seed_on_empty: bool,
  /// Write indented snapshots
  #[serde(default = "enabled")]
  pub pretty_snapshots: bool,
}

fn enabled() -> bool {
  true
}

impl Default for Config {
  fn default() -> Self {
    Self { confirm_delete: true, seed_on_empty: true, pretty_snapshots: true }
  }
}

/// Directory holding the config file and the `data/` snapshots.
pub fn root() -> Result<PathBuf, ConfigError> {
  if let Ok(root) = std::env::var(ROOT_ENV) {
    if !root.trim().is_empty() {
      return Ok(PathBuf::from(root));
    }
  }

  let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
  Ok(home.join(".listkeep"))
}

impl Config {
  pub fn load() -> Result<Self, ConfigError> {
    Self::load_from(root()?.join(CONFIG_FILE))
  }

  /// A missing or empty file yields the defaults.
  pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();

    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
    };

    if content.trim().is_empty() {
      return Ok(Self::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
  }

  pub fn to_yaml(&self) -> Result<String, ConfigError> {
    serde_yaml::to_string(self).map_err(ConfigError::Render)
  }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions { seed_on_empty: self.seed_on_empty, pretty: self.pretty_snapshots }
  }
}
