//! Entry points for loading configuration.

use super::merge;
use super::sources::global_file;
use super::QMakerConfig;
use crate::error::ApiError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`QMakerConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults → global file → `workspace_root/config/*.toml` → `QMAKER__*` env vars.
    pub fn load(workspace_root: &Path) -> Result<QMakerConfig, ApiError> {
        debug!(workspace_root = %workspace_root.display(), "Loading configuration");
        Ok(merge::merge_all(workspace_root)?)
    }

    /// Defaults overlaid with a single explicit file (`--config`).
    pub fn load_from_file(path: &Path) -> Result<QMakerConfig, ApiError> {
        debug!(config_path = %path.display(), "Loading configuration file");
        Ok(merge::merge_file(path)?)
    }

    /// Built-in defaults only.
    pub fn default() -> QMakerConfig {
        QMakerConfig::default()
    }

    /// Where the global config file is looked up.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
