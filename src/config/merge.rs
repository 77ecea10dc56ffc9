//! Ordered source merging into a [`QMakerConfig`].

pub(super) mod merge_policy;

use super::sources::{environment, global_file, workspace_file};
use super::QMakerConfig;
use config::ConfigError;
use std::path::Path;

/// Defaults, then the global file, then workspace files, then the environment.
pub(super) fn merge_all(workspace_root: &Path) -> Result<QMakerConfig, ConfigError> {
    let builder = merge_policy::builder_with_defaults()?;
    let builder = global_file::add_to_builder(builder)?;
    let builder = workspace_file::add_to_builder(builder, workspace_root)?;
    let builder = environment::add_to_builder(builder);
    builder.build()?.try_deserialize()
}

/// Defaults overlaid with one explicit file; the file must exist.
pub(super) fn merge_file(path: &Path) -> Result<QMakerConfig, ConfigError> {
    let builder = merge_policy::builder_with_defaults()?
        .add_source(config::File::from(path).required(true));
    builder.build()?.try_deserialize()
}
