//! Single entry point for loading the layered configuration.

use crate::config::merge::merge_policy;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::GenFastConfig;
use crate::error::RunError;
use config::builder::DefaultState;
use config::{ConfigBuilder, File};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then the global file, the workspace file and the environment.
    pub fn load(workspace_root: &Path) -> Result<GenFastConfig, RunError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        Self::finish(builder)
    }

    /// Defaults, then `path` (which must exist) and the environment.
    pub fn load_from_file(path: &Path) -> Result<GenFastConfig, RunError> {
        let builder =
            merge_policy::builder_with_defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    /// Location of the global configuration file, if one can be determined.
    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<GenFastConfig, RunError> {
        let config: GenFastConfig = environment::add_to_builder(builder)
            .build()?
            .try_deserialize()?;
        config.validate().map_err(|errors| {
            RunError::ConfigError(
                errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;
        Ok(config)
    }
}
