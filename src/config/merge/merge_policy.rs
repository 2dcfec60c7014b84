//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only the keys whose defaults are not expressible as serde defaults
/// (lists and paths shared across sections) are set here.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("scan.families", vec![crate::directive::GO_FAMILY])?
        .set_default("cache.path", ".genfast/cache")
}
