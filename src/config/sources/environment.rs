//! Environment source: GENFAST__SECTION__KEY

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

/// Add `GENFAST__*` variables as the highest-priority source.
///
/// List-valued keys accept comma-separated values.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("GENFAST")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("scan.families")
            .with_list_parse_key("scan.ignore_patterns")
            .with_list_parse_key("plugins.disabled"),
    )
}
