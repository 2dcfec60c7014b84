//! Stringer plugin: `String()` methods for named constant types.
//!
//! The generated code depends on every constant of the named types, and
//! those may live in any file of the package. Inputs are therefore all
//! hand-written files of the package; resolution still fails when a named
//! type is not declared.

use crate::directive::Directive;
use crate::error::ResolveError;
use crate::plugin::search::{find_declarations, load_package};
use crate::plugin::{flag_value, split_flags, tool_args, InputOutputFiles, Plugin};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const NAME: &str = "stringer";
const VALUE_FLAGS: &[&str] = &["type", "output", "trimprefix", "tags"];

#[derive(Debug, Default)]
pub struct StringerPlugin;

impl StringerPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for StringerPlugin {
    fn name(&self) -> &'static str {
        NAME
    }

    fn matches(&self, directive: &Directive) -> bool {
        tool_args(directive, NAME).is_some()
    }

    async fn resolve(&self, directive: &Directive) -> Result<InputOutputFiles, ResolveError> {
        let args = tool_args(directive, NAME).unwrap_or(&[]);
        let (flags, positionals) = split_flags(args, VALUE_FLAGS);
        if let Some(scope) = positionals.iter().find(|p| **p != ".") {
            return Err(ResolveError::UnsupportedScope {
                scope: scope.to_string(),
            });
        }

        let types: Vec<String> = flag_value(&flags, "type")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let Some(first) = types.first() else {
            return Err(ResolveError::InvalidArguments(
                "stringer requires -type".to_string(),
            ));
        };

        let output = flag_value(&flags, "output")
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_string.go", first.to_lowercase()));

        let package = load_package(directive.dir()).await?;
        find_declarations(Arc::clone(&package), &types).await?;

        let own_output = directive.dir().join(&output);
        let mut io = InputOutputFiles::new();
        io.inputs = package
            .hand_written_files()
            .filter(|path| *path != own_output.as_path())
            .map(Path::to_path_buf)
            .collect();
        debug!(
            directive = %directive,
            inputs = io.inputs.len(),
            "stringer: resolved"
        );
        io.outputs.insert(output);
        Ok(io)
    }
}
