//! Mockgen plugin: gomock mocks.
//!
//! Source mode (`-source=file.go`) depends on the source file and any
//! `-aux_files`. Reflect mode (`<import path> <Iface,...>`) depends on the
//! files declaring the listed interfaces, which must live in the current
//! module. `-copyright_file` is an input in both modes. Without
//! `-destination` mockgen prints to stdout and no output is recorded.

use crate::directive::Directive;
use crate::error::ResolveError;
use crate::plugin::search::{locate_package, resolve_declarations};
use crate::plugin::{existing_input, flag_value, split_flags, tool_args, InputOutputFiles, Plugin};
use async_trait::async_trait;
use tracing::debug;

const NAME: &str = "mockgen";
const VALUE_FLAGS: &[&str] = &[
    "source",
    "destination",
    "package",
    "imports",
    "aux_files",
    "build_flags",
    "mock_names",
    "self_package",
    "copyright_file",
    "exclude_interfaces",
];

#[derive(Debug, Default)]
pub struct MockgenPlugin;

impl MockgenPlugin {
    pub fn new() -> Self {
        Self
    }
}

fn non_empty(value: &&str) -> bool {
    !value.is_empty()
}

#[async_trait]
impl Plugin for MockgenPlugin {
    fn name(&self) -> &'static str {
        NAME
    }

    fn matches(&self, directive: &Directive) -> bool {
        tool_args(directive, NAME).is_some()
    }

    async fn resolve(&self, directive: &Directive) -> Result<InputOutputFiles, ResolveError> {
        let args = tool_args(directive, NAME).unwrap_or(&[]);
        let (flags, positionals) = split_flags(args, VALUE_FLAGS);
        let dir = directive.dir();
        let mut io = InputOutputFiles::new();

        if let Some(source) = flag_value(&flags, "source").filter(non_empty) {
            io.inputs.insert(existing_input(dir, source).await?);
            let aux = flag_value(&flags, "aux_files").unwrap_or_default();
            for entry in aux.split(',').filter(|e| !e.is_empty()) {
                // `pkg=path` pairs; the package prefix is optional.
                let path = entry.split_once('=').map(|(_, p)| p).unwrap_or(entry);
                io.inputs.insert(existing_input(dir, path).await?);
            }
        } else {
            let [import, interfaces] = positionals.as_slice() else {
                return Err(ResolveError::InvalidArguments(format!(
                    "expected -source=<file> or `<import path> <interfaces>`, got {:?}",
                    positionals
                )));
            };
            let names: Vec<String> = interfaces
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                return Err(ResolveError::InvalidArguments(
                    "mockgen reflect mode names no interfaces".to_string(),
                ));
            }
            let package_dir = locate_package(dir, import).await?;
            let found = resolve_declarations(&package_dir, &names).await?;
            io.inputs.extend(found.files);
        }

        if let Some(copyright) = flag_value(&flags, "copyright_file").filter(non_empty) {
            io.inputs.insert(existing_input(dir, copyright).await?);
        }
        if let Some(destination) = flag_value(&flags, "destination").filter(non_empty) {
            io.outputs.insert(destination.to_string());
        }

        debug!(
            directive = %directive,
            inputs = io.inputs.len(),
            outputs = io.outputs.len(),
            "mockgen: resolved"
        );
        Ok(io)
    }
}
