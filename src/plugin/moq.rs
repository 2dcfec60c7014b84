//! Moq plugin: `moq [flags] <source dir> <Interface[:Mock]>...`.
//!
//! Inputs are the files of the source directory declaring the named
//! interfaces; the output is the `-out` file, if any.

use crate::directive::Directive;
use crate::error::ResolveError;
use crate::plugin::search::resolve_declarations;
use crate::plugin::{flag_value, split_flags, tool_args, InputOutputFiles, Plugin};
use async_trait::async_trait;

const NAME: &str = "moq";
const VALUE_FLAGS: &[&str] = &["out", "pkg", "fmt"];

#[derive(Debug, Default)]
pub struct MoqPlugin;

impl MoqPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for MoqPlugin {
    fn name(&self) -> &'static str {
        NAME
    }

    fn matches(&self, directive: &Directive) -> bool {
        tool_args(directive, NAME).is_some()
    }

    async fn resolve(&self, directive: &Directive) -> Result<InputOutputFiles, ResolveError> {
        let args = tool_args(directive, NAME).unwrap_or(&[]);
        let (flags, positionals) = split_flags(args, VALUE_FLAGS);
        let Some((source, interfaces)) = positionals.split_first().filter(|(_, i)| !i.is_empty())
        else {
            return Err(ResolveError::InvalidArguments(
                "expected `<source dir> <interface>...`".to_string(),
            ));
        };

        let names: Vec<String> = interfaces
            .iter()
            .map(|name| name.split(':').next().unwrap_or_default().to_string())
            .collect();
        let source_dir = directive.dir().join(source);
        let source_dir = dunce::canonicalize(&source_dir)
            .map_err(|_| ResolveError::MissingInput(source_dir))?;

        let found = resolve_declarations(&source_dir, &names).await?;
        let mut io = InputOutputFiles::new();
        io.inputs = found.files;
        if let Some(out) = flag_value(&flags, "out").filter(|o| !o.is_empty()) {
            io.outputs.insert(out.to_string());
        }
        Ok(io)
    }
}
