//! Generator plugins
//!
//! A plugin recognizes the directives of one generator family and infers the
//! files each directive actually depends on and the output locations it
//! writes. Matching is a pure predicate over the directive's words; all I/O
//! happens in [`Plugin::resolve`].

pub mod counterfeiter;
pub mod go_package;
pub mod mockgen;
pub mod moq;
pub mod protoc;
pub mod registry;
pub mod search;
pub mod stringer;

pub use go_package::GoPackage;
pub use registry::Registry;

use crate::directive::{Directive, GO_FAMILY};
use crate::error::ResolveError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Resolved dependency footprint of a directive.
///
/// Inputs are absolute paths; output patterns are globs relative to the
/// directive's directory. Both are sets, so duplicates collapse and iteration
/// order is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputOutputFiles {
    pub inputs: BTreeSet<PathBuf>,
    pub outputs: BTreeSet<String>,
}

impl InputOutputFiles {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Capability contract of a generator plugin.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable identifier used in fingerprints and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this plugin understands the directive. Must not perform I/O.
    fn matches(&self, directive: &Directive) -> bool;

    /// Compute the directive's inputs and outputs.
    ///
    /// Either every sub-target resolves or the whole directive fails; partial
    /// results are never returned.
    async fn resolve(&self, directive: &Directive) -> Result<InputOutputFiles, ResolveError>;

    /// Whether running `directive` already performs the work of `other`.
    ///
    /// `other` is then dropped before resolution so the same outputs are
    /// never generated twice. Only called for directives this plugin owns.
    fn covers(&self, _directive: &Directive, _other: &Directive) -> bool {
        false
    }
}

/// Arguments following a Go tool named `tool`, for `tool ...`,
/// `/path/to/tool ...` and `go run example.com/x/tool[@version] ...`.
pub(crate) fn tool_args<'d>(directive: &'d Directive, tool: &str) -> Option<&'d [String]> {
    if directive.family != GO_FAMILY {
        return None;
    }
    let is_tool = |word: &str| {
        let word = word.split('@').next().unwrap_or(word);
        word == tool || word.rsplit('/').next() == Some(tool)
    };
    match directive.words.as_slice() {
        [program, rest @ ..] if is_tool(program) => Some(rest),
        [go, run, program, rest @ ..] if go == "go" && run == "run" && is_tool(program) => {
            Some(rest)
        }
        _ => None,
    }
}

/// Canonical path of an input named relative to `dir`; it must exist.
pub(crate) async fn existing_input(dir: &Path, name: &str) -> Result<PathBuf, ResolveError> {
    let path = dir.join(name);
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ResolveError::MissingInput(path));
    }
    Ok(dunce::canonicalize(&path).unwrap_or(path))
}

/// Split `-flag=value` / `-flag value` style arguments.
///
/// `value_flags` lists flags that consume the next word when written without
/// `=`. Returns the flag values by name and the positional words.
pub(crate) fn split_flags<'a>(
    args: &'a [String],
    value_flags: &[&str],
) -> (Vec<(String, String)>, Vec<&'a str>) {
    let mut flags = Vec::new();
    let mut positionals = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let Some(stripped) = arg.strip_prefix('-') else {
            positionals.push(arg.as_str());
            continue;
        };
        let stripped = stripped.strip_prefix('-').unwrap_or(stripped);
        if let Some((name, value)) = stripped.split_once('=') {
            flags.push((name.to_string(), value.to_string()));
        } else if value_flags.contains(&stripped) {
            let value = iter.next().cloned().unwrap_or_default();
            flags.push((stripped.to_string(), value));
        } else {
            flags.push((stripped.to_string(), String::new()));
        }
    }

    (flags, positionals)
}

pub(crate) fn flag_value<'f>(flags: &'f [(String, String)], name: &str) -> Option<&'f str> {
    flags
        .iter()
        .rev()
        .find(|(flag, _)| flag == name)
        .map(|(_, value)| value.as_str())
}
