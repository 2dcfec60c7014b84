//! Counterfeiter plugin: fakes for interfaces of the current package.
//!
//! Three directive shapes are understood:
//!
//! - `//counterfeiter:generate . Thing` (family `counterfeiter`)
//! - `//go:generate counterfeiter . Thing`
//! - `//go:generate go run github.com/maxbrunsfeld/counterfeiter/v6 -generate`,
//!   which processes every `//counterfeiter:generate` line of the file
//!
//! Inputs are the files declaring the named interfaces; the default output is
//! `<package>fakes/*.go`.

use crate::directive::{tokenize, Directive, GO_FAMILY};
use crate::error::ResolveError;
use crate::plugin::search::resolve_declarations;
use crate::plugin::{flag_value, split_flags, InputOutputFiles, Plugin};
use async_trait::async_trait;
use tracing::debug;

const NAME: &str = "counterfeiter";
const SUB_DIRECTIVE_MARKER: &str = "//counterfeiter:generate";
const VALUE_FLAGS: &[&str] = &["o", "fake-name", "header"];

#[derive(Debug, Default)]
pub struct CounterfeiterPlugin;

impl CounterfeiterPlugin {
    pub fn new() -> Self {
        Self
    }
}

/// One interface to fake.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SubTarget {
    name: String,
    output: Option<String>,
}

fn parse_sub_target(args: &[String]) -> Result<SubTarget, ResolveError> {
    let (flags, positionals) = split_flags(args, VALUE_FLAGS);
    let [scope, name] = positionals.as_slice() else {
        return Err(ResolveError::InvalidArguments(format!(
            "expected `<scope> <interface>`, got {:?}",
            positionals
        )));
    };
    if *scope != "." {
        return Err(ResolveError::UnsupportedScope {
            scope: scope.to_string(),
        });
    }
    Ok(SubTarget {
        name: name.to_string(),
        output: flag_value(&flags, "o").map(str::to_string),
    })
}

/// Sub-targets from the `//counterfeiter:generate` lines of a file.
fn sub_directives(source: &str) -> Result<Vec<SubTarget>, ResolveError> {
    source
        .lines()
        .filter_map(|line| line.strip_prefix(SUB_DIRECTIVE_MARKER))
        .filter(|rest| rest.starts_with(' ') || rest.starts_with('\t'))
        .map(|rest| {
            let words = tokenize(rest).map_err(|reason| {
                ResolveError::InvalidArguments(format!(
                    "{}{}: {}",
                    SUB_DIRECTIVE_MARKER, rest, reason
                ))
            })?;
            parse_sub_target(&words)
        })
        .collect()
}

fn output_pattern(output: Option<&str>, package: &str) -> String {
    match output {
        Some(path) if path.ends_with(".go") => path.to_string(),
        Some(dir) => format!("{}/*.go", dir.trim_end_matches('/')),
        None => format!("{}fakes/*.go", package),
    }
}

fn is_generate_mode(directive: &Directive) -> bool {
    directive.family == GO_FAMILY
        && directive.words.iter().any(|w| w.contains(NAME))
        && directive.words.iter().any(|w| w == "-generate")
}

#[async_trait]
impl Plugin for CounterfeiterPlugin {
    fn name(&self) -> &'static str {
        NAME
    }

    fn matches(&self, directive: &Directive) -> bool {
        if directive.family == NAME {
            return true;
        }
        directive.family == GO_FAMILY && directive.words.iter().any(|w| w.contains(NAME))
    }

    /// A `-generate` directive processes every `//counterfeiter:generate`
    /// line of its file, so those lines must not run on their own.
    fn covers(&self, directive: &Directive, other: &Directive) -> bool {
        is_generate_mode(directive) && other.family == NAME && other.path == directive.path
    }

    async fn resolve(&self, directive: &Directive) -> Result<InputOutputFiles, ResolveError> {
        let mut io = InputOutputFiles::new();

        let targets = if directive.family == NAME {
            vec![parse_sub_target(&directive.words)?]
        } else if is_generate_mode(directive) {
            let source = tokio::fs::read_to_string(&directive.path)
                .await
                .map_err(|e| ResolveError::Unreadable {
                    path: directive.path.clone(),
                    reason: e.to_string(),
                })?;
            // The sub-directive lines shape the generated output.
            io.inputs.insert(directive.path.clone());
            sub_directives(&source)?
        } else {
            let args = directive
                .words
                .iter()
                .position(|w| w.contains(NAME))
                .and_then(|i| directive.words.get(i + 1..))
                .unwrap_or(&[]);
            vec![parse_sub_target(args)?]
        };

        if targets.is_empty() {
            debug!(directive = %directive, "counterfeiter: no sub-directives found");
            return Ok(io);
        }

        let names: Vec<String> = targets.iter().map(|t| t.name.clone()).collect();
        let found = resolve_declarations(directive.dir(), &names).await?;
        io.inputs.extend(found.files);
        for target in &targets {
            io.outputs
                .insert(output_pattern(target.output.as_deref(), &found.package));
        }

        debug!(
            directive = %directive,
            inputs = io.inputs.len(),
            outputs = io.outputs.len(),
            "counterfeiter: resolved"
        );
        Ok(io)
    }
}
