//! Protoc plugin: protocol buffer stubs.
//!
//! Inputs are the `.proto` files named on the command line plus everything
//! they import, transitively, resolved against `-I`/`--proto_path` (or the
//! directive directory when none is given). Imports found on no search path,
//! such as the well-known types shipped with protoc, are not tracked.
//! Outputs follow the `--<lang>_out` flags.

use crate::directive::{Directive, GO_FAMILY};
use crate::error::ResolveError;
use crate::plugin::{InputOutputFiles, Plugin};
use async_trait::async_trait;
use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::debug;

const NAME: &str = "protoc";

#[derive(Debug, Default)]
pub struct ProtocPlugin;

impl ProtocPlugin {
    pub fn new() -> Self {
        Self
    }
}

/// Output glob for one `--<lang>_out` target directory.
fn output_glob(lang: &str, target: &str) -> String {
    // `--go_out=plugins=grpc:gen` carries options before the last colon.
    let dir = target.rsplit(':').next().unwrap_or(target);
    let dir = dir.trim_end_matches('/');
    let dir = if dir.is_empty() { "." } else { dir };
    match lang {
        "go" => format!("{}/**/*.pb.go", dir),
        "go-grpc" => format!("{}/**/*_grpc.pb.go", dir),
        _ => format!("{}/**", dir),
    }
}

/// Paths named by the `import` statements of a `.proto` source.
fn imports(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let rest = line.trim_start().strip_prefix("import")?;
            if !rest.starts_with([' ', '\t', '"', '\'']) {
                return None;
            }
            let rest = rest.trim_start();
            let rest = rest
                .strip_prefix("public")
                .or_else(|| rest.strip_prefix("weak"))
                .unwrap_or(rest)
                .trim_start();
            let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
            let rest = &rest[1..];
            let end = rest.find(quote)?;
            Some(rest[..end].to_string())
        })
        .collect()
}

async fn find_on_path(name: &str, search: &[PathBuf]) -> Option<PathBuf> {
    for dir in search {
        let candidate = dir.join(name);
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(dunce::canonicalize(&candidate).unwrap_or(candidate));
        }
    }
    None
}

/// Every file reachable from `roots` through imports, roots included.
async fn import_closure(
    roots: BTreeSet<PathBuf>,
    search: &[PathBuf],
) -> Result<BTreeSet<PathBuf>, ResolveError> {
    let mut seen = roots.clone();
    let mut queue: VecDeque<PathBuf> = roots.into_iter().collect();

    while let Some(file) = queue.pop_front() {
        let source = tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| ResolveError::Unreadable {
                path: file.clone(),
                reason: e.to_string(),
            })?;
        for name in imports(&source) {
            match find_on_path(&name, search).await {
                Some(path) => {
                    if seen.insert(path.clone()) {
                        queue.push_back(path);
                    }
                }
                None => debug!(import = %name, from = %file.display(), "protoc: import not on search path"),
            }
        }
    }
    Ok(seen)
}

fn flag_argument<'a>(
    name: &str,
    inline: Option<String>,
    args: &mut impl Iterator<Item = &'a String>,
) -> Result<String, ResolveError> {
    match inline {
        Some(value) => Ok(value),
        None => args
            .next()
            .cloned()
            .ok_or_else(|| ResolveError::InvalidArguments(format!("{} needs a directory", name))),
    }
}

fn search_path(dir: &Path, includes: &[String]) -> Vec<PathBuf> {
    if includes.is_empty() {
        return vec![dir.to_path_buf()];
    }
    includes.iter().map(|include| dir.join(include)).collect()
}

#[async_trait]
impl Plugin for ProtocPlugin {
    fn name(&self) -> &'static str {
        NAME
    }

    fn matches(&self, directive: &Directive) -> bool {
        directive.family == GO_FAMILY && directive.program() == Some(NAME)
    }

    async fn resolve(&self, directive: &Directive) -> Result<InputOutputFiles, ResolveError> {
        let mut io = InputOutputFiles::new();
        let mut includes = Vec::new();
        let mut protos = Vec::new();
        let mut args = directive.args().iter();

        while let Some(arg) = args.next() {
            if let Some(inline) = arg.strip_prefix("-I") {
                let inline = (!inline.is_empty()).then(|| inline.trim_start_matches('=').to_string());
                includes.push(flag_argument("-I", inline, &mut args)?);
            } else if let Some(flag) = arg.strip_prefix("--") {
                let (name, inline) = match flag.split_once('=') {
                    Some((name, value)) => (name, Some(value.to_string())),
                    None => (flag, None),
                };
                if name == "proto_path" {
                    includes.push(flag_argument("--proto_path", inline, &mut args)?);
                } else if let Some(lang) = name.strip_suffix("_out") {
                    let target = flag_argument(&format!("--{}", name), inline, &mut args)?;
                    io.outputs.insert(output_glob(lang, &target));
                }
            } else if arg.ends_with(".proto") {
                protos.push(arg.as_str());
            }
        }

        if protos.is_empty() {
            return Err(ResolveError::InvalidArguments(
                "protoc directive names no .proto files".to_string(),
            ));
        }

        let mut named = BTreeSet::new();
        for proto in protos {
            let path = directive.dir().join(proto);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Err(ResolveError::MissingInput(path));
            }
            named.insert(dunce::canonicalize(&path).unwrap_or(path));
        }

        let search = search_path(directive.dir(), &includes);
        io.inputs = import_closure(named, &search).await?;
        debug!(
            directive = %directive,
            inputs = io.inputs.len(),
            outputs = io.outputs.len(),
            "protoc: resolved"
        );
        Ok(io)
    }
}
