//! Concurrent declaration search.
//!
//! Loads a package once, then runs one independent search per sub-target.
//! All searches are joined before any result is used, and found files are
//! collected into a sorted set so completion order never shows in the output.

use crate::error::ResolveError;
use crate::plugin::GoPackage;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::debug;

/// Result of resolving a set of declaration names.
#[derive(Debug, Clone)]
pub struct DeclarationFiles {
    pub package: String,
    pub files: BTreeSet<PathBuf>,
}

/// Load the package in `dir` on a blocking thread.
pub async fn load_package(dir: &Path) -> Result<Arc<GoPackage>, ResolveError> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || GoPackage::load(&dir))
        .await
        .map_err(|e| ResolveError::SearchAborted(e.to_string()))?
        .map(Arc::new)
}

/// Find the declaring file of every name in `targets`.
///
/// Fails atomically: if any name is missing the error lists every missing
/// name and no files are returned.
pub async fn find_declarations(
    package: Arc<GoPackage>,
    targets: &[String],
) -> Result<BTreeSet<PathBuf>, ResolveError> {
    let unique: BTreeSet<&String> = targets.iter().collect();
    let mut searches = JoinSet::new();
    for target in unique {
        let package = Arc::clone(&package);
        let target = target.clone();
        searches.spawn_blocking(move || {
            let found = package.find_type_declaration(&target);
            (target, found)
        });
    }

    let mut files = BTreeSet::new();
    let mut missing = Vec::new();
    let mut aborted = None;
    while let Some(joined) = searches.join_next().await {
        match joined {
            Ok((target, Some(file))) => {
                debug!(target = %target, file = %file.display(), "Found declaration");
                files.insert(file);
            }
            Ok((target, None)) => missing.push(target),
            Err(e) => aborted = Some(e.to_string()),
        }
    }

    if let Some(reason) = aborted {
        return Err(ResolveError::SearchAborted(reason));
    }
    if !missing.is_empty() {
        missing.sort();
        return Err(ResolveError::DeclarationNotFound {
            names: missing,
            dir: package.dir.clone(),
        });
    }
    Ok(files)
}

/// Directory of the Go package `import`, as seen from `dir`.
///
/// `.` and `./`/`../` paths are directories relative to `dir`. Anything else
/// must be inside the module declared by the nearest enclosing `go.mod`;
/// packages of other modules are an unsupported scope.
pub async fn locate_package(dir: &Path, import: &str) -> Result<PathBuf, ResolveError> {
    if import == "." || import.starts_with("./") || import.starts_with("../") {
        let path = dir.join(import);
        return dunce::canonicalize(&path).map_err(|e| ResolveError::Unreadable {
            path,
            reason: e.to_string(),
        });
    }

    let unsupported = || ResolveError::UnsupportedScope {
        scope: import.to_string(),
    };
    for ancestor in dir.ancestors() {
        let Ok(go_mod) = tokio::fs::read_to_string(ancestor.join("go.mod")).await else {
            continue;
        };
        let module = module_path(&go_mod).ok_or_else(unsupported)?;
        if import == module {
            return Ok(ancestor.to_path_buf());
        }
        let rest = import
            .strip_prefix(module)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(unsupported)?;
        debug!(import = %import, module = %module, "Resolved import inside module");
        return Ok(ancestor.join(rest));
    }
    Err(unsupported())
}

/// Module path from the `module` directive of a go.mod file.
fn module_path(go_mod: &str) -> Option<&str> {
    go_mod.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        let name = rest.trim().trim_matches('"');
        (!name.is_empty()).then_some(name)
    })
}

/// Load the package in `dir` and resolve `targets` within it.
pub async fn resolve_declarations(
    dir: &Path,
    targets: &[String],
) -> Result<DeclarationFiles, ResolveError> {
    let package = load_package(dir).await?;
    let name = package.name.clone();
    let files = find_declarations(package, targets).await?;
    Ok(DeclarationFiles {
        package: name,
        files,
    })
}
