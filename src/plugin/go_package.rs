//! Go package syntax loading with tree-sitter.
//!
//! This is the source-analysis facility plugins use to map a declaration
//! name to the file that declares it.

use crate::error::ResolveError;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};
use tracing::debug;

/// One parsed source file of a package.
pub struct SourceFile {
    pub path: PathBuf,
    /// Carries the `// Code generated ... DO NOT EDIT.` marker
    pub generated: bool,
    source: String,
    tree: Tree,
}

/// The non-test Go files of a single directory.
pub struct GoPackage {
    pub dir: PathBuf,
    pub name: String,
    files: Vec<SourceFile>,
}

fn go_parser() -> Result<Parser, ResolveError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| ResolveError::Parse {
            path: PathBuf::new(),
            reason: format!("failed to set language: {e}"),
        })?;
    Ok(parser)
}

impl GoPackage {
    /// Parse every non-`_test.go` file in `dir`.
    ///
    /// The package name comes from the first file (in name order) with a
    /// package clause; files declaring another package are skipped.
    pub fn load(dir: &Path) -> Result<Self, ResolveError> {
        let entries = std::fs::read_dir(dir).map_err(|e| ResolveError::Unreadable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().map(|ext| ext == "go").unwrap_or(false)
                    && !path.to_string_lossy().ends_with("_test.go")
            })
            .collect();
        paths.sort();

        let mut parser = go_parser()?;
        let mut name: Option<String> = None;
        let mut files = Vec::new();

        for path in paths {
            let source = std::fs::read_to_string(&path).map_err(|e| ResolveError::Unreadable {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            let tree = parser.parse(&source, None).ok_or_else(|| ResolveError::Parse {
                path: path.clone(),
                reason: "parser produced no tree".to_string(),
            })?;
            let Some(file_package) = package_clause(&tree, &source) else {
                debug!(path = %path.display(), "Skipping file without package clause");
                continue;
            };
            match &name {
                None => name = Some(file_package),
                Some(existing) if *existing != file_package => {
                    debug!(
                        path = %path.display(),
                        package = %file_package,
                        expected = %existing,
                        "Skipping file of another package"
                    );
                    continue;
                }
                Some(_) => {}
            }
            let generated = is_generated(&source);
            files.push(SourceFile {
                path,
                generated,
                source,
                tree,
            });
        }

        let name = name.ok_or_else(|| ResolveError::NoPackage(dir.to_path_buf()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            name,
            files,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }

    /// Files without the generated-code marker.
    pub fn hand_written_files(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|f| !f.generated)
            .map(|f| f.path.as_path())
    }

    /// File declaring type `name`, if any.
    ///
    /// Searches top-level `type` declarations, including grouped blocks,
    /// generic types and aliases.
    pub fn find_type_declaration(&self, name: &str) -> Option<PathBuf> {
        self.files
            .iter()
            .find(|file| declares_type(&file.tree, &file.source, name))
            .map(|file| file.path.clone())
    }
}

/// Go's generated-file convention: a whole-line comment
/// `// Code generated <anything> DO NOT EDIT.` ahead of the package clause.
fn is_generated(source: &str) -> bool {
    source
        .lines()
        .take_while(|line| !line.trim_start().starts_with("package "))
        .any(|line| {
            let line = line.trim_end_matches('\r');
            line.starts_with("// Code generated ") && line.ends_with(" DO NOT EDIT.")
        })
}

fn package_clause(tree: &Tree, source: &str) -> Option<String> {
    let root = tree.root_node();
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|node| node.kind() == "package_clause")?;
    let mut inner = clause.walk();
    let ident = clause
        .named_children(&mut inner)
        .find(|node| node.kind() == "package_identifier")?;
    ident.utf8_text(source.as_bytes()).ok().map(str::to_string)
}

fn declares_type(tree: &Tree, source: &str, name: &str) -> bool {
    let root = tree.root_node();
    let mut cursor = root.walk();
    let found = root
        .named_children(&mut cursor)
        .filter(|node| node.kind() == "type_declaration")
        .any(|decl| type_declaration_names(decl, source).any(|n| n == name));
    found
}

fn type_declaration_names<'t>(decl: Node<'t>, source: &'t str) -> impl Iterator<Item = &'t str> {
    let mut cursor = decl.walk();
    let specs: Vec<Node<'t>> = decl
        .named_children(&mut cursor)
        .filter(|node| matches!(node.kind(), "type_spec" | "type_alias"))
        .collect();
    specs.into_iter().filter_map(move |spec| {
        spec.child_by_field_name("name")
            .and_then(|n| n.utf8_text(source.as_bytes()).ok())
    })
}
