//! Source tree walker yielding Go files in deterministic order

use crate::error::ScanWarning;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false)
    pub follow_symlinks: bool,
    /// Directory names to prune in addition to the `go generate` rules
    pub ignore_patterns: Vec<String>,
    /// Maximum depth to traverse (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore_patterns: vec!["vendor".to_string(), "node_modules".to_string()],
            max_depth: None,
        }
    }
}

/// Lazy walk over the `.go` files below a root.
///
/// Directories named `testdata`, or starting with `.` or `_`, are pruned the
/// same way `go generate ./...` skips them. Entries are visited in file-name
/// order so repeated scans see files in the same sequence.
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Iterate Go source files. Walk errors are yielded as warnings.
    pub fn go_files(self) -> impl Iterator<Item = Result<PathBuf, ScanWarning>> {
        let root = self.root.clone();
        let config = self.config;
        let walker = WalkDir::new(&root)
            .follow_links(config.follow_symlinks)
            .max_depth(config.max_depth.unwrap_or(usize::MAX))
            .sort_by_file_name();

        walker
            .into_iter()
            .filter_entry(move |entry| !should_prune(entry, &root, &config))
            .filter_map(|entry| match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_go_file(entry.path()) {
                        Some(Ok(entry.into_path()))
                    } else {
                        None
                    }
                }
                Err(e) => Some(Err(ScanWarning::Walk {
                    path: e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_default(),
                    reason: e.to_string(),
                })),
            })
    }
}

fn is_go_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == "go").unwrap_or(false)
}

/// Check whether a directory should be skipped entirely.
fn should_prune(entry: &DirEntry, root: &Path, config: &WalkerConfig) -> bool {
    if !entry.file_type().is_dir() || entry.path() == root {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || name.starts_with('_') || name == "testdata" {
        return true;
    }
    config.ignore_patterns.iter().any(|pattern| name == pattern.as_str())
}
