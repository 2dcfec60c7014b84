//! Directive Scanner
//!
//! Walks a source tree and extracts `//<family>:generate` directives from Go
//! files. Scanning is lazy and keeps no state between runs; malformed lines
//! are reported as warnings and skipped.

pub mod walker;

pub use walker::{Walker, WalkerConfig};

use crate::directive::{tokenize, Directive};
use crate::error::ScanWarning;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Generator families recognized as directive markers
    pub families: Vec<String>,
    pub walker: WalkerConfig,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            families: vec![crate::directive::GO_FAMILY.to_string()],
            walker: WalkerConfig::default(),
        }
    }
}

pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Lazily scan `root` (a directory or a single `.go` file).
    pub fn scan(&self, root: &Path) -> Directives {
        let files = Walker::with_config(root.to_path_buf(), self.options.walker.clone()).go_files();
        Directives {
            files: Box::new(files),
            families: self.options.families.clone(),
            pending: VecDeque::new(),
            warnings: Vec::new(),
        }
    }
}

/// Iterator over the directives of a tree, one file at a time.
pub struct Directives {
    files: Box<dyn Iterator<Item = Result<PathBuf, ScanWarning>> + Send>,
    families: Vec<String>,
    pending: VecDeque<Directive>,
    warnings: Vec<ScanWarning>,
}

impl Directives {
    /// Warnings collected so far.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ScanWarning> {
        self.warnings
    }

    fn record(&mut self, warning: ScanWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

impl Iterator for Directives {
    type Item = Directive;

    fn next(&mut self) -> Option<Directive> {
        loop {
            if let Some(directive) = self.pending.pop_front() {
                return Some(directive);
            }
            let file = match self.files.next()? {
                Ok(file) => file,
                Err(warning) => {
                    self.record(warning);
                    continue;
                }
            };
            let path = match dunce::canonicalize(&file) {
                Ok(path) => path,
                Err(e) => {
                    self.record(ScanWarning::Unreadable {
                        path: file,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.record(ScanWarning::Unreadable {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let source = String::from_utf8_lossy(&bytes);
            let (directives, warnings) = parse_file(&path, &source, &self.families);
            for warning in warnings {
                self.record(warning);
            }
            if !directives.is_empty() {
                debug!(path = %path.display(), count = directives.len(), "Found directives");
            }
            self.pending.extend(directives);
        }
    }
}

/// Extract every directive of one file.
pub fn parse_file(
    path: &Path,
    source: &str,
    families: &[String],
) -> (Vec<Directive>, Vec<ScanWarning>) {
    let package = package_name(source);
    let mut directives = Vec::new();
    let mut warnings = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let Some((family, rest)) = match_marker(line, families) else {
            continue;
        };
        let line_no = index + 1;
        match tokenize(rest) {
            Ok(words) if words.is_empty() => warnings.push(ScanWarning::Malformed {
                path: path.to_path_buf(),
                line: line_no,
                reason: "no generator arguments".to_string(),
            }),
            Ok(words) => directives.push(Directive {
                path: path.to_path_buf(),
                line: line_no,
                family: family.to_string(),
                raw: line.trim_end().to_string(),
                words,
                package: package.clone(),
            }),
            Err(reason) => warnings.push(ScanWarning::Malformed {
                path: path.to_path_buf(),
                line: line_no,
                reason,
            }),
        }
    }

    (directives, warnings)
}

/// Match `//<family>:generate` at column 0, followed by whitespace or end of line.
fn match_marker<'a, 'f>(line: &'a str, families: &'f [String]) -> Option<(&'f str, &'a str)> {
    let body = line.strip_prefix("//")?;
    for family in families {
        let Some(rest) = body
            .strip_prefix(family.as_str())
            .and_then(|r| r.strip_prefix(":generate"))
        else {
            continue;
        };
        if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
            return Some((family.as_str(), rest.trim_end_matches('\r')));
        }
    }
    None
}

/// Name from the first `package` clause.
pub fn package_name(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix("package")?;
        if !rest.starts_with(' ') && !rest.starts_with('\t') {
            return None;
        }
        rest.split_whitespace().next().map(str::to_string)
    })
}
