//! Generation directives and their tokenization.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The generator family whose directives run `words[0]` as the program.
pub const GO_FAMILY: &str = "go";

/// A single `//<family>:generate ...` line found in a source file.
///
/// Created by the scanner and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Canonical absolute path of the declaring file
    pub path: PathBuf,
    /// 1-based line number, for diagnostics only
    pub line: usize,
    /// Generator family (`go` in `//go:generate`)
    pub family: String,
    /// Full comment line as written
    pub raw: String,
    /// Tokenized arguments following the marker
    pub words: Vec<String>,
    /// Package clause of the declaring file
    pub package: Option<String>,
}

/// Cache identity of a directive: declaring file plus raw text.
///
/// Line numbers are not part of the key: reordering the directives of a
/// file keeps their cache entries valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectiveKey {
    pub path: PathBuf,
    pub directive: String,
}

impl Directive {
    /// Directory containing the declaring file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// File name of the declaring file (the `GOFILE` of `go generate`).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn key(&self) -> DirectiveKey {
        DirectiveKey {
            path: self.path.clone(),
            directive: self.raw.clone(),
        }
    }

    /// Program and arguments of the underlying generator command.
    ///
    /// `//go:generate prog a b` runs `prog a b`; any other family runs the
    /// family name with all words as arguments.
    pub fn command(&self) -> Option<(String, Vec<String>)> {
        if self.family == GO_FAMILY {
            let (program, args) = self.words.split_first()?;
            Some((program.clone(), args.to_vec()))
        } else {
            Some((self.family.clone(), self.words.clone()))
        }
    }

    /// Word naming the program, used by plugins for matching.
    pub fn program(&self) -> Option<&str> {
        if self.family == GO_FAMILY {
            self.words.first().map(String::as_str)
        } else {
            Some(self.family.as_str())
        }
    }

    /// Arguments after the program word.
    pub fn args(&self) -> &[String] {
        if self.family == GO_FAMILY {
            self.words.get(1..).unwrap_or(&[])
        } else {
            &self.words
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.raw)
    }
}

/// Split directive arguments the way `go generate` does.
///
/// Words are separated by runs of spaces and tabs. A word starting with `"`
/// is a quoted string and must be followed by whitespace or the end of the
/// line.
pub fn tokenize(text: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(' ') | Some('\t')) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };

        if first == '"' {
            chars.next();
            let mut word = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('"') => word.push('"'),
                        Some('\\') => word.push('\\'),
                        Some('n') => word.push('\n'),
                        Some('t') => word.push('\t'),
                        Some(other) => return Err(format!("unknown escape \\{}", other)),
                        None => return Err("unterminated quoted string".to_string()),
                    },
                    _ => word.push(c),
                }
            }
            if !closed {
                return Err("unterminated quoted string".to_string());
            }
            if let Some(&next) = chars.peek() {
                if next != ' ' && next != '\t' {
                    return Err(format!("unexpected {:?} after quoted string", next));
                }
            }
            words.push(word);
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c == ' ' || c == '\t' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            words.push(word);
        }
    }

    Ok(words)
}
