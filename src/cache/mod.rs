//! Cache Store
//!
//! Maps a directive's identity to the fingerprint and output patterns of its
//! last successful run. Entries are independent of each other.

pub mod persistence;

pub use persistence::SledCacheStore;

use crate::directive::DirectiveKey;
use crate::error::CacheError;
use crate::types::Hash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Record of a directive's last successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Hash,
    pub output_patterns: BTreeSet<String>,
    pub plugin: String,
    pub last_success: DateTime<Utc>,
}

/// Cache Store interface
///
/// `lookup` may be called concurrently with `lookup` and `put`; `put` must be
/// internally synchronized.
pub trait CacheStore: Send + Sync {
    fn lookup(&self, key: &DirectiveKey) -> Option<CacheEntry>;
    fn put(&self, key: &DirectiveKey, entry: CacheEntry) -> Result<(), CacheError>;
    /// Make every accepted `put` durable.
    fn flush(&self) -> Result<(), CacheError>;
    fn clear(&self) -> Result<(), CacheError>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why a directive must run, or that it need not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Staleness {
    Fresh,
    Missing,
    FingerprintChanged,
    OutputsChanged,
    /// Up to date, but rerun on request
    Forced,
}

impl Staleness {
    pub fn is_stale(self) -> bool {
        !matches!(self, Staleness::Fresh)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Staleness::Fresh => "up to date",
            Staleness::Missing => "never run",
            Staleness::FingerprintChanged => "inputs changed",
            Staleness::OutputsChanged => "outputs changed",
            Staleness::Forced => "forced",
        }
    }

    /// Turn `Fresh` into `Forced` when every directive must run.
    pub fn forced_if(self, force: bool) -> Self {
        match self {
            Staleness::Fresh if force => Staleness::Forced,
            other => other,
        }
    }
}

/// Compare a cache entry against freshly resolved state.
///
/// An entry is only trusted when both its fingerprint and its output
/// patterns still match.
pub fn staleness(
    entry: Option<&CacheEntry>,
    fingerprint: &Hash,
    outputs: &BTreeSet<String>,
) -> Staleness {
    match entry {
        None => Staleness::Missing,
        Some(entry) if entry.fingerprint != *fingerprint => Staleness::FingerprintChanged,
        Some(entry) if entry.output_patterns != *outputs => Staleness::OutputsChanged,
        Some(_) => Staleness::Fresh,
    }
}
