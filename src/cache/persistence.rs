//! Persistence layer for the Cache Store

use crate::cache::{CacheEntry, CacheStore};
use crate::directive::DirectiveKey;
use crate::error::CacheError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SCHEMA_KEY: &[u8] = b"__genfast_schema";
const SCHEMA_VERSION: u32 = 1;

/// Sled-backed cache with an in-memory working copy.
///
/// Entries are loaded once on open. Every `put` writes through to sled so an
/// interrupted run keeps the entries of the directives that already
/// finished. A cache that cannot be read is treated as empty; a cache that
/// cannot be written makes `flush` fail.
pub struct SledCacheStore {
    path: PathBuf,
    db: Option<sled::Db>,
    entries: RwLock<HashMap<DirectiveKey, CacheEntry>>,
    unavailable: Option<String>,
    write_failures: Mutex<Vec<String>>,
}

impl SledCacheStore {
    /// Open the cache at `path`, never failing.
    ///
    /// A corrupt database is deleted and recreated. If the database cannot be
    /// opened at all the store works in memory and reports the problem from
    /// `flush`.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let db = match sled::open(&path) {
            Ok(db) => Ok(db),
            Err(sled::Error::Corruption { .. }) => {
                warn!(path = %path.display(), "Cache database is corrupt; starting with an empty cache");
                std::fs::remove_dir_all(&path)
                    .map_err(CacheError::from)
                    .and_then(|_| sled::open(&path).map_err(CacheError::from))
            }
            Err(e) => Err(CacheError::from(e)),
        };

        match db {
            Ok(db) => {
                let entries = load_entries(&db);
                info!(path = %path.display(), entries = entries.len(), "Cache loaded");
                Self {
                    path,
                    db: Some(db),
                    entries: RwLock::new(entries),
                    unavailable: None,
                    write_failures: Mutex::new(Vec::new()),
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache unavailable; treating it as empty");
                Self {
                    path,
                    db: None,
                    entries: RwLock::new(HashMap::new()),
                    unavailable: Some(e.to_string()),
                    write_failures: Mutex::new(Vec::new()),
                }
            }
        }
    }

    /// Store without persistence. `flush` always succeeds.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            db: None,
            entries: RwLock::new(HashMap::new()),
            unavailable: None,
            write_failures: Mutex::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether writes reach durable storage.
    pub fn is_persistent(&self) -> bool {
        self.db.is_some()
    }
}

/// Read every entry, dropping the table on schema mismatch and skipping
/// entries that fail to decode.
fn load_entries(db: &sled::Db) -> HashMap<DirectiveKey, CacheEntry> {
    let schema: Option<u32> = db
        .get(SCHEMA_KEY)
        .ok()
        .flatten()
        .and_then(|bytes| bincode::deserialize(&bytes).ok());
    if schema != Some(SCHEMA_VERSION) {
        if schema.is_some() || !db.is_empty() {
            warn!(found = ?schema, expected = SCHEMA_VERSION, "Cache schema changed; discarding entries");
        }
        let reset = db.clear().map_err(CacheError::from).and_then(|_| {
            let version = bincode::serialize(&SCHEMA_VERSION)?;
            db.insert(SCHEMA_KEY, version)?;
            Ok(())
        });
        if let Err(e) = reset {
            warn!(error = %e, "Failed to reset cache schema");
        }
        return HashMap::new();
    }

    let mut entries = HashMap::new();
    let mut undecodable = Vec::new();
    for item in db.iter() {
        let (key, value) = match item {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Failed to iterate cache; remaining entries ignored");
                break;
            }
        };
        if key.as_ref() == SCHEMA_KEY {
            continue;
        }
        let decoded = bincode::deserialize::<DirectiveKey>(&key)
            .and_then(|k| bincode::deserialize::<CacheEntry>(&value).map(|v| (k, v)));
        match decoded {
            Ok((k, v)) => {
                entries.insert(k, v);
            }
            Err(e) => {
                debug!(error = %e, "Skipping undecodable cache entry");
                undecodable.push(key);
            }
        }
    }

    if !undecodable.is_empty() {
        warn!(count = undecodable.len(), "Dropped undecodable cache entries");
        for key in undecodable {
            let _ = db.remove(key);
        }
    }
    entries
}

impl CacheStore for SledCacheStore {
    fn lookup(&self, key: &DirectiveKey) -> Option<CacheEntry> {
        self.entries.read().get(key).cloned()
    }

    fn put(&self, key: &DirectiveKey, entry: CacheEntry) -> Result<(), CacheError> {
        if let Some(db) = &self.db {
            let written = bincode::serialize(key)
                .and_then(|k| bincode::serialize(&entry).map(|v| (k, v)))
                .map_err(CacheError::from)
                .and_then(|(k, v)| db.insert(k, v).map_err(CacheError::from));
            if let Err(e) = written {
                self.write_failures.lock().push(e.to_string());
                return Err(e);
            }
        }
        self.entries.write().insert(key.clone(), entry);
        Ok(())
    }

    fn flush(&self) -> Result<(), CacheError> {
        if let Some(reason) = &self.unavailable {
            return Err(CacheError::Unavailable(reason.clone()));
        }
        let failures = self.write_failures.lock();
        if let Some(first) = failures.first() {
            return Err(CacheError::Unavailable(format!(
                "{} cache write(s) failed, first: {}",
                failures.len(),
                first
            )));
        }
        if let Some(db) = &self.db {
            db.flush()?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        if let Some(db) = &self.db {
            db.clear()?;
            db.insert(SCHEMA_KEY, bincode::serialize(&SCHEMA_VERSION)?)?;
            db.flush()?;
        }
        self.entries.write().clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
