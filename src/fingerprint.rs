//! Directive fingerprints using BLAKE3
//!
//! Fingerprint = hash(version || plugin || path || directive || inputs)
//!
//! Inputs are hashed in sorted path order with their content hashes, so the
//! result does not depend on the order resolution discovered them in.

use crate::directive::Directive;
use crate::plugin::InputOutputFiles;
use crate::types::Hash;
use blake3::Hasher;
use std::path::{Path, PathBuf};

const FINGERPRINT_VERSION: &[u8] = b"genfast-fingerprint-v1";

fn update_len_prefixed(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Compute content hash for file bytes
pub fn compute_content_hash(content: &[u8]) -> Hash {
    *blake3::hash(content).as_bytes()
}

/// Fingerprint a directive from already-hashed inputs.
///
/// `inputs` must be sorted by path.
pub fn compute_fingerprint_from_hashes(
    plugin: &str,
    directive: &Directive,
    inputs: &[(PathBuf, Hash)],
) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(FINGERPRINT_VERSION);
    update_len_prefixed(&mut hasher, plugin.as_bytes());
    update_len_prefixed(&mut hasher, directive.path.to_string_lossy().as_bytes());
    update_len_prefixed(&mut hasher, directive.raw.as_bytes());

    hasher.update(&(inputs.len() as u64).to_be_bytes());
    for (path, content_hash) in inputs {
        update_len_prefixed(&mut hasher, path.to_string_lossy().as_bytes());
        hasher.update(content_hash);
    }

    *hasher.finalize().as_bytes()
}

/// Read every input file and fingerprint the directive.
///
/// Returns the path that could not be read on failure.
pub fn compute_fingerprint(
    plugin: &str,
    directive: &Directive,
    io: &InputOutputFiles,
) -> Result<Hash, (PathBuf, std::io::Error)> {
    let mut hashed = Vec::with_capacity(io.inputs.len());
    for path in &io.inputs {
        hashed.push((path.clone(), hash_file(path).map_err(|e| (path.clone(), e))?));
    }
    Ok(compute_fingerprint_from_hashes(plugin, directive, &hashed))
}

fn hash_file(path: &Path) -> std::io::Result<Hash> {
    let content = std::fs::read(path)?;
    Ok(compute_content_hash(&content))
}
