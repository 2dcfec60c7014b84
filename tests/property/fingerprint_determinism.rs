//! Fingerprints depend on input content, never on discovery order

use genfast::directive::Directive;
use genfast::fingerprint::{
    compute_content_hash, compute_fingerprint, compute_fingerprint_from_hashes,
};
use genfast::plugin::InputOutputFiles;
use genfast::types::Hash;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn directive(raw: &str) -> Directive {
    Directive {
        path: PathBuf::from("/src/pkg/a.go"),
        line: 3,
        family: "go".to_string(),
        raw: raw.to_string(),
        words: raw.split_whitespace().skip(1).map(str::to_string).collect(),
        package: Some("pkg".to_string()),
    }
}

fn hashed(files: &BTreeMap<String, Vec<u8>>) -> Vec<(PathBuf, Hash)> {
    files
        .iter()
        .map(|(name, content)| (PathBuf::from("/src/pkg").join(name), compute_content_hash(content)))
        .collect()
}

/// Inputs inserted in any order fingerprint the same as sorted inputs
#[test]
fn test_fingerprint_ignores_discovery_order() {
    let config = proptest::test_runner::Config::with_cases(32);
    let mut runner = proptest::test_runner::TestRunner::new(config);
    let strategy = prop::collection::btree_map("[a-z]{1,8}\\.go", any::<Vec<u8>>(), 0..6)
        .prop_flat_map(|files| {
            let names: Vec<String> = files.keys().cloned().collect();
            (Just(files), Just(names).prop_shuffle())
        });

    runner
        .run(&strategy, |(files, discovery_order)| {
            let temp_dir = TempDir::new().unwrap();
            for (name, content) in &files {
                fs::write(temp_dir.path().join(name), content).unwrap();
            }

            let mut io = InputOutputFiles::new();
            for name in &discovery_order {
                io.inputs.insert(temp_dir.path().join(name));
            }
            let d = directive("//go:generate stringer -type=Pill");
            let from_disk = compute_fingerprint("stringer", &d, &io).unwrap();

            let sorted: Vec<(PathBuf, Hash)> = files
                .iter()
                .map(|(name, content)| (temp_dir.path().join(name), compute_content_hash(content)))
                .collect();
            prop_assert_eq!(
                from_disk,
                compute_fingerprint_from_hashes("stringer", &d, &sorted)
            );
            Ok(())
        })
        .unwrap();
}

/// Changing any single input's content changes the fingerprint
#[test]
fn test_fingerprint_tracks_every_input() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                prop::collection::btree_map("[a-z]{1,8}\\.go", any::<Vec<u8>>(), 1..6),
                any::<prop::sample::Index>(),
                any::<u8>(),
            ),
            |(files, index, extra)| {
                let d = directive("//go:generate stringer -type=Pill");
                let before = compute_fingerprint_from_hashes("stringer", &d, &hashed(&files));

                let mut edited = files.clone();
                let key = index.get(&files.keys().cloned().collect::<Vec<_>>()).clone();
                if let Some(content) = edited.get_mut(&key) {
                    content.push(extra);
                }
                let after = compute_fingerprint_from_hashes("stringer", &d, &hashed(&edited));

                prop_assert_ne!(before, after);
                Ok(())
            },
        )
        .unwrap();
}

/// Directive text and plugin name are part of the fingerprint
#[test]
fn test_fingerprint_separates_directive_text() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[a-zA-Z]{1,10}", "[a-zA-Z]{1,10}"),
            |(left, right)| {
                prop_assume!(left != right);
                let a = directive(&format!("//go:generate stringer -type={}", left));
                let b = directive(&format!("//go:generate stringer -type={}", right));
                prop_assert_ne!(
                    compute_fingerprint_from_hashes("stringer", &a, &[]),
                    compute_fingerprint_from_hashes("stringer", &b, &[])
                );
                prop_assert_ne!(
                    compute_fingerprint_from_hashes(&left, &a, &[]),
                    compute_fingerprint_from_hashes(&right, &a, &[])
                );
                Ok(())
            },
        )
        .unwrap();
}
