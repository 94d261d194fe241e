//! Behavioral tests for the extract-once cache.
//!
//! These tests verify the contracts of `ExtractionCache::materialize`:
//! - Idempotence: a published directory is never extracted again
//! - Race safety: concurrent callers agree on one fully populated directory
//! - Lost races: a rename onto an already published directory is success
//! - Isolation: distinct identities get independent directories

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, missing_docs)]

use gqli_core::extract::{ArchiveExtractor, ExtractError, StandardExtractor};
use gqli_core::{
    ArtifactIdentity, DestinationPolicy, Error, ExtractionCache, PermissionSpec, ResolvedArtifact,
};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

const FILES: &[(&str, &str)] = &[
    ("graphql-inspector/package.json", "{\"name\":\"graphql-inspector\"}"),
    (
        "graphql-inspector/node_modules/@graphql-inspector/cli/index.js",
        "#!/usr/bin/env node\nrequire('./cli');\n",
    ),
    (
        "graphql-inspector/node_modules/@graphql-inspector/cli/cli.js",
        "module.exports = {};\n",
    ),
    ("graphql-inspector/LICENSE", "MIT"),
];

/// Counts calls and delegates to the real extractor.
#[derive(Default)]
struct SpyExtractor {
    calls: AtomicUsize,
}

impl ArchiveExtractor for SpyExtractor {
    fn extract_all(&self, archive: &Path, target: &Path) -> Result<(), ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StandardExtractor.extract_all(archive, target)
    }
}

/// Behaves like a second process that publishes the final directory while
/// this extractor is still unpacking.
struct RacingExtractor {
    final_dir: PathBuf,
}

impl ArchiveExtractor for RacingExtractor {
    fn extract_all(&self, archive: &Path, target: &Path) -> Result<(), ExtractError> {
        std::fs::create_dir_all(&self.final_dir)?;
        std::fs::write(self.final_dir.join("winner.txt"), b"published by another process")?;
        StandardExtractor.extract_all(archive, target)
    }
}

fn identity(classifier: &str) -> ArtifactIdentity {
    ArtifactIdentity::new(
        "com.github.ybroeker.maven.plugins",
        "graphql-inspector-maven-plugin",
        classifier,
        "zip",
        "1.0.0",
    )
}

fn write_archive(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    let mut writer = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    for (entry, content) in FILES {
        writer
            .start_file(*entry, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

fn file_set(root: &Path) -> BTreeSet<(String, String)> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            let content = std::fs::read_to_string(e.path()).unwrap();
            (relative, content)
        })
        .collect()
}

fn expected_files() -> BTreeSet<(String, String)> {
    FILES
        .iter()
        .map(|(name, content)| ((*name).to_string(), (*content).to_string()))
        .collect()
}

fn hidden_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
        })
        .collect()
}

struct Fixture {
    _temp: TempDir,
    archive: ResolvedArtifact,
    policy: DestinationPolicy,
    repo_dir: PathBuf,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let repo_dir = temp.path().join("repository");
    let path = write_archive(&repo_dir, "plugin-1.0.0-graphql-inspector-2.9.0.zip");
    let archive = ResolvedArtifact::new(identity("graphql-inspector-2.9.0"), path);
    let policy = DestinationPolicy::new(temp.path().join("target"));
    Fixture {
        _temp: temp,
        archive,
        policy,
        repo_dir,
    }
}

#[test]
fn second_materialize_performs_no_extraction() {
    let fx = fixture();
    let spy = Arc::new(SpyExtractor::default());
    let cache = ExtractionCache::new(spy.clone(), PermissionSpec::GLOBAL);

    let first = cache.materialize(&fx.archive, &fx.policy).unwrap();
    let second = cache.materialize(&fx.archive, &fx.policy).unwrap();

    assert_eq!(first, second);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    assert_eq!(file_set(&first), expected_files());
}

#[test]
fn separate_cache_instances_share_published_directory() {
    let fx = fixture();
    let spy = Arc::new(SpyExtractor::default());

    let first = ExtractionCache::new(spy.clone(), PermissionSpec::Inherit)
        .materialize(&fx.archive, &fx.policy)
        .unwrap();
    let second = ExtractionCache::new(spy.clone(), PermissionSpec::Inherit)
        .materialize(&fx.archive, &fx.policy)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn existing_directory_is_trusted_without_validation() {
    let fx = fixture();
    let final_dir = fx.policy.target_for(&fx.archive);
    std::fs::create_dir_all(&final_dir).unwrap();

    let spy = Arc::new(SpyExtractor::default());
    let cache = ExtractionCache::new(spy.clone(), PermissionSpec::Inherit);

    assert_eq!(cache.materialize(&fx.archive, &fx.policy).unwrap(), final_dir);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn concurrent_materialize_agrees_on_one_complete_directory() {
    const THREADS: usize = 12;

    let fx = fixture();
    let spy = Arc::new(SpyExtractor::default());
    let barrier = Barrier::new(THREADS);

    let results: Vec<PathBuf> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let cache = ExtractionCache::new(spy.clone(), PermissionSpec::GLOBAL);
                let barrier = &barrier;
                let fx = &fx;
                s.spawn(move || {
                    barrier.wait();
                    cache.materialize(&fx.archive, &fx.policy).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let expected_dir = fx.policy.target_for(&fx.archive);
    assert!(results.iter().all(|p| *p == expected_dir));
    assert_eq!(spy.calls.load(Ordering::SeqCst), 1);
    assert_eq!(file_set(&expected_dir), expected_files());
    assert!(hidden_entries(&fx.repo_dir).is_empty());
}

#[test]
fn rename_onto_published_directory_is_absorbed() {
    let fx = fixture();
    let final_dir = fx.policy.target_for(&fx.archive);
    let racer = Arc::new(RacingExtractor {
        final_dir: final_dir.clone(),
    });
    let cache = ExtractionCache::new(racer, PermissionSpec::Inherit);

    let result = cache.materialize(&fx.archive, &fx.policy).unwrap();

    assert_eq!(result, final_dir);
    // The winner's directory is left untouched
    assert_eq!(
        file_set(&final_dir),
        BTreeSet::from([(
            "winner.txt".to_string(),
            "published by another process".to_string()
        )])
    );
    // Our own extraction is orphaned, not deleted
    let orphans = hidden_entries(&fx.repo_dir);
    assert_eq!(orphans.len(), 1);
    assert_eq!(file_set(&orphans[0]), expected_files());
}

#[test]
fn distinct_identities_get_independent_directories() {
    let fx = fixture();
    let other_path = write_archive(&fx.repo_dir, "plugin-1.0.0-graphql-inspector-3.0.0.zip");
    let other = ResolvedArtifact::new(identity("graphql-inspector-3.0.0"), other_path);
    let spy = Arc::new(SpyExtractor::default());

    let cache_a = ExtractionCache::new(spy.clone(), PermissionSpec::Inherit);
    let cache_b = ExtractionCache::new(spy.clone(), PermissionSpec::Inherit);
    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| cache_a.materialize(&fx.archive, &fx.policy).unwrap());
        let b = s.spawn(|| cache_b.materialize(&other, &fx.policy).unwrap());
        (a.join().unwrap(), b.join().unwrap())
    });

    assert_ne!(a, b);
    assert_eq!(spy.calls.load(Ordering::SeqCst), 2);
    assert_eq!(file_set(&a), expected_files());
    assert_eq!(file_set(&b), expected_files());
}

#[test]
fn snapshot_archives_are_extracted_into_build_dir() {
    let fx = fixture();
    let snapshot = ResolvedArtifact::new(
        ArtifactIdentity::new(
            "com.github.ybroeker.maven.plugins",
            "graphql-inspector-maven-plugin",
            "graphql-inspector-2.9.0",
            "zip",
            "1.1.0-SNAPSHOT",
        ),
        fx.archive.path.clone(),
    );
    let cache = ExtractionCache::new(Arc::new(StandardExtractor), PermissionSpec::Inherit);

    let dir = cache.materialize(&snapshot, &fx.policy).unwrap();

    assert_eq!(dir.parent(), Some(fx.policy.build_dir()));
    assert_eq!(file_set(&dir), expected_files());
}

#[test]
fn corrupt_archive_reports_extraction_failure() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.zip");
    std::fs::write(&path, b"PK\x03\x04 truncated").unwrap();
    let archive = ResolvedArtifact::new(identity("graphql-inspector-2.9.0"), path.clone());
    let policy = DestinationPolicy::new(temp.path().join("target"));
    let cache = ExtractionCache::new(Arc::new(StandardExtractor), PermissionSpec::Inherit);

    let err = cache.materialize(&archive, &policy).unwrap_err();

    assert!(matches!(err, Error::ExtractionFailure { ref archive, .. } if *archive == path));
    assert!(!policy.target_for(&archive).exists());
}

#[test]
#[cfg(unix)]
fn extracted_entries_are_shared_with_all_users() {
    use std::os::unix::fs::PermissionsExt;

    let fx = fixture();
    let cache = ExtractionCache::new(Arc::new(StandardExtractor), PermissionSpec::GLOBAL);
    let dir = cache.materialize(&fx.archive, &fx.policy).unwrap();

    for entry in WalkDir::new(&dir) {
        let entry = entry.unwrap();
        let mode = entry.metadata().unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o777, "{}", entry.path().display());
    }
}

const WORKER_ROOT_ENV: &str = "GQLI_CACHE_WORKER_ROOT";

fn shared_archive(root: &Path) -> (ResolvedArtifact, DestinationPolicy) {
    let path = root.join("repository").join("plugin-1.0.0-graphql-inspector-2.9.0.zip");
    let archive = ResolvedArtifact::new(identity("graphql-inspector-2.9.0"), path);
    (archive, DestinationPolicy::new(root.join("target")))
}

/// Runs inside the child processes started by
/// `concurrent_processes_agree_on_one_complete_directory`. Without the
/// worker environment it has nothing to do.
#[test]
fn materialize_in_child_process() {
    let Ok(root) = std::env::var(WORKER_ROOT_ENV) else {
        return;
    };
    let root = PathBuf::from(root);
    let start = root.join("start");
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(60);
    while !start.exists() {
        assert!(std::time::Instant::now() < deadline, "start signal never arrived");
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    let (archive, policy) = shared_archive(&root);
    let cache = ExtractionCache::new(Arc::new(StandardExtractor), PermissionSpec::GLOBAL);
    let dir = cache.materialize(&archive, &policy).unwrap();

    let report = root.join("results").join(std::process::id().to_string());
    std::fs::write(report, dir.to_string_lossy().as_bytes()).unwrap();
}

#[test]
fn concurrent_processes_agree_on_one_complete_directory() {
    const PROCESSES: usize = 10;

    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_archive(&root.join("repository"), "plugin-1.0.0-graphql-inspector-2.9.0.zip");
    std::fs::create_dir_all(root.join("results")).unwrap();

    let exe = std::env::current_exe().unwrap();
    let children: Vec<_> = (0..PROCESSES)
        .map(|_| {
            std::process::Command::new(&exe)
                .args(["materialize_in_child_process", "--exact", "--test-threads=1"])
                .env(WORKER_ROOT_ENV, root)
                .stdout(std::process::Stdio::null())
                .spawn()
                .unwrap()
        })
        .collect();
    std::fs::write(root.join("start"), b"").unwrap();

    for mut child in children {
        assert!(child.wait().unwrap().success());
    }

    let (archive, policy) = shared_archive(root);
    let expected_dir = policy.target_for(&archive);
    let reported: Vec<PathBuf> = std::fs::read_dir(root.join("results"))
        .unwrap()
        .map(|e| PathBuf::from(std::fs::read_to_string(e.unwrap().path()).unwrap()))
        .collect();

    assert_eq!(reported.len(), PROCESSES);
    assert!(reported.iter().all(|p| *p == expected_dir));
    assert_eq!(file_set(&expected_dir), expected_files());
    // Losers leave their temp directories behind, each one complete
    for orphan in hidden_entries(&root.join("repository")) {
        assert_eq!(file_set(&orphan), expected_files());
    }
}
