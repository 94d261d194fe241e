//! Property-based tests for cache directory naming and placement.
//!
//! These tests verify the behavioral contracts of `directory_name`:
//! - Determinism: the same identity always maps to the same directory
//! - Sensitivity: identities differing in version or classifier never share a directory
//! - Safety: names never contain path separators

#![allow(clippy::unwrap_used, missing_docs)]

use gqli_core::{ArtifactIdentity, DestinationPolicy, ResolvedArtifact, directory_name};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn version_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}".prop_map(String::from),
        "[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}-SNAPSHOT".prop_map(String::from),
    ]
}

/// Classifiers including separators and characters that need sanitizing
fn classifier_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "graphql-inspector-[0-9]\\.[0-9]{1,2}\\.[0-9]".prop_map(String::from),
        "[a-z_/\\\\:-]{1,16}".prop_map(String::from),
    ]
}

fn identity_strategy() -> impl Strategy<Value = ArtifactIdentity> {
    (
        "[a-z]{1,8}(\\.[a-z]{1,8}){0,2}",
        "[a-z][a-z-]{0,20}",
        classifier_strategy(),
        version_strategy(),
    )
        .prop_map(|(group, artifact, classifier, version)| {
            ArtifactIdentity::new(group, artifact, classifier, "zip", version)
        })
}

// =============================================================================
// Property tests
// =============================================================================

proptest! {
    #[test]
    fn name_is_deterministic(identity in identity_strategy()) {
        prop_assert_eq!(directory_name(&identity), directory_name(&identity.clone()));
    }

    #[test]
    fn name_is_a_single_path_component(identity in identity_strategy()) {
        let name = directory_name(&identity);
        prop_assert!(!name.contains('/'));
        prop_assert!(!name.contains('\\'));
        prop_assert!(!name.starts_with('.'));
        prop_assert_eq!(Path::new(&name).components().count(), 1);
    }

    #[test]
    fn different_versions_get_different_names(
        identity in identity_strategy(),
        other_version in version_strategy(),
    ) {
        prop_assume!(identity.version != other_version);
        let other = ArtifactIdentity { version: other_version, ..identity.clone() };
        prop_assert_ne!(directory_name(&identity), directory_name(&other));
    }

    #[test]
    fn different_classifiers_get_different_names(
        identity in identity_strategy(),
        other_classifier in classifier_strategy(),
    ) {
        prop_assume!(identity.classifier != other_classifier);
        let other = ArtifactIdentity { classifier: other_classifier, ..identity.clone() };
        prop_assert_ne!(directory_name(&identity), directory_name(&other));
    }

    #[test]
    fn placement_follows_snapshot_status(
        identity in identity_strategy(),
        extract_to_build_dir in any::<bool>(),
    ) {
        let archive = ResolvedArtifact::new(
            identity.clone(),
            PathBuf::from("/repo/group/artifact/archive.zip"),
        );
        let policy = DestinationPolicy::new("/project/target")
            .with_extract_to_build_dir(extract_to_build_dir);

        let target = policy.target_for(&archive);
        let parent = target.parent().unwrap();
        if identity.is_snapshot() || extract_to_build_dir {
            prop_assert_eq!(parent, Path::new("/project/target"));
        } else {
            prop_assert_eq!(parent, Path::new("/repo/group/artifact"));
        }
    }
}

#[test]
fn joined_fields_do_not_collide() {
    let a = ArtifactIdentity::new("g", "tool", "b-c", "zip", "1.0-a");
    let b = ArtifactIdentity::new("g", "tool", "c", "zip", "1.0-a-b");
    assert_ne!(directory_name(&a), directory_name(&b));
}
