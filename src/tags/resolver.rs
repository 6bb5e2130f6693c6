//! Missing release resolution against the upstream registry
//!
//! Compares the tags currently published upstream with a cached [`TagSet`]
//! and produces the delta of releases the cache does not know yet. The cache
//! itself is never modified; merging and persisting is left to the caller.

use std::time::Duration;

use tracing::{debug, trace};

use crate::tags::error::RegistryError;
use crate::tags::registry::TagLister;
use crate::tags::types::{ReleaseVersion, TagSet};

/// Prefix every release tag carries
const RELEASE_TAG_PREFIX: char = 'v';

/// Lists `repository` and returns the releases missing from `cached`, sorted
/// ascending by semantic version.
///
/// Tags without the `v` prefix are skipped. New entries carry no extensions.
/// An empty delta is a valid result.
pub async fn resolve_missing(
    lister: &dyn TagLister,
    repository: &str,
    cached: &TagSet,
) -> Result<TagSet, RegistryError> {
    debug!("calling registry docker://{}...", repository);
    let upstream_tags = lister.list_tags(repository).await?;

    let mut missing = TagSet::default();
    for tag in upstream_tags {
        if !tag.starts_with(RELEASE_TAG_PREFIX) {
            trace!("skipping tag {}", tag);
            continue;
        }
        // paginated listings may repeat a tag across page boundaries
        if cached.contains(&tag) || missing.contains(&tag) {
            continue;
        }

        debug!("adding new tag {}", tag);
        missing.versions.push(ReleaseVersion::new(tag));
    }

    missing.sort_ascending();
    debug!(
        "finalizing list of tags to append: {:?}",
        missing.tags().collect::<Vec<_>>()
    );

    Ok(missing)
}

/// [`resolve_missing`] bounded by an overall deadline.
///
/// The pending registry request is dropped, and thereby cancelled, when the
/// deadline passes.
pub async fn resolve_missing_within(
    lister: &dyn TagLister,
    repository: &str,
    cached: &TagSet,
    timeout: Duration,
) -> Result<TagSet, RegistryError> {
    tokio::time::timeout(timeout, resolve_missing(lister, repository, cached))
        .await
        .map_err(|_| RegistryError::Timeout(timeout))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::registry::MockTagLister;
    use crate::tags::semver::compare_versions;
    use mockall::predicate::eq;
    use rstest::rstest;
    use std::cmp::Ordering;

    const REPOSITORY: &str = "ghcr.io/siderolabs/extensions";

    fn lister_returning(tags: &[&str]) -> MockTagLister {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        let mut lister = MockTagLister::new();
        lister
            .expect_list_tags()
            .with(eq(REPOSITORY))
            .returning(move |_| Ok(tags.clone()));
        lister
    }

    fn tag_set(tags: &[&str]) -> TagSet {
        tags.iter().map(|t| ReleaseVersion::new(*t)).collect()
    }

    #[tokio::test]
    async fn resolve_missing_keeps_only_v_prefixed_tags() {
        let lister = lister_returning(&["latest", "v1.2.3", "1.2.3"]);

        let delta = resolve_missing(&lister, REPOSITORY, &TagSet::default())
            .await
            .unwrap();

        assert_eq!(delta, tag_set(&["v1.2.3"]));
    }

    #[rstest]
    #[case(&[], &["v1.6.0", "v1.5.0"], &["v1.5.0", "v1.6.0"])]
    #[case(&["v1.5.0"], &["v1.6.0", "v1.5.0"], &["v1.6.0"])]
    #[case(&["v1.5.0", "v1.6.0"], &["v1.6.0", "v1.5.0"], &[])]
    #[case(&["v1.5.0"], &["v1.10.0", "sha256-abc.sig", "v1.9.0", "v1.10.0-alpha.1"], &["v1.9.0", "v1.10.0-alpha.1", "v1.10.0"])]
    #[case(&[], &[], &[])]
    #[tokio::test]
    async fn resolve_missing_returns_sorted_delta(
        #[case] cached: &[&str],
        #[case] upstream: &[&str],
        #[case] expected: &[&str],
    ) {
        let lister = lister_returning(upstream);

        let delta = resolve_missing(&lister, REPOSITORY, &tag_set(cached))
            .await
            .unwrap();

        assert_eq!(delta.tags().collect::<Vec<_>>(), expected.to_vec());
    }

    #[tokio::test]
    async fn resolve_missing_never_returns_cached_versions() {
        let cached = tag_set(&["v1.4.0", "v1.6.2", "v1.7.0"]);
        let lister = lister_returning(&["v1.7.0", "v1.4.0", "v1.8.0", "v1.6.2", "v1.6.3"]);

        let delta = resolve_missing(&lister, REPOSITORY, &cached).await.unwrap();

        assert!(delta.tags().all(|tag| !cached.contains(tag)));
        assert_eq!(delta.len(), 2);
    }

    #[tokio::test]
    async fn resolve_missing_output_is_in_ascending_order() {
        let lister = lister_returning(&[
            "v1.3.0", "v0.14.1", "v1.10.2", "v1.0.0-beta.2", "v1.2", "v1.0.0", "v1.0.0-beta.10",
        ]);

        let delta = resolve_missing(&lister, REPOSITORY, &TagSet::default())
            .await
            .unwrap();

        let tags: Vec<&str> = delta.tags().collect();
        assert_eq!(tags.len(), 7);
        for pair in tags.windows(2) {
            assert_ne!(compare_versions(pair[0], pair[1]), Ordering::Greater);
        }
    }

    #[tokio::test]
    async fn resolve_missing_is_idempotent_until_the_delta_is_merged() {
        let cached = tag_set(&["v1.5.0"]);
        let lister = lister_returning(&["v1.6.0", "v1.5.0", "v1.6.1"]);

        let first = resolve_missing(&lister, REPOSITORY, &cached).await.unwrap();
        let second = resolve_missing(&lister, REPOSITORY, &cached).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached, tag_set(&["v1.5.0"]));
    }

    #[tokio::test]
    async fn resolve_missing_drops_repeated_upstream_tags() {
        let lister = lister_returning(&["v1.6.0", "v1.6.0"]);

        let delta = resolve_missing(&lister, REPOSITORY, &TagSet::default())
            .await
            .unwrap();

        assert_eq!(delta, tag_set(&["v1.6.0"]));
    }

    #[tokio::test]
    async fn resolve_missing_propagates_registry_errors() {
        let mut lister = MockTagLister::new();
        lister
            .expect_list_tags()
            .returning(|repository| Err(RegistryError::NotFound(repository.to_string())));

        let result = resolve_missing(&lister, REPOSITORY, &TagSet::default()).await;

        assert!(matches!(result, Err(RegistryError::NotFound(r)) if r == REPOSITORY));
    }

    struct StalledLister;

    #[async_trait::async_trait]
    impl TagLister for StalledLister {
        async fn list_tags(&self, _repository: &str) -> Result<Vec<String>, RegistryError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_missing_within_times_out_stalled_registry() {
        let timeout = Duration::from_secs(5);

        let result =
            resolve_missing_within(&StalledLister, REPOSITORY, &TagSet::default(), timeout).await;

        assert!(matches!(result, Err(RegistryError::Timeout(t)) if t == timeout));
    }

    #[tokio::test]
    async fn resolve_missing_within_returns_delta_before_deadline() {
        let lister = lister_returning(&["v1.6.0"]);

        let delta = resolve_missing_within(
            &lister,
            REPOSITORY,
            &TagSet::default(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(delta, tag_set(&["v1.6.0"]));
    }
}
