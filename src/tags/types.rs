//! Release tag collections shared by the resolver and the cache store

use serde::{Deserialize, Deserializer, Serialize};

use crate::tags::semver::compare_versions;

/// One upstream release and the system extensions published for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseVersion {
    /// Release tag, e.g. "v1.7.0"
    pub version: String,
    /// Extension image references available for this release
    #[serde(default, deserialize_with = "null_as_empty")]
    pub system_extensions: Vec<String>,
}

impl ReleaseVersion {
    /// Creates a release entry with no known extensions
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            system_extensions: Vec::new(),
        }
    }
}

/// Known releases at a point in time, keyed by `version`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub versions: Vec<ReleaseVersion>,
}

impl TagSet {
    pub fn new(versions: Vec<ReleaseVersion>) -> Self {
        Self { versions }
    }

    /// Returns true if a release with exactly this tag is present
    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.version == version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Sorts releases by semantic version, oldest first.
    ///
    /// The sort is stable, so entries comparing equal keep their relative order.
    pub fn sort_ascending(&mut self) {
        self.versions
            .sort_by(|a, b| compare_versions(&a.version, &b.version));
    }

    /// Appends every release from `delta` not already present, then re-sorts.
    ///
    /// Existing entries keep their extension lists. Returns the number of
    /// releases added.
    pub fn merge(&mut self, delta: TagSet) -> usize {
        let before = self.versions.len();
        for release in delta.versions {
            if !self.contains(&release.version) {
                self.versions.push(release);
            }
        }
        self.sort_ascending();
        self.versions.len() - before
    }

    /// Iterates over the release tags in their current order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(|v| v.version.as_str())
    }
}

impl FromIterator<ReleaseVersion> for TagSet {
    fn from_iter<I: IntoIterator<Item = ReleaseVersion>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
