//! Registry test utilities

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use talos_tags::tags::cache::CacheFile;
use talos_tags::tags::error::RegistryError;
use talos_tags::tags::registry::TagLister;
use talos_tags::tags::types::{ReleaseVersion, TagSet};

/// Mock registry for testing
pub struct MockRegistry {
    tags: Mutex<HashMap<String, Vec<String>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            tags: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_tags(self, repository: &str, tags: Vec<&str>) -> Self {
        self.publish(repository, tags);
        self
    }

    /// Replaces the tags published for a repository
    pub fn publish(&self, repository: &str, tags: Vec<&str>) {
        self.tags.lock().unwrap().insert(
            repository.to_string(),
            tags.into_iter().map(|t| t.to_string()).collect(),
        );
    }
}

#[async_trait]
impl TagLister for MockRegistry {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError> {
        match self.tags.lock().unwrap().get(repository) {
            Some(tags) => Ok(tags.clone()),
            None => Err(RegistryError::NotFound(repository.to_string())),
        }
    }
}

/// Create a cache file in a temp dir, pre-populated with `versions` when non-empty
pub fn create_test_cache(versions: &[(&str, Vec<&str>)]) -> (TempDir, CacheFile) {
    let temp_dir = TempDir::new().unwrap();
    let cache = CacheFile::new(temp_dir.path().join("versions.json"));

    if !versions.is_empty() {
        let tags = versions
            .iter()
            .map(|(version, extensions)| ReleaseVersion {
                version: version.to_string(),
                system_extensions: extensions.iter().map(|e| e.to_string()).collect(),
            })
            .collect::<TagSet>();
        cache.save(&tags).unwrap();
    }

    (temp_dir, cache)
}
