use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::tags::error::CacheError;
use crate::tags::semver::compare_versions;
use crate::tags::types::TagSet;

/// JSON file holding the releases seen by previous runs
#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the cached tag set. A missing file yields an empty set.
    pub fn load(&self) -> Result<TagSet, CacheError> {
        if !self.exists() {
            info!("No cache at {:?}, starting empty", self.path);
            return Ok(TagSet::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let tags: TagSet = serde_json::from_str(&content)?;
        info!("Loaded {} cached versions from {:?}", tags.len(), self.path);

        Ok(tags)
    }

    /// Writes the tag set, replacing the previous file atomically
    pub fn save(&self, tags: &TagSet) -> Result<(), CacheError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let mut content = serde_json::to_vec_pretty(tags)?;
        content.push(b'\n');

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        temp.write_all(&content).map_err(|e| self.io_error(e))?;
        temp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!("Saved {} versions to {:?}", tags.len(), self.path);
        Ok(())
    }

    /// Merges `delta` into `known` and saves the result.
    ///
    /// Returns the tags that were added, in ascending order, only once they
    /// are on disk.
    pub fn merge_and_save(
        &self,
        known: &mut TagSet,
        delta: TagSet,
    ) -> Result<Vec<String>, CacheError> {
        let mut added: Vec<String> = delta
            .tags()
            .filter(|tag| !known.contains(tag))
            .map(str::to_string)
            .collect();
        added.sort_by(|a, b| compare_versions(a, b));

        known.merge(delta);
        self.save(known)?;

        Ok(added)
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
