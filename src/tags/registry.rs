//! Registry trait for listing the tags of a container repository

use std::fmt;
use std::str::FromStr;

#[cfg(test)]
use mockall::automock;

use crate::tags::error::RegistryError;

/// Trait for listing tags published in a registry repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait TagLister: Send + Sync {
    /// Lists every tag currently published for a repository
    ///
    /// # Arguments
    /// * `repository` - Fully qualified name without a tag (e.g., "ghcr.io/siderolabs/extensions")
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Tags in the order reported by the registry
    /// * `Err(RegistryError)` - If the listing fails
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError>;
}

/// A repository name split into its registry host and path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryName {
    /// Registry host, optionally with a port (e.g., "ghcr.io", "localhost:5000")
    pub host: String,
    /// Repository path inside the registry (e.g., "siderolabs/extensions")
    pub path: String,
}

impl FromStr for RepositoryName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidRepository(s.to_string());

        let (host, path) = s.split_once('/').ok_or_else(invalid)?;
        if host.is_empty() || path.is_empty() {
            return Err(invalid());
        }
        // a tag or digest would make this an image reference, not a repository
        if path.contains([':', '@']) || path.split('/').any(str::is_empty) {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            path: path.to_string(),
        })
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.host, self.path)
    }
}
