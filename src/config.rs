use serde::Deserialize;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Upstream repository whose tags mark cluster-OS releases
pub const DEFAULT_REPOSITORY: &str = "ghcr.io/siderolabs/extensions";

/// Timeout for each registry HTTP request in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Deadline for a complete tag listing, all pages included (2 minutes)
pub const RESOLVE_DEADLINE_MS: u64 = 120_000;

/// Number of tags requested per page of `tags/list`
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Grammar of an image reference: `registry/org/repo[:tag][@sha256:shasum]`.
///
/// `org` may span several path segments; `repo` is always the last one.
pub const REFERENCE_PATTERN: &str = concat!(
    r"^(?P<registry>[A-Za-z0-9][A-Za-z0-9.-]*(?::[0-9]+)?)/",
    r"(?P<org>[A-Za-z0-9._-]+(?:/[A-Za-z0-9._-]+)*)/",
    r"(?P<repo>[A-Za-z0-9._-]+)",
    r"(?::(?P<tag>[A-Za-z0-9_][A-Za-z0-9._-]*))?",
    r"(?:@sha256:(?P<shasum>[A-Fa-f0-9]+))?$",
);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tool configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Repository listed to discover releases
    pub repository: String,
    /// Location of the tag cache; `None` selects [`cache_path`]
    pub cache_file: Option<PathBuf>,
    /// Regular expression used to split image references
    pub reference_pattern: String,
    pub registry: RegistrySettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: DEFAULT_REPOSITORY.to_string(),
            cache_file: None,
            reference_pattern: REFERENCE_PATTERN.to_string(),
            registry: RegistrySettings::default(),
        }
    }
}

impl Config {
    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured cache file, or the default location in the data directory
    pub fn cache_file(&self) -> PathBuf {
        self.cache_file.clone().unwrap_or_else(cache_path)
    }
}

/// Registry client configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrySettings {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Deadline for resolving missing releases in milliseconds
    pub deadline_ms: u64,
    pub page_size: u32,
    /// Overrides `https://<registry host>`, e.g. for a mirror
    pub base_url: Option<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            timeout_ms: FETCH_TIMEOUT_MS,
            deadline_ms: RESOLVE_DEADLINE_MS,
            page_size: DEFAULT_PAGE_SIZE,
            base_url: None,
        }
    }
}

/// Returns the path to the data directory for talos-tags.
/// Uses $XDG_DATA_HOME/talos-tags if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/talos-tags,
/// or ./talos-tags if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the tag cache file.
pub fn cache_path() -> PathBuf {
    data_dir().join("versions.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("talos-tags")
}
