//! Manager configuration.
//!
//! [`Options`] can be built in code or read from a TOML file:
//!
//! ```toml
//! archive = "assets/sqlfiles.zip"
//! preload = ["default/selectDual.sql", "simple/aa.txt"]
//! prefix = "archive_stem"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// How logical paths map onto in-archive paths.
///
/// Compressing a folder from a desktop file manager stores every entry
/// under that folder's name, while command line tools usually don't.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixPolicy {
    /// Logical paths are in-archive paths
    #[default]
    None,
    /// Prepend the archive's file name without its extension
    ArchiveStem,
    /// Prepend a fixed folder
    Custom(String),
}

impl PrefixPolicy {
    /// Resolve the policy for a given archive to the literal prefix to
    /// prepend, always ending in `/`.
    pub fn resolve(&self, archive: &Path) -> Option<String> {
        let folder = match self {
            PrefixPolicy::None => return None,
            PrefixPolicy::ArchiveStem => archive.file_stem()?.to_string_lossy().into_owned(),
            PrefixPolicy::Custom(prefix) => prefix.clone(),
        };
        let folder = folder.trim_matches('/');
        if folder.is_empty() {
            None
        } else {
            Some(format!("{folder}/"))
        }
    }
}

/// Configuration for a [`Manager`](crate::Manager)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    /// Archive backing the cache; not checked until first use
    pub archive: PathBuf,

    /// Logical paths to load at construction. Only lists of two or more
    /// paths are preloaded.
    #[serde(default)]
    pub preload: Vec<String>,

    #[serde(default)]
    pub prefix: PrefixPolicy,
}

/// Errors loading an options file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl Options {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            preload: Vec::new(),
            prefix: PrefixPolicy::None,
        }
    }

    pub fn with_preload<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.preload = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prefix(mut self, prefix: PrefixPolicy) -> Self {
        self.prefix = prefix;
        self
    }

    /// Load options from a TOML file.
    ///
    /// A relative `archive` is taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut options: Options = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if options.archive.is_relative() {
            if let Some(dir) = path.parent() {
                options.archive = dir.join(&options.archive);
            }
        }
        debug!("Loaded config {}: archive {}", path.display(), options.archive.display());
        Ok(options)
    }
}
