//! The read-through cache over one archive.
//!
//! Entries are decoded on first access (or at construction, see
//! [`Options::preload`]) and kept for the life of the [`Manager`]. Nothing
//! is ever evicted: the archive is treated as immutable, so a stored
//! payload never changes.
//!
//! Two threads missing on the same path at once will both scan the archive
//! and both store; the payloads are identical, so the later store is
//! harmless. Nothing is stored unless the entry decoded completely.

use dashmap::DashMap;
use std::borrow::Cow;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Options;
use crate::error::{Error, ErrorKind, Result};
use crate::file::{FileInfo, VirtualFs, ZipFile};
use crate::source::{Archive, ArchiveSource, ZipSource};
use crate::zip::{FormatError, ZipFileEntry};

/// Upper bound for the up-front buffer reservation when draining an entry
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// A fully decoded entry
#[derive(Debug, Clone)]
struct CachedEntry {
    info: Arc<FileInfo>,
    data: Arc<[u8]>,
}

/// Cached, concurrent, read-only access to the files in one archive
pub struct Manager<S: ArchiveSource = ZipSource> {
    archive_path: PathBuf,
    /// Folder prepended to logical paths, with trailing `/`
    prefix: Option<String>,
    source: S,
    cache: DashMap<String, CachedEntry>,
}

impl Manager {
    /// Create a manager for a local ZIP archive.
    ///
    /// Only a preload list of two or more paths is loaded eagerly; if any
    /// of them fails, construction fails.
    pub fn new(options: Options) -> Result<Self> {
        Self::with_source(options, ZipSource)
    }
}

impl<S: ArchiveSource> Manager<S> {
    /// Create a manager reading archives through `source`
    pub fn with_source(options: Options, source: S) -> Result<Self> {
        let prefix = options.prefix.resolve(&options.archive);
        let manager = Self {
            archive_path: options.archive,
            prefix,
            source,
            cache: DashMap::new(),
        };

        if options.preload.len() > 1 {
            for path in &options.preload {
                manager.read_and_store(path)?;
            }
            info!(
                "Preloaded {} files from {}",
                options.preload.len(),
                manager.archive_path.display()
            );
        }

        Ok(manager)
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Whether `path` has been decoded and stored
    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains_key(path)
    }

    /// Number of stored entries
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Contents of the file at `path`, from the cache when present
    pub fn get_contents(&self, path: &str) -> Result<Arc<[u8]>> {
        Ok(self.lookup(path)?.data)
    }

    /// A fresh reader positioned at the start of the file at `path`.
    ///
    /// Readers share the cached bytes but never each other's position.
    pub fn get_reader(&self, path: &str) -> Result<Cursor<Arc<[u8]>>> {
        Ok(Cursor::new(self.lookup(path)?.data))
    }

    /// A new file handle for `path` with its own cursor
    pub fn open(&self, path: &str) -> Result<ZipFile> {
        let entry = self.lookup(path)?;
        Ok(ZipFile::new(entry.info, entry.data))
    }

    /// All entries of the archive, in archive order
    pub fn list_entries(&self) -> Result<Vec<ZipFileEntry>> {
        let archive = self.open_archive()?;
        Ok(archive.entries().to_vec())
    }

    fn lookup(&self, path: &str) -> Result<CachedEntry> {
        if let Some(entry) = self.cache.get(path) {
            debug!("Cache hit: {}", path);
            return Ok(entry.clone());
        }
        debug!("Cache miss: {}", path);
        self.read_and_store(path)
    }

    fn open_archive(&self) -> Result<S::Archive> {
        self.source
            .open_archive(&self.archive_path)
            .map_err(|source| Error::ArchiveUnavailable {
                path: self.archive_path.clone(),
                source,
            })
    }

    /// In-archive name for a logical path
    fn archive_name<'a>(&self, path: &'a str) -> Cow<'a, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}{path}")),
            None => Cow::Borrowed(path),
        }
    }

    /// Scan the archive for `path`, decode it and store it.
    ///
    /// The archive is dropped, and with it the file handle, on every
    /// return path.
    fn read_and_store(&self, path: &str) -> Result<CachedEntry> {
        let archive = self.open_archive()?;
        let name = self.archive_name(path);
        debug!("Scanning {} for {}", self.archive_path.display(), name);

        let Some(entry) = archive.entries().iter().find(|e| e.file_name == name) else {
            return Err(Error::NotFound {
                path: path.to_string(),
            });
        };

        if entry.is_dir() {
            return Err(Error::IsADirectory {
                path: path.to_string(),
            });
        }

        let decode_failure = |source: FormatError| Error::DecodeFailure {
            path: path.to_string(),
            source,
        };

        let mut reader = archive.open_entry(entry).map_err(decode_failure)?;
        let mut data = Vec::with_capacity(entry.uncompressed_size.min(MAX_PREALLOC) as usize);
        reader
            .read_to_end(&mut data)
            .map_err(|e| decode_failure(FormatError::Io(e)))?;

        let cached = CachedEntry {
            info: Arc::new(FileInfo::from_entry(entry)),
            data: Arc::from(data),
        };
        self.cache.insert(path.to_string(), cached.clone());
        debug!("Stored {} ({} bytes)", path, cached.data.len());
        Ok(cached)
    }
}

impl<S: ArchiveSource> VirtualFs for Manager<S> {
    type File = ZipFile;

    fn open(&self, path: &str) -> io::Result<ZipFile> {
        Manager::<S>::open(self, path).map_err(|err| match err.kind() {
            // Directories are reported missing so no listing is ever served
            ErrorKind::IsADirectory => io::Error::new(io::ErrorKind::NotFound, err),
            _ => err.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrefixPolicy;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/sqlfiles.zip");

    fn manager() -> Manager {
        Manager::new(Options::new(FIXTURE)).unwrap()
    }

    #[test]
    fn archive_name_applies_prefix() {
        let mgr = Manager::new(Options::new(FIXTURE).with_prefix(PrefixPolicy::ArchiveStem))
            .unwrap();
        assert_eq!(mgr.archive_name("default/selectDual.sql"), "sqlfiles/default/selectDual.sql");
        assert_eq!(manager().archive_name("a.txt"), "a.txt");
    }

    #[test]
    fn new_does_not_touch_archive() {
        let mgr = Manager::new(Options::new("/definitely/not/here.zip")).unwrap();
        assert_eq!(mgr.cached_len(), 0);
    }

    #[test]
    fn single_preload_path_is_ignored() {
        let options = Options::new(FIXTURE).with_preload(["sqlfiles/simple/aa.txt"]);
        let mgr = Manager::new(options).unwrap();
        assert!(!mgr.is_cached("sqlfiles/simple/aa.txt"));
    }

    #[test]
    fn miss_populates_cache_under_logical_key() {
        let mgr = Manager::new(Options::new(FIXTURE).with_prefix(PrefixPolicy::ArchiveStem))
            .unwrap();
        let data = mgr.get_contents("default/selectDual.sql").unwrap();
        assert_eq!(&*data, b"select * from DUAL");
        assert!(mgr.is_cached("default/selectDual.sql"));
        assert!(!mgr.is_cached("sqlfiles/default/selectDual.sql"));
    }

    #[test]
    fn virtual_fs_hides_directories() {
        let mgr = manager();
        let err = VirtualFs::open(&mgr, "sqlfiles/default/").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn failures_store_nothing() {
        let mgr = manager();
        assert!(mgr.get_contents("sqlfiles/default/missing.sql").is_err());
        assert!(mgr.get_contents("sqlfiles/simple/").is_err());
        assert_eq!(mgr.cached_len(), 0);
    }
}
