//! Archive sources: where the cache goes on a miss.
//!
//! An [`ArchiveSource`] opens an archive by path and hands back an
//! [`Archive`]: the entries in archive order plus a way to open one of
//! them for reading. Dropping the archive releases the underlying file.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::io::LocalFileReader;
use crate::zip::{EntryReader, FormatResult, ZipExtractor, ZipFileEntry};

/// An opened archive
pub trait Archive {
    type Entry: Read;

    /// Entries in the order the archive lists them
    fn entries(&self) -> &[ZipFileEntry];

    /// Open an entry for reading
    fn open_entry(&self, entry: &ZipFileEntry) -> FormatResult<Self::Entry>;
}

/// Opens archives by path
pub trait ArchiveSource: Send + Sync {
    type Archive: Archive;

    /// Open the archive at `path`.
    ///
    /// An error here means the archive is unavailable, as opposed to an
    /// entry being missing from a readable archive.
    fn open_archive(&self, path: &Path) -> FormatResult<Self::Archive>;
}

/// ZIP archives on the local file system
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipSource;

/// A local ZIP archive with its central directory loaded
pub struct ZipArchive {
    extractor: ZipExtractor<LocalFileReader>,
    entries: Vec<ZipFileEntry>,
}

impl ArchiveSource for ZipSource {
    type Archive = ZipArchive;

    fn open_archive(&self, path: &Path) -> FormatResult<ZipArchive> {
        let reader = LocalFileReader::new(path)?;
        let extractor = ZipExtractor::new(Arc::new(reader));
        let entries = extractor.list_files()?;
        Ok(ZipArchive { extractor, entries })
    }
}

impl Archive for ZipArchive {
    type Entry = EntryReader<LocalFileReader>;

    fn entries(&self) -> &[ZipFileEntry] {
        &self.entries
    }

    fn open_entry(&self, entry: &ZipFileEntry) -> FormatResult<Self::Entry> {
        self.extractor.open_entry(entry)
    }
}
