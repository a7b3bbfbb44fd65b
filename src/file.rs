//! File handles over cached entry bytes.
//!
//! [`VirtualFile`] and [`VirtualFs`] are the capability a host file
//! server needs: open a path, stat it, read it sequentially, close it.

use chrono::NaiveDateTime;
use std::io::{self, Read};
use std::sync::Arc;

use crate::zip::ZipFileEntry;

/// Metadata captured from an entry's header at decode time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Base name of the entry
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Permission bits
    pub mode: u32,
    /// Modification time, when the header carries a valid one
    pub modified: Option<NaiveDateTime>,
    pub is_dir: bool,
}

impl FileInfo {
    pub(crate) fn from_entry(entry: &ZipFileEntry) -> Self {
        let name = entry
            .file_name
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            name,
            size: entry.uncompressed_size,
            mode: entry.mode(),
            modified: entry.modified(),
            is_dir: entry.is_dir(),
        }
    }
}

/// A stat-able, sequentially readable, closeable file
pub trait VirtualFile: Read + Send {
    fn stat(&self) -> &FileInfo;

    fn close(&mut self) -> io::Result<()>;
}

/// A read-only file system that can back a static file server
pub trait VirtualFs: Send + Sync {
    type File: VirtualFile;

    /// Open a file.
    ///
    /// Missing files and directories both fail with
    /// [`io::ErrorKind::NotFound`].
    fn open(&self, path: &str) -> io::Result<Self::File>;
}

/// Handle over one cached entry.
///
/// The bytes are shared with the cache; the cursor belongs to this handle
/// alone. Closing rewinds the cursor and leaves the handle usable.
#[derive(Debug, Clone)]
pub struct ZipFile {
    info: Arc<FileInfo>,
    data: Arc<[u8]>,
    cursor: usize,
}

impl ZipFile {
    pub(crate) fn new(info: Arc<FileInfo>, data: Arc<[u8]>) -> Self {
        Self {
            info,
            data,
            cursor: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Current read position
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl Read for ZipFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data[self.cursor.min(self.data.len())..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.cursor += n;
        Ok(n)
    }
}

impl VirtualFile for ZipFile {
    fn stat(&self) -> &FileInfo {
        &self.info
    }

    fn close(&mut self) -> io::Result<()> {
        self.cursor = 0;
        Ok(())
    }
}
