//! # zipack
//!
//! Read files straight out of a ZIP (or JAR) archive and keep their
//! decoded contents in memory after the first read.
//!
//! A [`Manager`] is bound to one archive. The first request for a path
//! scans the archive's central directory, inflates the matching entry and
//! stores it; later requests are served from memory. The cache only ever
//! grows and is safe to share between threads.
//!
//! ## Features
//!
//! - Bytes, independent readers, or file handles over the same cached data
//! - Optional eager loading of known paths at construction
//! - Configurable folder prefix for archives made by compressing a folder
//! - STORED and DEFLATE entries, ZIP64, CRC-32 verification
//! - A [`VirtualFs`] implementation and an HTTP front end ([`serve`])
//!
//! ## Example
//!
//! ```no_run
//! use zipack::{Manager, Options, PrefixPolicy};
//!
//! fn main() -> zipack::Result<()> {
//!     let mgr = Manager::new(
//!         Options::new("./testdata/sqlfiles.zip").with_prefix(PrefixPolicy::ArchiveStem),
//!     )?;
//!
//!     let sql = mgr.get_contents("default/selectDual.sql")?;
//!     println!("{}", String::from_utf8_lossy(&sql));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod file;
pub mod io;
pub mod serve;
pub mod source;
pub mod zip;

pub use cache::Manager;
pub use cli::Cli;
pub use config::{Options, PrefixPolicy};
pub use error::{Error, ErrorKind, Result};
pub use file::{FileInfo, VirtualFile, VirtualFs, ZipFile};
pub use io::{LocalFileReader, ReadAt};
pub use source::{Archive, ArchiveSource, ZipSource};
pub use zip::{ZipExtractor, ZipFileEntry};
