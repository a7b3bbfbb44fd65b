//! ZIP (and JAR) container reading for the cache.
//!
//! The central directory is read from the end of the archive, ZIP64
//! records included, and gives the entry list. Entry data is only touched
//! when an entry is opened: [`ZipExtractor::open_entry`] returns an
//! [`EntryReader`] that inflates DEFLATE or passes STORED data through,
//! and fails with `InvalidData` at end of stream if the byte count or
//! CRC-32 disagrees with the central directory. Other compression methods
//! are rejected when the entry is opened.

mod extractor;
mod parser;
mod structures;

pub use extractor::{EntryReader, ZipExtractor};
pub use parser::ZipParser;
pub use structures::*;
