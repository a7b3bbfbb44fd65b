use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::{self, Read};
use std::sync::Arc;

use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, FormatError, FormatResult, ZipFileEntry};

/// Lists entries and opens decode streams over them
pub struct ZipExtractor<R: ReadAt + ?Sized> {
    parser: ZipParser<R>,
}

impl<R: ReadAt + ?Sized> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub fn list_files(&self) -> FormatResult<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Open a decoding stream over one entry's data.
    ///
    /// The stream checks the recorded size and CRC-32 once it reaches the
    /// end, so a reader that drains it to EOF either gets the exact entry
    /// contents or an [`io::ErrorKind::InvalidData`] error.
    pub fn open_entry(&self, entry: &ZipFileEntry) -> FormatResult<EntryReader<R>> {
        let data_offset = self.parser.get_data_offset(entry)?;
        let section = SectionReader {
            reader: Arc::clone(self.parser.reader()),
            pos: data_offset,
            end: data_offset.saturating_add(entry.compressed_size),
        };

        let inner = match entry.compression_method {
            CompressionMethod::Stored => Decoder::Stored(section),
            CompressionMethod::Deflate => Decoder::Deflate(DeflateDecoder::new(section)),
            CompressionMethod::Unknown(_) => {
                return Err(FormatError::Io(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!(
                        "unsupported compression method: {}",
                        entry.compression_method.as_u16()
                    ),
                )));
            }
        };

        Ok(EntryReader {
            inner,
            crc: Crc::new(),
            read: 0,
            expected_crc: entry.crc32,
            expected_size: entry.uncompressed_size,
        })
    }
}

/// Reads the byte range `[pos, end)` of a [`ReadAt`] source
struct SectionReader<R: ReadAt + ?Sized> {
    reader: Arc<R>,
    pos: u64,
    end: u64,
}

impl<R: ReadAt + ?Sized> Read for SectionReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.end.saturating_sub(self.pos);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let len = buf.len().min(remaining.min(usize::MAX as u64) as usize);
        let n = self.reader.read_at(self.pos, &mut buf[..len])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "entry data truncated",
            ));
        }
        self.pos += n as u64;
        Ok(n)
    }
}

enum Decoder<R: ReadAt + ?Sized> {
    Stored(SectionReader<R>),
    Deflate(DeflateDecoder<SectionReader<R>>),
}

/// Decoded, verified byte stream for a single archive entry
pub struct EntryReader<R: ReadAt + ?Sized> {
    inner: Decoder<R>,
    crc: Crc,
    read: u64,
    expected_crc: u32,
    expected_size: u64,
}

impl<R: ReadAt + ?Sized> EntryReader<R> {
    fn verify(&self) -> io::Result<()> {
        if self.read != self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "entry size mismatch: expected {} bytes, got {}",
                    self.expected_size, self.read
                ),
            ));
        }
        if self.crc.sum() != self.expected_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "entry checksum mismatch",
            ));
        }
        Ok(())
    }
}

impl<R: ReadAt + ?Sized> Read for EntryReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = match &mut self.inner {
            Decoder::Stored(r) => r.read(buf)?,
            Decoder::Deflate(r) => r.read(buf)?,
        };
        if n == 0 {
            self.verify()?;
            return Ok(0);
        }
        self.crc.update(&buf[..n]);
        self.read += n as u64;
        if self.read > self.expected_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "entry larger than its recorded size",
            ));
        }
        Ok(n)
    }
}
