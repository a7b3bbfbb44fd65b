//! Shared fixtures: a small ZIP writer and instrumented archive sources.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use zipack::source::ZipArchive;
use zipack::zip::FormatResult;
use zipack::{ArchiveSource, ZipSource};

pub const SQLFILES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/sqlfiles.zip");

/// Contents of `sqlfiles/largerFile.txt` in the checked-in fixture
pub fn larger_file() -> String {
    (0..2000)
        .map(|k| format!("line {k:05}: the quick brown fox jumps over the lazy dog\n"))
        .collect()
}

struct Entry {
    name: String,
    data: Vec<u8>,
    deflate: bool,
    bad_crc: bool,
    method: Option<u16>,
    flip_payload: bool,
}

/// Writes ZIP archives the way a Unix `zip` would: DEFLATE by default,
/// Unix modes in the external attributes, a fixed timestamp.
#[derive(Default)]
pub struct ZipBuilder {
    entries: Vec<Entry>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            data: data.to_vec(),
            deflate: true,
            bad_crc: false,
            method: None,
            flip_payload: false,
        });
        self
    }

    pub fn stored(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(Entry {
            name: name.to_string(),
            data: data.to_vec(),
            deflate: false,
            bad_crc: false,
            method: None,
            flip_payload: false,
        });
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        assert!(name.ends_with('/'));
        self.entries.push(Entry {
            name: name.to_string(),
            data: Vec::new(),
            deflate: false,
            bad_crc: false,
            method: None,
            flip_payload: false,
        });
        self
    }

    /// Record a wrong checksum for the last added entry
    pub fn with_bad_crc(mut self) -> Self {
        if let Some(last) = self.entries.last_mut() {
            last.bad_crc = true;
        }
        self
    }

    /// Record a different compression method for the last added entry,
    /// leaving its payload as written
    pub fn method(mut self, method: u16) -> Self {
        if let Some(last) = self.entries.last_mut() {
            last.method = Some(method);
        }
        self
    }

    /// Invert every payload byte of the last added entry
    pub fn with_flipped_payload(mut self) -> Self {
        if let Some(last) = self.entries.last_mut() {
            last.flip_payload = true;
        }
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let mut crc = flate2::Crc::new();
            crc.update(&entry.data);
            let mut crc = crc.sum();
            if entry.bad_crc {
                crc ^= 0xFFFF_FFFF;
            }

            let payload = if entry.deflate {
                let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
                enc.write_all(&entry.data).unwrap();
                enc.finish().unwrap()
            } else {
                entry.data.clone()
            };
            let payload: Vec<u8> = if entry.flip_payload {
                payload.iter().map(|b| !b).collect()
            } else {
                payload
            };
            let method: u16 = entry.method.unwrap_or(if entry.deflate { 8 } else { 0 });
            let is_dir = entry.name.ends_with('/');
            let mode: u32 = if is_dir { 0o040755 } else { 0o100644 };
            // 2021-03-14 09:26:52
            let time: u16 = (9 << 11) | (26 << 5) | 26;
            let date: u16 = ((2021 - 1980) << 9) | (3 << 5) | 14;
            let offset = out.len() as u32;

            out.write_all(b"PK\x03\x04").unwrap();
            out.write_u16::<LittleEndian>(20).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_u16::<LittleEndian>(method).unwrap();
            out.write_u16::<LittleEndian>(time).unwrap();
            out.write_u16::<LittleEndian>(date).unwrap();
            out.write_u32::<LittleEndian>(crc).unwrap();
            out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            out.write_u32::<LittleEndian>(entry.data.len() as u32).unwrap();
            out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(0).unwrap();
            out.write_all(entry.name.as_bytes()).unwrap();
            out.write_all(&payload).unwrap();

            central.write_all(b"PK\x01\x02").unwrap();
            central.write_u16::<LittleEndian>(0x0314).unwrap();
            central.write_u16::<LittleEndian>(20).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(method).unwrap();
            central.write_u16::<LittleEndian>(time).unwrap();
            central.write_u16::<LittleEndian>(date).unwrap();
            central.write_u32::<LittleEndian>(crc).unwrap();
            central.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            central.write_u32::<LittleEndian>(entry.data.len() as u32).unwrap();
            central.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u16::<LittleEndian>(0).unwrap();
            central.write_u32::<LittleEndian>(mode << 16).unwrap();
            central.write_u32::<LittleEndian>(offset).unwrap();
            central.write_all(entry.name.as_bytes()).unwrap();
        }

        let cd_offset = out.len() as u32;
        out.write_all(&central).unwrap();
        out.write_all(b"PK\x05\x06").unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        out.write_u32::<LittleEndian>(central.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(cd_offset).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// Counts how many times the archive is opened
#[derive(Default, Clone)]
pub struct CountingSource {
    pub scans: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

impl ArchiveSource for CountingSource {
    type Archive = ZipArchive;

    fn open_archive(&self, path: &Path) -> FormatResult<ZipArchive> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        ZipSource.open_archive(path)
    }
}

/// Holds every opener at a barrier so concurrent misses really overlap
pub struct GatedSource {
    pub gate: Arc<Barrier>,
    pub counter: CountingSource,
}

impl GatedSource {
    pub fn new(parties: usize) -> Self {
        Self {
            gate: Arc::new(Barrier::new(parties)),
            counter: CountingSource::default(),
        }
    }
}

impl ArchiveSource for GatedSource {
    type Archive = ZipArchive;

    fn open_archive(&self, path: &Path) -> FormatResult<ZipArchive> {
        self.gate.wait();
        self.counter.open_archive(path)
    }
}
