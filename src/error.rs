//! Error types for zipack
//!
//! Every accessor returns [`Result<T>`]; callers branch on [`Error::kind`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::zip::FormatError;

/// Result type alias for zipack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable discriminant for [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ArchiveUnavailable,
    NotFound,
    IsADirectory,
    DecodeFailure,
}

/// All errors that can occur while reading through the cache
#[derive(Error, Debug)]
pub enum Error {
    /// The archive itself could not be opened or its directory parsed
    #[error("cannot open archive {}: {source}", path.display())]
    ArchiveUnavailable {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("open {path}: file does not exist")]
    NotFound { path: String },

    #[error("open {path}: is a directory")]
    IsADirectory { path: String },

    /// The entry exists but could not be fully read or decompressed
    #[error("cannot decode {path}: {source}")]
    DecodeFailure {
        path: String,
        #[source]
        source: FormatError,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ArchiveUnavailable { .. } => ErrorKind::ArchiveUnavailable,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::IsADirectory { .. } => ErrorKind::IsADirectory,
            Error::DecodeFailure { .. } => ErrorKind::DecodeFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match err.kind() {
            ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::IsADirectory => io::ErrorKind::IsADirectory,
            ErrorKind::ArchiveUnavailable => io::ErrorKind::Other,
            ErrorKind::DecodeFailure => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
