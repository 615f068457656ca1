//! Error taxonomy for the reader.
//!
//! Two kinds of failure exist and both are fatal to the operation that hit
//! them:
//!
//! - [`Error::Io`]: the byte source could not be opened, read or was shorter
//!   than a required read.
//! - [`Error::Format`]: the bytes were read but violate the archive layout.
//!
//! A `FREE` record is not an error; it decodes to [`crate::Record::Tombstone`].

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

impl Error {
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    /// The structural violation, if this is a format error.
    pub fn format(&self) -> Option<&FormatError> {
        match self {
            Error::Format(f) => Some(f),
            Error::Io(_)     => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Header truncated: source holds {len} bytes, header needs {}", crate::header::HEADER_SIZE)]
    TruncatedHeader { len: u64 },
    #[error("Invalid magic identifier: {}", hex::encode(.found))]
    InvalidMagic { found: [u8; 4] },
    #[error("Unknown record tag {} at offset {offset:#x}", hex::encode(.tag))]
    UnknownTag { offset: u64, tag: [u8; 4] },
    #[error("Negative name length {len} in record at offset {offset:#x}")]
    NegativeNameLength { offset: u64, len: i32 },
    #[error("Name of record at offset {offset:#x} is not valid UTF-16")]
    InvalidName { offset: u64 },
    #[error("File record at offset {offset:#x} ends at {end:#x}, before its data starts at {data_start:#x}")]
    NegativeFileLength { offset: u64, data_start: u64, end: u64 },
    #[error("Root record at offset {offset:#x} is not a directory")]
    RootNotDirectory { offset: u64 },
    #[error("Directory at offset {offset:#x} contains one of its own ancestors")]
    DirectoryCycle { offset: u64 },
    #[error("Refusing to extract entry with unsafe name {name:?}")]
    UnsafeName { name: String },
}
