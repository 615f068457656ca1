//! Fixed-layout archive header at offset 0.
//!
//! ```text
//! version     u32
//! identifier  [u8; 4]   "GGPK"
//! reserved    u32
//! root_offset u64       absolute offset of the root PDIR record
//! reserved    u64
//! ```
//!
//! All fields are little-endian.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

use crate::error::{FormatError, Result};

pub const MAGIC: &[u8; 4] = b"GGPK";
/// Size of the on-disk header in bytes.
pub const HEADER_SIZE: usize = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Format version. Carried through, never validated.
    pub version:     u32,
    pub identifier:  [u8; 4],
    pub root_offset: u64,
}

impl Header {
    /// Read the header from the start of `reader`.
    ///
    /// Fails with [`FormatError::TruncatedHeader`] when fewer than
    /// [`HEADER_SIZE`] bytes exist and [`FormatError::InvalidMagic`] when the
    /// identifier is not [`MAGIC`].
    pub fn read<R: Read + Seek>(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::with_capacity(HEADER_SIZE);
        (&mut reader).take(HEADER_SIZE as u64).read_to_end(&mut buf)?;
        if buf.len() < HEADER_SIZE {
            return Err(FormatError::TruncatedHeader { len: buf.len() as u64 }.into());
        }
        Self::parse(&buf)
    }

    fn parse(mut buf: &[u8]) -> Result<Self> {
        let version = buf.read_u32::<LittleEndian>()?;
        let mut identifier = [0u8; 4];
        buf.read_exact(&mut identifier)?;
        if &identifier != MAGIC {
            return Err(FormatError::InvalidMagic { found: identifier }.into());
        }
        let _reserved = buf.read_u32::<LittleEndian>()?;
        let root_offset = buf.read_u64::<LittleEndian>()?;
        let _reserved = buf.read_u64::<LittleEndian>()?;
        Ok(Self { version, identifier, root_offset })
    }
}
