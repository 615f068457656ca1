//! Tagged record decoding.
//!
//! Every record starts with the same 8-byte header:
//!
//! ```text
//! length  u32      distance from this record's start to the next record
//! tag     [u8; 4]  "PDIR" | "FILE" | "FREE"
//! ```
//!
//! followed by a tag-specific body:
//!
//! ```text
//! PDIR  name_len i32 | child_count u32 | reserved [u8; 32] | name [u16; name_len]
//!       | child_count × { checksum u32 | offset u64 }
//! FILE  name_len i32 | reserved [u8; 32] | name [u16; name_len] | data ...
//! FREE  (opaque)
//! ```
//!
//! A FILE record does not store its data length. The data runs from the end
//! of the name up to `record_offset + length`, the start of the next record.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;

use crate::error::{FormatError, Result};
use crate::node::{ChildRef, Directory, FileNode};
use crate::source::{ReadSeek, SharedSource};
use crate::util::{name_byte_len, offset_add, read_name};

pub const RECORD_HEADER_SIZE: u64 = 8;
/// Opaque bytes between the fixed body fields and the name.
pub const RESERVED_SIZE: usize = 0x20;
/// One `{ checksum u32, offset u64 }` child slot in a PDIR body.
pub const CHILD_ENTRY_SIZE: u64 = 12;

const FILE_FIXED_SIZE: u64 = RECORD_HEADER_SIZE + 4 + RESERVED_SIZE as u64;
const MAX_PREALLOCATED_CHILDREN: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Directory,
    File,
    Free,
}

impl Tag {
    pub fn from_bytes(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"PDIR" => Some(Tag::Directory),
            b"FILE" => Some(Tag::File),
            b"FREE" => Some(Tag::Free),
            _ => None,
        }
    }

    pub fn as_bytes(self) -> &'static [u8; 4] {
        match self {
            Tag::Directory => b"PDIR",
            Tag::File      => b"FILE",
            Tag::Free      => b"FREE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub length: u32,
    pub tag:    [u8; 4],
}

impl RecordHeader {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<Self> {
        let length = reader.read_u32::<LittleEndian>()?;
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        Ok(Self { length, tag })
    }
}

/// One decoded unit of the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Directory(Directory),
    File(FileNode),
    /// A reclaimed slot. Not an error; listings skip it.
    Tombstone,
}

impl Record {
    /// `None` for tombstones.
    pub fn name(&self) -> Option<&str> {
        match self {
            Record::Directory(d) => Some(d.name()),
            Record::File(f)      => Some(f.name()),
            Record::Tombstone    => None,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Record::Tombstone)
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Record::Directory(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Record::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Record::Directory(_) => "dir",
            Record::File(_)      => "file",
            Record::Tombstone    => "free",
        }
    }
}

/// Decode the record starting at absolute `offset`.
///
/// Child references of a directory are bound to `source` but not resolved.
pub fn decode_record(source: &SharedSource, offset: u64) -> Result<Record> {
    source.read_at(offset, |reader| decode_at(reader, source, offset))
}

fn decode_at(reader: &mut dyn ReadSeek, source: &SharedSource, offset: u64) -> Result<Record> {
    let header = RecordHeader::read(reader)?;
    let tag = Tag::from_bytes(&header.tag)
        .ok_or(FormatError::UnknownTag { offset, tag: header.tag })?;
    tracing::trace!(offset, ?tag, length = header.length, "decoding record");

    match tag {
        Tag::Directory => decode_directory(reader, source, offset).map(Record::Directory),
        Tag::File      => decode_file(reader, offset, header.length).map(Record::File),
        Tag::Free      => Ok(Record::Tombstone),
    }
}

fn decode_directory(reader: &mut dyn ReadSeek, source: &SharedSource, offset: u64) -> Result<Directory> {
    let name_len = reader.read_i32::<LittleEndian>()?;
    let child_count = reader.read_u32::<LittleEndian>()?;
    skip_reserved(reader)?;
    let name = read_name(reader, offset, name_len)?;

    let mut children = Vec::with_capacity((child_count as usize).min(MAX_PREALLOCATED_CHILDREN));
    for _ in 0..child_count {
        let _checksum = reader.read_u32::<LittleEndian>()?;
        let child_offset = reader.read_u64::<LittleEndian>()?;
        children.push(ChildRef::new(source.clone(), child_offset));
    }
    Ok(Directory::new(name, offset, children))
}

fn decode_file(reader: &mut dyn ReadSeek, offset: u64, length: u32) -> Result<FileNode> {
    let name_len = reader.read_i32::<LittleEndian>()?;
    skip_reserved(reader)?;
    let name = read_name(reader, offset, name_len)?;

    let data_start = offset_add(offset, FILE_FIXED_SIZE + name_byte_len(offset, name_len)?)?;
    let end = offset_add(offset, u64::from(length))?;
    if end < data_start {
        return Err(FormatError::NegativeFileLength { offset, data_start, end }.into());
    }
    Ok(FileNode::new(name, data_start, end - data_start))
}

fn skip_reserved<R: Read + ?Sized>(reader: &mut R) -> std::io::Result<()> {
    let mut reserved = [0u8; RESERVED_SIZE];
    reader.read_exact(&mut reserved)
}
