//! Tree nodes and lazy child references.
//!
//! A [`Directory`] holds its children as [`ChildRef`]s: an offset plus a
//! handle on the shared source. Nothing below a directory is decoded until a
//! reference is resolved, and resolution is never cached, so iterating a
//! directory twice decodes its children twice.

use std::fmt;

use crate::error::{FormatError, Result};
use crate::record::{decode_record, Record};
use crate::source::SharedSource;
use crate::util::join_path;

// ── ChildRef ─────────────────────────────────────────────────────────────────

/// Deferred pointer to the record at an absolute offset.
#[derive(Clone)]
pub struct ChildRef {
    source: SharedSource,
    offset: u64,
}

impl ChildRef {
    pub fn new(source: SharedSource, offset: u64) -> Self {
        Self { source, offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Decode the referenced record. Re-reads the source on every call.
    pub fn resolve(&self) -> Result<Record> {
        decode_record(&self.source, self.offset)
    }
}

/// References compare by target offset only.
impl PartialEq for ChildRef {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl Eq for ChildRef {}

impl fmt::Debug for ChildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChildRef({:#x})", self.offset)
    }
}

// ── FileNode ─────────────────────────────────────────────────────────────────

/// A file's name and the extent its raw bytes occupy in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileNode {
    name:   String,
    offset: u64,
    length: u64,
}

impl FileNode {
    pub fn new(name: String, offset: u64, length: u64) -> Self {
        Self { name, offset, length }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute offset of the first data byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn length(&self) -> u64 {
        self.length
    }
}

// ── Directory ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    name:     String,
    offset:   u64,
    children: Vec<ChildRef>,
}

impl Directory {
    pub fn new(name: String, offset: u64, children: Vec<ChildRef>) -> Self {
        Self { name, offset, children }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute offset of this directory's own record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Unresolved references in on-disk order.
    pub fn child_refs(&self) -> &[ChildRef] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Resolve each child in order, tombstones included.
    pub fn children(&self) -> impl Iterator<Item = Result<Record>> + '_ {
        self.children.iter().map(ChildRef::resolve)
    }

    /// Like [`children`](Self::children) but without tombstones.
    pub fn entries(&self) -> impl Iterator<Item = Result<Record>> + '_ {
        self.children().filter(|r| !matches!(r, Ok(Record::Tombstone)))
    }

    /// First real child named `name`. Stops resolving once found.
    pub fn find(&self, name: &str) -> Result<Option<Record>> {
        for record in self.entries() {
            let record = record?;
            if record.name() == Some(name) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Depth-first, pre-order walk of everything below this directory.
    pub fn walk(&self) -> Walk {
        Walk::new(self)
    }
}

// ── Walk ─────────────────────────────────────────────────────────────────────

/// An entry yielded by [`Walk`], with its `/`-joined path relative to the
/// directory the walk started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path:   String,
    pub record: Record,
}

/// Depth-first walk over real entries. Tombstones are skipped.
///
/// A child that fails to decode is yielded as an error and the walk moves on
/// to its next sibling. A directory that contains one of its own ancestors
/// yields [`FormatError::DirectoryCycle`] instead of being descended into.
pub struct Walk {
    stack: Vec<Frame>,
}

struct Frame {
    path:     String,
    offset:   u64,
    children: std::vec::IntoIter<ChildRef>,
}

impl Walk {
    fn new(root: &Directory) -> Self {
        Self {
            stack: vec![Frame {
                path:     String::new(),
                offset:   root.offset,
                children: root.children.clone().into_iter(),
            }],
        }
    }

    fn on_stack(&self, offset: u64) -> bool {
        self.stack.iter().any(|f| f.offset == offset)
    }
}

impl Iterator for Walk {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(child) = frame.children.next() else {
                self.stack.pop();
                continue;
            };
            let record = match child.resolve() {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            let Some(name) = record.name() else { continue };
            let path = join_path(&frame.path, name);

            if let Record::Directory(dir) = &record {
                if self.on_stack(dir.offset) {
                    return Some(Err(FormatError::DirectoryCycle { offset: dir.offset }.into()));
                }
                self.stack.push(Frame {
                    path:     path.clone(),
                    offset:   dir.offset,
                    children: dir.children.clone().into_iter(),
                });
            }
            return Some(Ok(WalkEntry { path, record }));
        }
    }
}
