//! The single byte source every reference and extraction reads through.
//!
//! One handle is shared by the archive and by every [`crate::ChildRef`] it
//! hands out. Each operation locks it, seeks to the absolute offset it was
//! given and performs all of its reads before releasing the lock, so no
//! operation ever depends on a read position left behind by another.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;

/// Anything the archive can be read from.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

#[derive(Clone)]
pub struct SharedSource {
    inner: Arc<Mutex<dyn ReadSeek>>,
}

impl SharedSource {
    pub fn new<R: ReadSeek + 'static>(reader: R) -> Self {
        Self { inner: Arc::new(Mutex::new(reader)) }
    }

    /// Seek to `offset` and run `f` with exclusive access to the source.
    pub fn read_at<T, F>(&self, offset: u64, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn ReadSeek) -> Result<T>,
    {
        // A panic in another reader leaves no partial state worth protecting:
        // every operation seeks before it reads.
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.seek(SeekFrom::Start(offset))?;
        f(&mut *guard)
    }

    /// Whether two handles share the same underlying source.
    pub fn same_source(&self, other: &SharedSource) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles, the archive's own included.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl fmt::Debug for SharedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSource")
            .field("handles", &self.handle_count())
            .finish()
    }
}
