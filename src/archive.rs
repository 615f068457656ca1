//! High-level [`Archive`] API — the primary embedding surface.
//!
//! ```no_run
//! use ggpk::{Archive, Record};
//!
//! let archive = Archive::open("content.ggpk")?;
//! for entry in archive.walk() {
//!     let entry = entry?;
//!     if let Record::File(file) = &entry.record {
//!         let data = archive.extract(file)?;
//!         println!("{} ({} bytes)", entry.path, data.len());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{FormatError, Result};
use crate::header::Header;
use crate::node::{Directory, FileNode, Walk};
use crate::record::{decode_record, Record};
use crate::source::{ReadSeek, SharedSource};
use crate::util::is_safe_name;

// ── ExtractStats ──────────────────────────────────────────────────────────────

/// What an extraction to disk wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub directories: u64,
    pub files:       u64,
    pub bytes:       u64,
}

// ── Archive ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Archive {
    path:   Option<PathBuf>,
    source: SharedSource,
    header: Header,
    root:   Directory,
}

impl Archive {
    // ── Constructors ─────────────────────────────────────────────────────────

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = Self::from_reader(BufReader::new(file))?;
        archive.path = Some(path.to_owned());
        Ok(archive)
    }

    /// Read an archive from any seekable source.
    ///
    /// The header is parsed and the root directory decoded eagerly; on
    /// failure `reader` is dropped before the error is returned.
    pub fn from_reader<R: ReadSeek + 'static>(reader: R) -> Result<Self> {
        let source = SharedSource::new(reader);
        let header = source.read_at(0, |r| Header::read(r))?;
        tracing::debug!(
            version = header.version,
            root_offset = header.root_offset,
            "parsed archive header"
        );

        let root = match decode_record(&source, header.root_offset)? {
            Record::Directory(dir) => dir,
            _ => return Err(FormatError::RootNotDirectory { offset: header.root_offset }.into()),
        };
        tracing::debug!(children = root.len(), "resolved root directory");

        Ok(Self { path: None, source, header, root })
    }

    // ── Tree ─────────────────────────────────────────────────────────────────

    /// The root directory, decoded once at open.
    pub fn root(&self) -> &Directory {
        &self.root
    }

    pub fn walk(&self) -> Walk {
        self.root.walk()
    }

    /// Resolve a `/`-separated path from the root. Empty components are
    /// ignored, so `""` and `"/"` both name the root.
    pub fn lookup(&self, path: &str) -> Result<Option<Record>> {
        let mut current = Record::Directory(self.root.clone());
        for component in path.split('/').filter(|c| !c.is_empty()) {
            let Record::Directory(dir) = &current else {
                return Ok(None);
            };
            match dir.find(component)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    // ── Read ─────────────────────────────────────────────────────────────────

    /// The raw bytes of `file`'s extent.
    pub fn extract(&self, file: &FileNode) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(file.length().min(16 * 1024 * 1024) as usize);
        self.extract_to(file, &mut out)?;
        Ok(out)
    }

    /// Stream `file`'s extent into `writer`, returning the bytes copied.
    ///
    /// Fails with `UnexpectedEof` if the archive ends inside the extent.
    pub fn extract_to<W: Write>(&self, file: &FileNode, mut writer: W) -> Result<u64> {
        self.source.read_at(file.offset(), |r| {
            let copied = io::copy(&mut r.take(file.length()), &mut writer)?;
            if copied < file.length() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "{}: extent {:#x}+{} truncated after {copied} bytes",
                        file.name(),
                        file.offset(),
                        file.length(),
                    ),
                )
                .into());
            }
            Ok(copied)
        })
    }

    /// Write the whole tree below the root into `dest`, creating it if
    /// necessary.
    pub fn extract_all<P: AsRef<Path>>(&self, dest: P) -> Result<ExtractStats> {
        let dest = dest.as_ref();
        fs::create_dir_all(dest)?;
        let mut stats = ExtractStats::default();
        self.extract_dir(&self.root, dest, &mut stats)?;
        Ok(stats)
    }

    /// Extract the file or directory at archive `path` into `dest`.
    ///
    /// The entry keeps its own name below `dest`; the root extracts like
    /// [`extract_all`](Self::extract_all).
    pub fn extract_path<P: AsRef<Path>>(&self, path: &str, dest: P) -> Result<ExtractStats> {
        let dest = dest.as_ref();
        let record = self.lookup(path)?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("not in archive: {path}"))
        })?;

        fs::create_dir_all(dest)?;
        let mut stats = ExtractStats::default();
        match &record {
            Record::Directory(dir) if dir.offset() == self.root.offset() => {
                self.extract_dir(dir, dest, &mut stats)?;
            }
            Record::Directory(dir) => {
                let target = dest.join(checked_name(dir.name())?);
                fs::create_dir_all(&target)?;
                stats.directories += 1;
                self.extract_dir(dir, &target, &mut stats)?;
            }
            Record::File(file) => {
                self.extract_file(file, &dest.join(checked_name(file.name())?), &mut stats)?;
            }
            Record::Tombstone => {}
        }
        Ok(stats)
    }

    fn extract_dir(&self, dir: &Directory, dest: &Path, stats: &mut ExtractStats) -> Result<()> {
        for entry in dir.walk() {
            let entry = entry?;
            let target = entry_target(dest, &entry.path, &entry.record)?;
            match &entry.record {
                Record::Directory(_) => {
                    fs::create_dir_all(&target)?;
                    stats.directories += 1;
                }
                Record::File(file) => self.extract_file(file, &target, stats)?,
                Record::Tombstone => {}
            }
        }
        Ok(())
    }

    fn extract_file(&self, file: &FileNode, target: &Path, stats: &mut ExtractStats) -> Result<()> {
        tracing::trace!(name = file.name(), length = file.length(), "extracting");
        let mut out = BufWriter::new(File::create(target)?);
        stats.bytes += self.extract_to(file, &mut out)?;
        out.flush()?;
        stats.files += 1;
        Ok(())
    }

    // ── Metadata ─────────────────────────────────────────────────────────────

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The path this archive was opened from, if it came from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn checked_name(name: &str) -> Result<&str> {
    if is_safe_name(name) {
        Ok(name)
    } else {
        Err(FormatError::UnsafeName { name: name.to_owned() }.into())
    }
}

/// Map a walk path onto `dest`. Parents were validated when the walk yielded
/// them, so only the entry's own name needs checking.
fn entry_target(dest: &Path, path: &str, record: &Record) -> Result<PathBuf> {
    checked_name(record.name().unwrap_or_default())?;
    Ok(path.split('/').fold(dest.to_path_buf(), |acc, c| acc.join(c)))
}
