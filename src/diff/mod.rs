//! Directory comparison for two extracted trees.
//!
//! Works on plain filesystem paths only; nothing here knows about archives.
//! Each relative file path present in either tree is classified as
//!
//! | Change | Meaning |
//! |--------|---------|
//! | `Same` | present in both, identical bytes |
//! | `Modified` | present in both, size or bytes differ |
//! | `Added` | only in the new tree |
//! | `Removed` | only in the old tree |

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use walkdir::WalkDir;

/// Default comparison buffer: 16 KiB less one byte.
pub const DEFAULT_BUFFER_SIZE: usize = 0x3FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Same,
    Modified,
    Added,
    Removed,
}

impl Change {
    pub const ALL: [Change; 4] = [Change::Same, Change::Modified, Change::Added, Change::Removed];

    pub fn label(self, style: LabelStyle) -> &'static str {
        match (style, self) {
            (LabelStyle::Long, Change::Same)      => "SAME",
            (LabelStyle::Long, Change::Modified)  => "MODIFIED",
            (LabelStyle::Long, Change::Added)     => "ADDED",
            (LabelStyle::Long, Change::Removed)   => "DELETED",
            (LabelStyle::Short, Change::Same)     => "[=]",
            (LabelStyle::Short, Change::Modified) => "[*]",
            (LabelStyle::Short, Change::Added)    => "[+]",
            (LabelStyle::Short, Change::Removed)  => "[-]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStyle {
    #[default]
    Long,
    Short,
}

impl LabelStyle {
    /// Column width for labels: the widest label plus one space.
    pub fn width(self) -> usize {
        Change::ALL.iter().map(|c| c.label(self).len()).max().unwrap_or(0) + 1
    }
}

// ── Comparison ────────────────────────────────────────────────────────────────

/// Classify one pair of paths.
///
/// Fails with `NotFound` when neither exists.
pub fn compare(old: &Path, new: &Path, bufsize: usize) -> io::Result<Change> {
    let old_meta = metadata_if_exists(old)?;
    let new_meta = metadata_if_exists(new)?;
    let (old_meta, new_meta) = match (old_meta, new_meta) {
        (None, Some(_)) => return Ok(Change::Added),
        (Some(_), None) => return Ok(Change::Removed),
        (None, None) => {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("neither {} nor {} exists", old.display(), new.display()),
            ))
        }
        (Some(o), Some(n)) => (o, n),
    };
    if old_meta.len() != new_meta.len() {
        return Ok(Change::Modified);
    }

    let bufsize = bufsize.max(1);
    let mut a = BufReader::new(File::open(old)?);
    let mut b = BufReader::new(File::open(new)?);
    let mut buf_a = vec![0u8; bufsize];
    let mut buf_b = vec![0u8; bufsize];
    loop {
        let n_a = fill(&mut a, &mut buf_a)?;
        let n_b = fill(&mut b, &mut buf_b)?;
        if buf_a[..n_a] != buf_b[..n_b] {
            return Ok(Change::Modified);
        }
        if n_a == 0 {
            return Ok(Change::Same);
        }
    }
}

fn metadata_if_exists(path: &Path) -> io::Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(m) => Ok(Some(m)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ── Trees ─────────────────────────────────────────────────────────────────────

/// Every non-directory below `root`, as `/`-separated relative paths.
pub fn tree(root: &Path) -> io::Result<BTreeSet<String>> {
    let mut files = BTreeSet::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_dir() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).map_err(|e| {
            io::Error::new(io::ErrorKind::Other, format!("{}: {e}", entry.path().display()))
        })?;
        let rel: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        files.insert(rel.join("/"));
    }
    Ok(files)
}

/// Classify every file found in either tree, sorted by relative path.
pub fn diff_dirs(old: &Path, new: &Path, bufsize: usize) -> io::Result<Vec<(String, Change)>> {
    let old_files = tree(old)?;
    let new_files = tree(new)?;
    tracing::debug!(old = old_files.len(), new = new_files.len(), "comparing trees");

    old_files
        .union(&new_files)
        .map(|rel| {
            let change = compare(&old.join(rel), &new.join(rel), bufsize)?;
            Ok((rel.clone(), change))
        })
        .collect()
}

// ── Output ────────────────────────────────────────────────────────────────────

pub fn format_line(change: Change, path: &str, style: LabelStyle) -> String {
    format!("{:<width$}{path}", change.label(style), width = style.width())
}

/// Write one line per change to `out`, skipping unchanged files unless
/// `include_same` is set. Returns the number of lines written.
pub fn write_summary<W: Write>(
    mut out:      W,
    changes:      &[(String, Change)],
    style:        LabelStyle,
    include_same: bool,
) -> io::Result<usize> {
    let mut written = 0;
    for (path, change) in changes {
        if *change == Change::Same && !include_same {
            continue;
        }
        writeln!(out, "{}", format_line(*change, path, style))?;
        written += 1;
    }
    Ok(written)
}
