//! Name and offset helpers shared by the record decoder and extraction.

use std::io::{self, Read};

use crate::error::{FormatError, Result};

/// Read exactly `len` bytes without trusting `len` for the allocation size.
pub(crate) fn read_vec<R: Read + ?Sized>(reader: &mut R, len: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(64 * 1024) as usize);
    reader.take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("wanted {len} bytes, source ended after {}", buf.len()),
        ));
    }
    Ok(buf)
}

/// Byte length of a name field holding `name_len` UTF-16 code units.
pub(crate) fn name_byte_len(offset: u64, name_len: i32) -> Result<u64> {
    if name_len < 0 {
        return Err(FormatError::NegativeNameLength { offset, len: name_len }.into());
    }
    Ok(name_len as u64 * 2)
}

/// Read a UTF-16LE name of `name_len` code units for the record at `offset`.
pub(crate) fn read_name<R: Read + ?Sized>(reader: &mut R, offset: u64, name_len: i32) -> Result<String> {
    let bytes = read_vec(reader, name_byte_len(offset, name_len)?)?;
    decode_name(&bytes).ok_or_else(|| FormatError::InvalidName { offset }.into())
}

/// Decode UTF-16LE bytes, dropping trailing NUL padding.
///
/// Returns `None` for unpaired surrogates or an odd byte count.
pub fn decode_name(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    while units.last() == Some(&0) {
        units.pop();
    }
    String::from_utf16(&units).ok()
}

/// Encode a name the way the archive stores it, NUL terminator included.
pub fn encode_name(name: &str) -> Vec<u8> {
    name.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

/// `offset + delta`, failing on overflow instead of wrapping.
pub(crate) fn offset_add(offset: u64, delta: u64) -> io::Result<u64> {
    offset.checked_add(delta).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, format!("offset {offset:#x} + {delta:#x} overflows"))
    })
}

pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Whether `name` can be used as a single path component on disk.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_trailing_nul_is_trimmed() {
        let bytes = encode_name("a.txt");
        assert_eq!(bytes.len(), 12);
        assert_eq!(decode_name(&bytes).as_deref(), Some("a.txt"));
    }

    #[test]
    fn name_with_extra_padding() {
        let mut bytes = encode_name("dir");
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(decode_name(&bytes).as_deref(), Some("dir"));
    }

    #[test]
    fn name_non_ascii() {
        let bytes = encode_name("données✓");
        assert_eq!(decode_name(&bytes).as_deref(), Some("données✓"));
    }

    #[test]
    fn name_rejects_lone_surrogate_and_odd_length() {
        assert_eq!(decode_name(&[0x00, 0xD8]), None);
        assert_eq!(decode_name(&[0x41, 0x00, 0x42]), None);
    }

    #[test]
    fn read_vec_reports_truncation() {
        let mut src: &[u8] = b"abc";
        let err = read_vec(&mut src, 5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn negative_name_length_is_format_error() {
        let err = name_byte_len(0x40, -1).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn safe_names() {
        assert!(is_safe_name("a.txt"));
        assert!(is_safe_name("..hidden"));
        for bad in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            assert!(!is_safe_name(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn join() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a/b", "c"), "a/b/c");
    }
}
