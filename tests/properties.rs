mod common;

use common::*;
use ggpk::{decode_record, Archive, FormatError, Record, SharedSource};
use proptest::prelude::*;
use std::io::Cursor;

fn entry() -> impl Strategy<Value = (String, Vec<u8>, bool)> {
    ("[A-Za-z0-9_.]{1,16}", prop::collection::vec(any::<u8>(), 0..256), any::<bool>())
}

proptest! {
    #[test]
    fn directory_decoding_is_deterministic(entries in prop::collection::vec(entry(), 0..12)) {
        let children = entries
            .iter()
            .map(|(name, data, tomb)| if *tomb { free(data.len()) } else { file(name, data) })
            .collect();
        let source = SharedSource::new(Cursor::new(build(&dir("root", children))));

        let a = decode_record(&source, ROOT_OFFSET).unwrap();
        let b = decode_record(&source, ROOT_OFFSET).unwrap();
        prop_assert_eq!(&a, &b);

        let dir = a.as_directory().unwrap();
        prop_assert_eq!(dir.name(), "root");
        prop_assert_eq!(dir.len(), entries.len());
        for (child, (name, _, tomb)) in dir.children().zip(&entries) {
            let child = child.unwrap();
            prop_assert_eq!(child.is_tombstone(), *tomb);
            if !*tomb {
                prop_assert_eq!(child.name(), Some(name.as_str()));
            }
        }
    }

    #[test]
    fn extract_returns_stored_bytes(entries in prop::collection::vec(entry(), 1..8)) {
        let children = entries.iter().map(|(name, data, _)| file(name, data)).collect();
        let ar = Archive::from_reader(Cursor::new(build(&dir("", children)))).unwrap();

        for (child, (_, data, _)) in ar.root().children().zip(&entries) {
            let child = child.unwrap();
            let file = child.as_file().unwrap();
            prop_assert_eq!(file.length(), data.len() as u64);
            prop_assert_eq!(&ar.extract(file).unwrap(), data);
        }
    }

    #[test]
    fn file_length_is_gap_to_next_record(
        name in "[a-z]{0,12}",
        length in 0u32..200,
        offset in 0u64..64,
    ) {
        let mut bytes = vec![0u8; offset as usize];
        bytes.extend_from_slice(&file_record(&name, &[0u8; 64], Some(length)));
        let source = SharedSource::new(Cursor::new(bytes));

        // Encoded name carries a NUL terminator.
        let data_start = 8 + 4 + 32 + 2 * (name.encode_utf16().count() as u32 + 1);
        match decode_record(&source, offset) {
            Ok(Record::File(file)) => {
                prop_assert!(length >= data_start);
                prop_assert_eq!(file.offset(), offset + u64::from(data_start));
                prop_assert_eq!(file.length(), u64::from(length - data_start));
            }
            Ok(other) => prop_assert!(false, "unexpected record {:?}", other),
            Err(e) => {
                prop_assert!(length < data_start);
                let is_negative_length = matches!(e.format(), Some(FormatError::NegativeFileLength { .. }));
                prop_assert!(is_negative_length);
            }
        }
    }
}
