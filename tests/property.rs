//! Property tests over the on-disk formats: the flat `.size` offset table
//! and the dedup tool's textual range file.

use std::io::Write;

use proptest::prelude::*;

use dupmark::{load_ranges, parse_ranges, DupRange, OffsetTable, RangeFileError};

proptest! {
    #[test]
    fn offset_table_disk_round_trip(lens in proptest::collection::vec(1u64..10_000, 0..64)) {
        let mut table = OffsetTable::new();
        for len in &lens {
            table.push_record(*len);
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.size");
        table.save(&path).unwrap();

        let reloaded = OffsetTable::load(&path).unwrap();
        prop_assert_eq!(reloaded.entries(), table.entries());
        prop_assert_eq!(reloaded.record_count(), lens.len());
    }

    #[test]
    fn range_file_round_trip(
        pairs in proptest::collection::vec((0u64..1_000_000, 1u64..10_000), 0..128),
    ) {
        // Sorted by start, each widened into a valid interval.
        let mut ranges: Vec<DupRange> = pairs
            .iter()
            .map(|(start, width)| DupRange::new(*start, start + width))
            .collect();
        ranges.sort_by_key(|r| r.start);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dups.byterange");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Writing out the duplicate ranges").unwrap();
        for range in &ranges {
            writeln!(file, "{} {}", range.start, range.end).unwrap();
        }
        drop(file);

        let parsed = load_ranges(&path).unwrap();
        prop_assert_eq!(parsed, ranges);
    }

    #[test]
    fn truncated_size_file_is_rejected(garbage in proptest::collection::vec(any::<u8>(), 1..64)) {
        // Any length that is not a multiple of 8 cannot be a u64 array.
        prop_assume!(garbage.len() % 8 != 0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.size");
        std::fs::write(&path, &garbage).unwrap();
        prop_assert!(OffsetTable::load(&path).is_err());
    }

    #[test]
    fn malformed_range_line_is_rejected(line in "[a-z]{1,8} [a-z]{1,8}") {
        let text = format!("out\n{}\n", line);
        let err = parse_ranges(text.as_bytes()).unwrap_err();
        let is_malformed = matches!(err, RangeFileError::Malformed { .. });
        prop_assert!(is_malformed);
    }
}
