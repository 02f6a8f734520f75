//! Record-boundary / duplicate-span resolution for text-deduplication
//! pipelines.
//!
//! An external suffix-array deduplication tool works on one concatenated
//! byte stream and reports duplicates as global byte ranges. This crate owns
//! both ends of that contract: it serializes records into the stream (with
//! per-record separators and an offset table) and inverts the tool's output
//! back into per-record spans and decoded duplicate text.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   stream + .size   ┌───────────────────┐
//! │  encode.rs  │───────────────────▶│ external dedup    │
//! │ (separator, │                    │ tool (suffix      │
//! │offset table)│                    │ array, unseen)    │
//! └─────────────┘                    └─────────┬─────────┘
//!        ▲                                     │ .byterange
//!        │                                     ▼
//! ┌─────────────┐     ┌─────────────┐   ┌─────────────┐
//! │ records.rs  │────▶│ resolve.rs  │◀──│  ranges.rs  │
//! │ (CSV/JSON   │     │ (global →   │   │ (range file │
//! │  rows)      │     │  local)     │   │  parser)    │
//! └──────┬──────┘     └──────┬──────┘   └─────────────┘
//!        │                   │ DupSpanMap
//!        ▼                   ▼
//!       ┌─────────────────────────┐
//!       │        decode.rs        │
//!       │ (bounded UTF-8 repair,  │
//!       │  parallel annotation)   │
//!       └─────────────────────────┘
//! ```
//!
//! The resolver is a strictly sequential merge over two sorted sequences;
//! annotation is embarrassingly parallel per record. Nothing in the pipeline
//! suspends on I/O mid-computation: all inputs are materialized up front.

// Module declarations
pub mod decode;
pub mod encode;
pub mod offsets;
pub mod ranges;
pub mod records;
pub mod resolve;
pub mod types;

// Re-exports for public API
pub use decode::{
    annotate_records, annotate_records_default, decode_adjusted, decode_span, AnnotateReport,
    DecodeError, DUPLICATED_STRINGS_COLUMN, IS_DUPLICATED_COLUMN,
};
pub use encode::{encode_records, EncodeError};
pub use offsets::OffsetTable;
pub use ranges::{load_ranges, parse_ranges, RangeFileError, RANGE_MARKER};
pub use records::{RecordSet, TableFormat};
pub use resolve::{
    resolve_spans, InvalidSpanEvent, OverflowEvent, Resolution, ResolveError, ResolveReport,
};
pub use types::{
    DupRange, DupSpanMap, LocalSpan, SeparatorConfig, SeparatorCounter, DEFAULT_MAX_TRIM,
    DEFAULT_PREFIX_TAG, UID_WIDTH,
};

#[cfg(test)]
mod tests {
    //! Cross-module property tests: the encoder's offset table and the
    //! resolver's span map must satisfy the pipeline invariants for any
    //! input corpus.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    fn record_set(texts: &[String]) -> RecordSet {
        RecordSet::new(
            vec!["input".to_string()],
            texts.iter().map(|t| vec![Value::from(t.as_str())]).collect(),
        )
    }

    fn encode_texts(texts: &[String], config: &SeparatorConfig) -> (Vec<u8>, OffsetTable) {
        let records = record_set(texts);
        let mut counter = SeparatorCounter::new();
        let mut stream = Vec::new();
        let table = encode_records(&records, "input", config, &mut counter, &mut stream)
            .expect("encode test corpus");
        (stream, table)
    }

    /// Random record texts, including multi-byte characters.
    fn text_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop::sample::select(vec![
                "a".to_string(),
                "word".to_string(),
                "é".to_string(),
                "日本".to_string(),
                "😀".to_string(),
                " ".to_string(),
            ]),
            0..8,
        )
        .prop_map(|parts| parts.concat())
    }

    fn corpus_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(text_strategy(), 1..12)
    }

    /// Random in-bounds ranges for a given table, sorted by start.
    fn ranges_for(table: &OffsetTable, seeds: &[(u64, u64)]) -> Vec<DupRange> {
        let total = table.total_bytes();
        if total < 2 {
            return Vec::new();
        }
        let mut ranges: Vec<DupRange> = seeds
            .iter()
            .map(|(a, b)| {
                let start = a % (total - 1);
                let end = start + 1 + (b % (total - start));
                DupRange::new(start, end.min(total + 4))
            })
            .collect();
        ranges.sort_by_key(|r| r.start);
        ranges
    }

    proptest! {
        #[test]
        fn offset_table_is_monotonic_with_n_plus_one_entries(texts in corpus_strategy()) {
            let (stream, table) = encode_texts(&texts, &SeparatorConfig::default());

            prop_assert_eq!(table.record_count(), texts.len());
            prop_assert_eq!(table.entries().len(), texts.len() + 1);
            prop_assert_eq!(table.entries()[0], 0);
            prop_assert_eq!(table.total_bytes(), stream.len() as u64);
            for window in table.entries().windows(2) {
                prop_assert!(window[0] <= window[1]);
            }
        }

        #[test]
        fn resolved_spans_are_contained_in_their_records(
            texts in corpus_strategy(),
            seeds in prop::collection::vec((0u64..10_000, 1u64..200), 0..16),
        ) {
            let config = SeparatorConfig::default();
            let (_, table) = encode_texts(&texts, &config);
            let ranges = ranges_for(&table, &seeds);

            let resolution = resolve_spans(&table, &ranges, &config)
                .expect("in-bounds ranges must all be consumed");

            for (record, spans) in &resolution.spans {
                let (byte_start, byte_end) = table.bounds(*record).unwrap();
                let record_len = (byte_end - byte_start) as usize;
                for span in spans {
                    prop_assert!(span.start <= span.end);
                    prop_assert!(span.end <= record_len);
                }
            }
        }

        #[test]
        fn every_in_bounds_range_is_accounted_for(
            texts in corpus_strategy(),
            seeds in prop::collection::vec((0u64..10_000, 1u64..200), 0..16),
        ) {
            let config = SeparatorConfig::default();
            let (_, table) = encode_texts(&texts, &config);
            let ranges = ranges_for(&table, &seeds);

            let resolution = resolve_spans(&table, &ranges, &config).unwrap();
            // Partition completeness: resolved + reported-invalid = input.
            prop_assert_eq!(
                resolution.report.resolved + resolution.report.invalid_count(),
                ranges.len()
            );
        }

        #[test]
        fn resolution_is_idempotent(
            texts in corpus_strategy(),
            seeds in prop::collection::vec((0u64..10_000, 1u64..200), 0..16),
        ) {
            let config = SeparatorConfig::default();
            let (_, table) = encode_texts(&texts, &config);
            let ranges = ranges_for(&table, &seeds);

            let first = resolve_spans(&table, &ranges, &config).unwrap();
            let second = resolve_spans(&table, &ranges, &config).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn resolved_spans_always_decode(
            texts in corpus_strategy(),
            seeds in prop::collection::vec((0u64..10_000, 1u64..200), 0..16),
        ) {
            let config = SeparatorConfig::default();
            let records = record_set(&texts);
            let (_, table) = encode_texts(&texts, &config);
            let ranges = ranges_for(&table, &seeds);

            let resolution = resolve_spans(&table, &ranges, &config).unwrap();
            // Spans sliced from real UTF-8 payloads always sit within 3 bytes
            // of a character boundary, so the bounded search must succeed.
            let annotated = annotate_records(&records, "input", &resolution.spans, 3);
            prop_assert!(annotated.is_ok(), "annotation failed: {:?}", annotated.err());
        }

        #[test]
        fn decoding_is_total_near_boundaries(text in text_strategy()) {
            let bytes = text.as_bytes();
            prop_assume!(bytes.len() >= 4);
            // Any slice of a valid UTF-8 string is within 3 bytes of a
            // boundary at each edge.
            for start in 0..bytes.len() {
                for end in (start + 1)..=bytes.len() {
                    prop_assert!(
                        decode_adjusted(&bytes[start..end], 3).is_some(),
                        "slice [{}, {}) of {:?} did not decode",
                        start,
                        end,
                        text
                    );
                }
            }
        }
    }
}
